//! Locating attachment references inside Bugzilla comment text.
//!
//! Bugzilla announces every new attachment with a generated comment. Older installations write
//! `Created an attachment (id=123)`, newer ones `Created attachment 123`. The attachment's
//! description conventionally sits on the following line, and that line is what gets hyperlinked.

use std::ops::Range;

use derive_more::derive::Display;
use serde::Serialize;

const BRACKETED_PREFIX: &str = "Created an attachment (id=";
/// The word `attachment` inside [`BRACKETED_PREFIX`].
const BRACKETED_WORD: Range<usize> = 11..21;

const BARE_PREFIX: &str = "Created attachment ";
/// The word `attachment` inside [`BARE_PREFIX`].
const BARE_WORD: Range<usize> = 8..18;

/// An attachment reference found in a comment.
///
/// Offsets are byte offsets into the scanned text. Every delimiter the scanner looks at is ASCII,
/// so both ends always fall on char boundaries.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, derive_new::new)]
pub struct AttachmentReference {
	pub id: String,
	pub link_start: usize,
	pub link_end: usize,
}

impl AttachmentReference {
	pub fn span(&self) -> Range<usize> {
		self.link_start..self.link_end
	}

	/// The part of `text` that should become the hyperlink.
	///
	/// `text` must be the string this reference was found in.
	pub fn link_text<'a>(&self, text: &'a str) -> &'a str {
		&text[self.span()]
	}

	/// Same span, counted in chars instead of bytes.
	pub fn char_span(&self, text: &str) -> Range<usize> {
		let start = text[..self.link_start].chars().count();
		let len = self.link_text(text).chars().count();
		start..start + len
	}
}

#[derive(Clone, Copy, Debug, Display)]
enum Recognizer {
	#[display("bracketed")]
	Bracketed,
	#[display("bare")]
	Bare,
}

/// Find the attachment a comment announces, and the span to hyperlink.
///
/// `known_ids` restricts which ids are accepted:
/// - `None`: any numeric id in the `Created an attachment (id=N)` form. The bare
///   `Created attachment N` form carries no delimiter after the id, so it is never matched without a list.
/// - `Some(&[])`: nothing matches.
/// - `Some(ids)`: exact string match against `ids`. For the bare form, `ids` is tried in order and the first
///   one the text starts with wins.
///
/// The span covers the first line after the marker when that line has non-blank content; otherwise it falls
/// back to the word `attachment` inside the marker.
pub fn find_attachment<S: AsRef<str>>(text: &str, known_ids: Option<&[S]>) -> Option<AttachmentReference> {
	let found = match find_bracketed(text, known_ids) {
		Some(reference) => Some((Recognizer::Bracketed, reference)),
		None => known_ids.and_then(|ids| find_bare(text, ids)).map(|reference| (Recognizer::Bare, reference)),
	};

	match found {
		Some((recognizer, reference)) => {
			tracing::debug!(%recognizer, id = %reference.id, link_start = reference.link_start, link_end = reference.link_end, "[scan] attachment reference found");
			Some(reference)
		}
		None => {
			tracing::trace!("[scan] no attachment reference");
			None
		}
	}
}

/// `Created an attachment (id=123)`
fn find_bracketed<S: AsRef<str>>(text: &str, known_ids: Option<&[S]>) -> Option<AttachmentReference> {
	let bytes = text.as_bytes();
	let digits_start = BRACKETED_PREFIX.len();
	// prefix + at least one digit + `)`
	if bytes.len() < digits_start + 2 || !text.starts_with(BRACKETED_PREFIX) {
		return None;
	}

	let digits_len = bytes[digits_start..].iter().take_while(|b| b.is_ascii_digit()).count();
	if digits_len == 0 {
		return None;
	}
	let close = digits_start + digits_len;
	if bytes.get(close) != Some(&b')') {
		return None;
	}

	let id = &text[digits_start..close];
	if !is_known_id(id, known_ids) {
		return None;
	}

	let span = link_span(bytes, close + 1, BRACKETED_WORD);
	Some(AttachmentReference::new(id.to_string(), span.start, span.end))
}

/// `Created attachment 123`
fn find_bare<S: AsRef<str>>(text: &str, known_ids: &[S]) -> Option<AttachmentReference> {
	let rest = text.strip_prefix(BARE_PREFIX)?;
	let id = known_ids.iter().find_map(|candidate| {
		let candidate: &str = candidate.as_ref();
		(is_digit_id(candidate) && rest.starts_with(candidate)).then_some(candidate)
	})?;

	let span = link_span(text.as_bytes(), BARE_PREFIX.len() + id.len(), BARE_WORD);
	Some(AttachmentReference::new(id.to_string(), span.start, span.end))
}

fn is_known_id<S: AsRef<str>>(id: &str, known_ids: Option<&[S]>) -> bool {
	known_ids.is_none_or(|ids| ids.iter().any(|known| known.as_ref() == id))
}

fn is_digit_id(id: &str) -> bool {
	!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

fn is_line_break(b: u8) -> bool {
	b == b'\r' || b == b'\n'
}

/// Span of the description line following the marker, scanning from `id_end` (one past the last marker byte).
///
/// Exactly one line break is consumed (`\r\n`, `\r` or `\n`), then leading spaces and tabs. If what remains of
/// that line is empty, or the marker line is the last one, `fallback` is returned.
fn link_span(bytes: &[u8], id_end: usize, fallback: Range<usize>) -> Range<usize> {
	let len = bytes.len();
	let mut i = id_end;

	while i < len && !is_line_break(bytes[i]) {
		i += 1;
	}
	if i >= len {
		return fallback;
	}

	if bytes[i] == b'\r' {
		i += 1;
	}
	if i < len && bytes[i] == b'\n' {
		i += 1;
	}

	while i < len && matches!(bytes[i], b' ' | b'\t') {
		i += 1;
	}
	if i >= len || is_line_break(bytes[i]) {
		return fallback;
	}

	let description_start = i;
	while i < len && !is_line_break(bytes[i]) {
		i += 1;
	}
	description_start..i
}
