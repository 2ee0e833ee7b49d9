use std::borrow::Cow;

use clap::ValueEnum;
use derive_more::derive::Display;
use serde::Deserialize;

pub mod attachment;
pub mod comment;
pub mod error;

// Re-export the common types at crate root for convenience
pub use attachment::{Attachment, AttachmentIndex, AttachmentReference, attachment_url, find_attachment};
pub use comment::{AttachmentHyperlink, Comment, LinkAction, Linker, link_comment, link_comment_any, render_comment, render_comments};
pub use error::LoadError;

/// Output format for rendered comments.
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
	#[default]
	#[display("md")]
	Md,
	#[display("typ")]
	Typ,
}

impl Extension {
	pub fn as_str(&self) -> &'static str {
		match self {
			Extension::Md => "md",
			Extension::Typ => "typ",
		}
	}

	/// Escape plain text so it renders literally.
	/// Markdown is passed through: comment text is already close enough to it.
	pub fn escape<'a>(&self, text: &'a str) -> Cow<'a, str> {
		match self {
			Extension::Md => Cow::Borrowed(text),
			Extension::Typ => escape_where(text, |ch, line_start| TYP_SPECIAL.contains(&ch) || (line_start && TYP_LINE_START.contains(&ch))),
		}
	}

	/// A hyperlink with `text` as its label.
	pub fn link(&self, text: &str, url: &str) -> String {
		match self {
			Extension::Md => format!("[{}]({url})", escape_where(text, |ch, _| matches!(ch, '\\' | '[' | ']'))),
			Extension::Typ => format!("#link(\"{}\")[{}]", url.replace('\\', "\\\\").replace('"', "\\\""), self.escape(text)),
		}
	}
}

/// `/` covers both comment forms, `//` and `/*`.
const TYP_SPECIAL: &[char] = &['\\', '#', '*', '_', '`', '$', '<', '>', '@', '[', ']', '~', '/'];
/// Heading and list markers, only special as the first non-blank char of a line.
const TYP_LINE_START: &[char] = &['=', '-', '+'];

/// Backslash-escape every char `special(ch, line_start)` selects. `line_start` holds until the first non-blank char
/// of each line; the start of `text` counts as a line start.
fn escape_where(text: &str, special: impl Fn(char, bool) -> bool) -> Cow<'_, str> {
	let mut out: Option<String> = None;
	let mut line_start = true;
	for (i, ch) in text.char_indices() {
		if special(ch, line_start) {
			out.get_or_insert_with(|| {
				let mut owned = String::with_capacity(text.len() + 8);
				owned.push_str(&text[..i]);
				owned
			})
			.push('\\');
		}
		if let Some(out) = &mut out {
			out.push(ch);
		}
		line_start = match ch {
			'\n' | '\r' => true,
			' ' | '\t' => line_start,
			_ => false,
		};
	}
	out.map_or(Cow::Borrowed(text), Cow::Owned)
}

/// A header with a level and content, format-aware for serialization.
///
/// Markdown format: `# Content`, `## Content`, etc.
/// Typst format: `= Content`, `== Content`, etc.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
	pub level: usize,
	pub content: String,
}

impl Header {
	/// Create a new header with the given level and content.
	/// Level must be >= 1.
	pub fn new(level: usize, content: impl Into<String>) -> Self {
		debug_assert!(level >= 1, "Header level must be >= 1");
		Self {
			level: level.max(1),
			content: content.into(),
		}
	}

	/// Encode the header to a string based on the file extension.
	pub fn encode(&self, ext: Extension) -> String {
		match ext {
			Extension::Md => format!("{} {}", "#".repeat(self.level), self.content),
			Extension::Typ => format!("{} {}", "=".repeat(self.level), ext.escape(&self.content)),
		}
	}
}
