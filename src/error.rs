//! Error types for loading attachment and comment data.
//!
//! Uses miette for rich diagnostics with source code spans.

#![allow(unused_assignments)] // Fields are read by miette's derive macro via attributes

use std::path::{Path, PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::de::DeserializeOwned;

/// Error type for reading attachment indexes and comment files.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum LoadError {
	#[error("failed to read {}", .path.display())]
	#[diagnostic(code(bzlink::load::io))]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("malformed {what} file")]
	#[diagnostic(code(bzlink::load::json), help("expected a JSON array of {what} objects"))]
	Json {
		#[source_code]
		src: NamedSource<String>,
		#[label("{message}")]
		span: SourceSpan,
		what: &'static str,
		message: String,
	},

	#[error("no attachment with id {id}")]
	#[diagnostic(code(bzlink::attachment::unknown), help("known attachment ids: {known}"))]
	UnknownAttachment { id: String, known: String },
}

/// Holds source content and filename for error reporting.
#[derive(Clone, Debug)]
pub(crate) struct SourceContext<'a> {
	pub content: &'a str,
	pub filename: &'a str,
}

impl<'a> SourceContext<'a> {
	pub fn new(content: &'a str, filename: &'a str) -> Self {
		Self { content, filename }
	}

	/// Create a NamedSource for miette diagnostics.
	pub fn named_source(&self) -> NamedSource<String> {
		NamedSource::new(self.filename, self.content.to_string())
	}

	/// Get byte offset for a given line number (1-indexed).
	pub fn line_offset(&self, line_num: usize) -> usize {
		self.content.split_inclusive('\n').take(line_num.saturating_sub(1)).map(str::len).sum()
	}

	/// Deserialize the whole source as JSON, pointing at the failure position on error.
	pub fn parse_json<T: DeserializeOwned>(&self, what: &'static str) -> Result<T, LoadError> {
		serde_json::from_str(self.content).map_err(|e| {
			// serde_json counts columns in bytes, which can land inside a multibyte char
			let mut offset = (self.line_offset(e.line()) + e.column().saturating_sub(1)).min(self.content.len());
			while !self.content.is_char_boundary(offset) {
				offset -= 1;
			}
			let len = self.content[offset..].chars().next().map_or(0, char::len_utf8);
			tracing::debug!("[load] {what} json error at {offset}: {e}");
			LoadError::Json {
				src: self.named_source(),
				span: (offset, len).into(),
				what,
				message: strip_position(&e.to_string()),
			}
		})
	}
}

/// serde_json appends ` at line X column Y`, which the label already shows.
fn strip_position(message: &str) -> String {
	match message.rfind(" at line ") {
		Some(idx) => message[..idx].to_string(),
		None => message.to_string(),
	}
}

pub(crate) fn read_source(path: &Path) -> Result<String, LoadError> {
	std::fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })
}
