//! Issue comments and the attachment hyperlinks inside them.
//!
//! Bugzilla generates a comment for every uploaded attachment. The description line of such a comment is turned
//! into a link to the attachment, the same way the issue view does it.

use std::{ops::Range, path::Path};

use derive_more::derive::Display;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
	Extension, Header,
	attachment::{Attachment, AttachmentIndex, find_attachment},
	error::{LoadError, SourceContext, read_source},
};

/// A single comment of an issue. Comment `0` is the issue description.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Comment {
	#[serde(default, alias = "count")]
	pub number: u32,
	#[serde(default, alias = "creator")]
	pub author: String,
	#[serde(default, alias = "creation_time", skip_serializing_if = "Option::is_none")]
	pub created: Option<Timestamp>,
	pub text: String,
}

impl Comment {
	pub fn new(number: u32, author: impl Into<String>, text: impl Into<String>) -> Self {
		Self {
			number,
			author: author.into(),
			created: None,
			text: text.into(),
		}
	}

	/// Parse a JSON array of comments. `name` is only used for diagnostics.
	pub fn from_json(src: &str, name: &str) -> Result<Vec<Self>, LoadError> {
		let comments: Vec<Self> = SourceContext::new(src, name).parse_json("comment")?;
		tracing::debug!("[load] {} comment(s) from {name}", comments.len());
		Ok(comments)
	}

	pub fn load_all(path: &Path) -> Result<Vec<Self>, LoadError> {
		let src = read_source(path)?;
		Self::from_json(&src, &path.display().to_string())
	}

	pub fn hyperlink<'a>(&self, index: &'a AttachmentIndex) -> Option<AttachmentHyperlink<'a>> {
		link_comment(&self.text, index)
	}

	fn author_display(&self) -> &str {
		if self.author.is_empty() { "unknown" } else { &self.author }
	}
}

/// A resolved hyperlink: which part of the comment text links to which attachment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttachmentHyperlink<'a> {
	pub attachment: &'a Attachment,
	/// Byte range into the comment text.
	pub span: Range<usize>,
}

/// What clicking an attachment hyperlink can do.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum LinkAction {
	#[display("open")]
	Open,
	#[display("save")]
	Save,
	/// Show the diff. Only offered for patches.
	#[display("show")]
	Show,
}

impl LinkAction {
	pub fn available_for(attachment: &Attachment) -> Vec<Self> {
		if attachment.is_patch {
			vec![Self::Open, Self::Save, Self::Show]
		} else {
			vec![Self::Open, Self::Save]
		}
	}
}

/// How comment text is matched against the attachment index.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Linker {
	/// [`link_comment`]: only ids the index knows, both marker forms.
	#[default]
	KnownIds,
	/// [`link_comment_any`]: any numeric id in the bracketed form, resolved afterwards.
	AnyId,
}

impl Linker {
	pub fn link<'a>(self, text: &str, index: &'a AttachmentIndex) -> Option<AttachmentHyperlink<'a>> {
		match self {
			Self::KnownIds => link_comment(text, index),
			Self::AnyId => link_comment_any(text, index),
		}
	}
}

/// Hyperlink `text` against the attachments of its issue. Only ids present in `index` are matched.
pub fn link_comment<'a>(text: &str, index: &'a AttachmentIndex) -> Option<AttachmentHyperlink<'a>> {
	let known_ids = index.known_ids();
	let reference = find_attachment(text, Some(&known_ids[..]))?;
	let attachment = index.get(&reference.id)?;
	Some(AttachmentHyperlink {
		attachment,
		span: reference.span(),
	})
}

/// Like [`link_comment`], but accepts any numeric id in the bracketed form and only then resolves it.
/// Ids the index doesn't know are logged and left unlinked.
pub fn link_comment_any<'a>(text: &str, index: &'a AttachmentIndex) -> Option<AttachmentHyperlink<'a>> {
	let reference = find_attachment::<&str>(text, None)?;
	match index.get(&reference.id) {
		Some(attachment) => Some(AttachmentHyperlink {
			attachment,
			span: reference.span(),
		}),
		None => {
			tracing::warn!(id = %reference.id, "[link] comment references an attachment missing from the index");
			None
		}
	}
}

/// Render comment text, turning the hyperlinked span (if any) into a link.
pub fn render_comment(text: &str, link: Option<&AttachmentHyperlink<'_>>, base: &Url, ext: Extension) -> String {
	let Some(link) = link else {
		return ext.escape(text).into_owned();
	};
	let url = link.attachment.resolve_url(base);
	format!(
		"{}{}{}",
		ext.escape(&text[..link.span.start]),
		ext.link(&text[link.span.clone()], url.as_str()),
		ext.escape(&text[link.span.end..])
	)
}

/// Render all comments of an issue, each under its own `Comment #N by author` header.
/// Trailing whitespace of each body is dropped so comments stay separated by exactly one blank line.
pub fn render_comments(comments: &[Comment], index: &AttachmentIndex, base: &Url, ext: Extension, linker: Linker) -> String {
	let mut linked = 0;
	let rendered = comments
		.iter()
		.map(|comment| {
			let link = linker.link(&comment.text, index);
			linked += usize::from(link.is_some());
			let header = Header::new(2, format!("Comment #{} by {}", comment.number, comment.author_display()));
			let body = render_comment(&comment.text, link.as_ref(), base, ext);
			format!("{}\n\n{}", header.encode(ext), body.trim_end())
		})
		.collect::<Vec<_>>()
		.join("\n\n");
	tracing::info!("[render] {} comment(s), {linked} attachment link(s)", comments.len());
	rendered
}
