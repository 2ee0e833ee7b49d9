//! Attachments of a Bugzilla issue.
//!
//! [`AttachmentIndex`] is the per-issue attachment list: it supplies the ids the scanner is allowed to
//! match and resolves a matched id back to its metadata.

mod scanner;
use std::path::Path;

pub use scanner::{AttachmentReference, find_attachment};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::error::{LoadError, SourceContext, read_source};

const NO_DESCRIPTION: &str = "<no description>";

/// Metadata of a single attachment.
///
/// Accepts both our own field names and the ones Bugzilla's REST API uses (`file_name`, `summary`, `creator`,
/// `creation_time`), with ids and flags given either as strings/bools or as numbers.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Attachment {
	#[serde(deserialize_with = "string_or_number")]
	pub id: String,
	#[serde(alias = "file_name")]
	pub filename: String,
	#[serde(default, alias = "summary", skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content_type: Option<String>,
	/// Login (usually an email)
	#[serde(default, alias = "creator", skip_serializing_if = "Option::is_none")]
	pub author: Option<String>,
	/// Real name
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub author_name: Option<String>,
	#[serde(default, alias = "creation_time", skip_serializing_if = "Option::is_none")]
	pub created: Option<jiff::Timestamp>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub size: Option<u64>,
	#[serde(default, deserialize_with = "flag")]
	pub is_patch: bool,
	#[serde(default, deserialize_with = "flag")]
	pub is_obsolete: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<Url>,
}

impl Attachment {
	pub fn new(id: impl Into<String>, filename: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			filename: filename.into(),
			description: None,
			content_type: None,
			author: None,
			author_name: None,
			created: None,
			size: None,
			is_patch: false,
			is_obsolete: false,
			url: None,
		}
	}

	/// Description, or `<no description>` when missing or blank.
	pub fn display_description(&self) -> &str {
		match self.description.as_deref().map(str::trim) {
			Some(desc) if !desc.is_empty() => desc,
			_ => NO_DESCRIPTION,
		}
	}

	pub fn author_display(&self) -> &str {
		self.author_name.as_deref().filter(|s| !s.is_empty()).or(self.author.as_deref()).unwrap_or("unknown")
	}

	/// Where the attachment can be downloaded. An explicit `url` wins over the one derived from `base`.
	pub fn resolve_url(&self, base: &Url) -> Url {
		self.url.clone().unwrap_or_else(|| attachment_url(base, &self.id))
	}
}

/// `<base>/attachment.cgi?id=<id>`
pub fn attachment_url(base: &Url, id: &str) -> Url {
	let mut url = base.clone();
	if let Ok(mut segments) = url.path_segments_mut() {
		segments.pop_if_empty().push("attachment.cgi");
	}
	url.set_fragment(None);
	url.query_pairs_mut().clear().append_pair("id", id);
	url
}

/// Insertion-ordered attachment list of one issue.
#[derive(Clone, Debug, Default)]
pub struct AttachmentIndex {
	attachments: Vec<Attachment>,
}

impl AttachmentIndex {
	pub fn new(attachments: Vec<Attachment>) -> Self {
		Self { attachments }
	}

	pub fn push(&mut self, attachment: Attachment) {
		self.attachments.push(attachment);
	}

	pub fn len(&self) -> usize {
		self.attachments.len()
	}

	pub fn is_empty(&self) -> bool {
		self.attachments.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
		self.attachments.iter()
	}

	/// Ids in insertion order, which is also the order the scanner tries them in.
	pub fn known_ids(&self) -> Vec<&str> {
		self.attachments.iter().map(|a| a.id.as_str()).collect()
	}

	/// Exact-string lookup; on duplicate ids the first one wins.
	pub fn get(&self, id: &str) -> Option<&Attachment> {
		self.attachments.iter().find(|a| a.id == id)
	}

	pub fn require(&self, id: &str) -> Result<&Attachment, LoadError> {
		self.get(id).ok_or_else(|| LoadError::UnknownAttachment {
			id: id.to_string(),
			known: if self.is_empty() { "none".to_string() } else { self.known_ids().join(", ") },
		})
	}

	/// Parse a JSON array of attachments. `name` is only used for diagnostics.
	pub fn from_json(src: &str, name: &str) -> Result<Self, LoadError> {
		let attachments: Vec<Attachment> = SourceContext::new(src, name).parse_json("attachment")?;
		tracing::debug!("[load] {} attachment(s) from {name}", attachments.len());
		Ok(Self::new(attachments))
	}

	pub fn load(path: &Path) -> Result<Self, LoadError> {
		let src = read_source(path)?;
		Self::from_json(&src, &path.display().to_string())
	}
}

impl FromIterator<Attachment> for AttachmentIndex {
	fn from_iter<T: IntoIterator<Item = Attachment>>(iter: T) -> Self {
		Self::new(iter.into_iter().collect())
	}
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Id {
		Text(String),
		Number(u64),
	}

	Ok(match Id::deserialize(deserializer)? {
		Id::Text(s) => s,
		Id::Number(n) => n.to_string(),
	})
}

/// Bugzilla encodes flags as `0`/`1`.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Flag {
		Bool(bool),
		Number(u8),
		Text(String),
	}

	Ok(match Flag::deserialize(deserializer)? {
		Flag::Bool(b) => b,
		Flag::Number(n) => n != 0,
		Flag::Text(s) => s == "1" || s.eq_ignore_ascii_case("true"),
	})
}
