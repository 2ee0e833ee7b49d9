//! Shared test fixtures for integration tests.
//!
//! Every context owns a temp directory for input files and the JSON trace log,
//! and runs the `bzlink` binary with an environment isolated from the caller's settings.

use std::{
	io::Write,
	path::PathBuf,
	process::{Command, Output, Stdio},
};

use rstest::fixture;
use tempfile::TempDir;

/// Comments of a typical issue: the description, an old-style attachment announcement and a new-style one.
pub const COMMENTS_JSON: &str = r#"[
	{ "count": 0, "creator": "alice@example.org", "text": "Crash on startup." },
	{ "count": 1, "creator": "bob@example.org", "text": "Created an attachment (id=8812)\nScreenshot of crash\n\nSee the top left corner." },
	{ "count": 2, "creator": "alice@example.org", "text": "Created attachment 8813\nProposed fix" }
]"#;

pub const ATTACHMENTS_JSON: &str = r#"[
	{ "id": 8812, "file_name": "crash.png", "summary": "Screenshot of crash", "content_type": "image/png", "creator": "bob@example.org", "is_patch": 0, "is_obsolete": 0 },
	{ "id": 8813, "file_name": "fix.diff", "summary": "Proposed fix", "content_type": "text/plain", "creator": "alice@example.org", "size": 512, "is_patch": 1, "is_obsolete": 0 }
]"#;

/// Test context for running the binary against files in a temp directory.
pub struct BzlinkTestContext {
	dir: TempDir,
	/// JSON trace log written by the binary (`BZLINK_TRACE_FILE`)
	pub trace_file: PathBuf,
}

impl BzlinkTestContext {
	pub fn new() -> Self {
		let dir = tempfile::tempdir().unwrap();
		let trace_file = dir.path().join("trace.jsonl");
		Self { dir, trace_file }
	}

	/// Write a file relative to the temp directory and return its absolute path.
	pub fn write(&self, name: &str, content: &str) -> PathBuf {
		let path = self.dir.path().join(name);
		std::fs::write(&path, content).unwrap();
		path
	}

	/// Write the standard issue fixture; returns (comments, attachments) paths.
	pub fn write_issue(&self) -> (PathBuf, PathBuf) {
		(self.write("comments.json", COMMENTS_JSON), self.write("attachments.json", ATTACHMENTS_JSON))
	}

	pub fn command(&self, args: &[&str]) -> Command {
		let mut cmd = Command::new(env!("CARGO_BIN_EXE_bzlink"));
		cmd.args(args)
			.current_dir(self.dir.path())
			.env_remove("BZLINK_CONFIG")
			.env_remove("BZLINK_BASE_URL")
			.env_remove("BZLINK_DEFAULT_EXTENSION")
			.env("BZLINK_TRACE_FILE", &self.trace_file)
			.env("RUST_LOG", "bzlink=debug");
		cmd
	}

	pub fn run(&self, args: &[&str]) -> Output {
		self.command(args).stdin(Stdio::null()).output().unwrap()
	}

	pub fn run_with_stdin(&self, args: &[&str], stdin: &str) -> Output {
		let mut child = self.command(args).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped()).spawn().unwrap();
		child.stdin.take().unwrap().write_all(stdin.as_bytes()).unwrap();
		child.wait_with_output().unwrap()
	}
}

#[fixture]
pub fn ctx() -> BzlinkTestContext {
	BzlinkTestContext::new()
}

pub fn stdout(output: &Output) -> String {
	assert!(output.status.success(), "command failed:\n{}", String::from_utf8_lossy(&output.stderr));
	String::from_utf8(output.stdout.clone()).unwrap()
}

pub fn stderr(output: &Output) -> String {
	String::from_utf8_lossy(&output.stderr).into_owned()
}
