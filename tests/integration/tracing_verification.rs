//! Integration tests that verify behavior via tracing output.
//!
//! These tests spawn the binary with BZLINK_TRACE_FILE set, perform operations,
//! then check the trace log for the events the scanner and renderer emit.

use rstest::rstest;

use crate::{
	fixtures::{BzlinkTestContext, ctx, stdout},
	tracing_utils::TraceLog,
};

#[rstest]
fn test_scan_traces_bracketed_match(ctx: BzlinkTestContext) {
	stdout(&ctx.run_with_stdin(&["scan"], "Created an attachment (id=123)\nScreenshot of crash"));

	let trace = TraceLog::from_file(&ctx.trace_file);
	let event = trace.scan_match().unwrap_or_else(|| panic!("no scan match traced, messages: {:#?}", trace.messages()));
	assert_eq!(event.level, "DEBUG");
	assert_eq!(event.target, "bzlink::attachment::scanner");
	assert_eq!(event.fields.recognizer.as_deref(), Some("bracketed"));
	assert_eq!(event.fields.id.as_deref(), Some("123"));
	assert_eq!(event.fields.link_start, Some(31));
	assert_eq!(event.fields.link_end, Some(50));
}

#[rstest]
fn test_scan_traces_bare_match(ctx: BzlinkTestContext) {
	stdout(&ctx.run_with_stdin(&["scan", "--ids", "1,12"], "Created attachment 12\nfoo"));

	let trace = TraceLog::from_file(&ctx.trace_file);
	let event = trace.scan_match().unwrap_or_else(|| panic!("no scan match traced, messages: {:#?}", trace.messages()));
	assert_eq!(event.fields.recognizer.as_deref(), Some("bare"));
	// first listed id that prefixes the text wins
	assert_eq!(event.fields.id.as_deref(), Some("1"));
}

#[rstest]
fn test_scan_no_match_is_not_traced_at_debug(ctx: BzlinkTestContext) {
	stdout(&ctx.run_with_stdin(&["scan"], "Works for me."));

	let trace = TraceLog::from_file(&ctx.trace_file);
	assert!(trace.scan_match().is_none());
	assert!(trace.scoped("[scan]").is_empty(), "{:#?}", trace.messages());
}

#[rstest]
fn test_render_traces_summary(ctx: BzlinkTestContext) {
	let (comments, attachments) = ctx.write_issue();
	stdout(&ctx.run(&["render", "--comments", comments.to_str().unwrap(), "--attachments", attachments.to_str().unwrap()]));

	let trace = TraceLog::from_file(&ctx.trace_file);
	assert!(trace.has_message("[render] 3 comment(s), 2 attachment link(s)"), "{:#?}", trace.messages());
	assert_eq!(trace.scoped("[load] 2 attachment(s) from").len(), 1, "{:#?}", trace.messages());
}

#[rstest]
fn test_render_any_id_warns_about_missing_attachment(ctx: BzlinkTestContext) {
	let (_, attachments) = ctx.write_issue();
	let comments = ctx.write(
		"comments.json",
		r#"[
		{ "count": 1, "creator": "bob@example.org", "text": "Created an attachment (id=8812)\nScreenshot of crash" },
		{ "count": 2, "creator": "carol@example.org", "text": "Created an attachment (id=9999)\nDeleted upload" }
	]"#,
	);
	let rendered = stdout(&ctx.run(&["render", "--any-id", "--comments", comments.to_str().unwrap(), "--attachments", attachments.to_str().unwrap()]));
	assert!(rendered.contains("[Screenshot of crash](https://bugzilla.mozilla.org/attachment.cgi?id=8812)"), "{rendered}");
	assert!(rendered.contains("Created an attachment (id=9999)\nDeleted upload"), "{rendered}");

	let trace = TraceLog::from_file(&ctx.trace_file);
	let missing = trace.scoped("[link] comment references an attachment missing from the index");
	assert_eq!(missing.len(), 1, "{:#?}", trace.messages());
	assert_eq!(missing[0].level, "WARN");
	assert_eq!(missing[0].fields.id.as_deref(), Some("9999"));
	assert!(trace.has_message("[render] 2 comment(s), 1 attachment link(s)"), "{:#?}", trace.messages());
}

#[rstest]
fn test_render_known_ids_does_not_warn(ctx: BzlinkTestContext) {
	let (comments, attachments) = ctx.write_issue();
	stdout(&ctx.run(&["render", "--comments", comments.to_str().unwrap(), "--attachments", attachments.to_str().unwrap()]));

	let trace = TraceLog::from_file(&ctx.trace_file);
	assert!(trace.scoped("[link]").is_empty(), "{:#?}", trace.messages());
}
