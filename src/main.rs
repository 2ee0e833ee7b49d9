use std::{
	fmt::Write as _,
	io::Read,
	path::{Path, PathBuf},
};

use bzlink::{Attachment, AttachmentIndex, Comment, Extension, LinkAction, Linker, LoadError, find_attachment, render_comments};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use serde::Serialize;
use url::Url;

mod config;
mod logging;

use crate::config::Settings;

#[derive(Parser)]
#[command(author, version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"), about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
	/// Settings file (TOML). Defaults to $BZLINK_CONFIG when set.
	#[arg(long, global = true)]
	config: Option<PathBuf>,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Find the attachment a comment announces and print the link span as JSON (`null` if there is none)
	Scan(ScanArgs),
	/// Render issue comments with attachment announcements hyperlinked
	Render(RenderArgs),
	/// Print metadata and available actions of a single attachment
	Show(ShowArgs),
}

#[derive(Args)]
struct ScanArgs {
	/// File with the comment text; stdin if omitted or `-`
	file: Option<PathBuf>,
	/// Comma-separated known attachment ids, tried in the given order.
	/// Without it any numeric id is accepted; an empty string accepts none.
	#[arg(long)]
	ids: Option<String>,
}

#[derive(Args)]
struct RenderArgs {
	/// JSON array of comments
	#[arg(long)]
	comments: PathBuf,
	/// JSON array of the issue's attachments
	#[arg(long)]
	attachments: PathBuf,
	/// Output format (overrides config default_extension)
	#[arg(short = 'e', long)]
	extension: Option<Extension>,
	/// Bugzilla base URL (overrides config base_url)
	#[arg(long)]
	base_url: Option<Url>,
	/// Link any numeric id in `Created an attachment (id=N)` announcements, warning about ids missing from the attachment list
	#[arg(long)]
	any_id: bool,
}

#[derive(Args)]
struct ShowArgs {
	/// JSON array of the issue's attachments
	#[arg(long)]
	attachments: PathBuf,
	/// Bugzilla base URL (overrides config base_url)
	#[arg(long)]
	base_url: Option<Url>,
	id: String,
}

#[derive(Serialize)]
struct ScanOutput<'a> {
	id: &'a str,
	link_start: usize,
	link_end: usize,
	link_text: &'a str,
}

fn main() -> Result<()> {
	color_eyre::install()?;
	logging::init()?;

	let cli = Cli::parse();
	let settings = Settings::load(cli.config.as_deref())?;

	match cli.command {
		Commands::Scan(args) => scan(args),
		Commands::Render(args) => render(args, &settings),
		Commands::Show(args) => show(args, &settings),
	}
}

fn scan(args: ScanArgs) -> Result<()> {
	let text = read_input(args.file.as_deref())?;
	let ids = args.ids.as_deref().map(parse_ids);

	let found = find_attachment(&text, ids.as_deref());
	let output = found.as_ref().map(|r| ScanOutput {
		id: &r.id,
		link_start: r.link_start,
		link_end: r.link_end,
		link_text: r.link_text(&text),
	});
	println!("{}", serde_json::to_string(&output)?);
	Ok(())
}

fn render(args: RenderArgs, settings: &Settings) -> Result<()> {
	let comments = Comment::load_all(&args.comments).map_err(diagnostic)?;
	let index = AttachmentIndex::load(&args.attachments).map_err(diagnostic)?;
	let base_url = args.base_url.unwrap_or_else(|| settings.base_url.clone());
	let extension = args.extension.unwrap_or(settings.default_extension);
	let linker = if args.any_id { Linker::AnyId } else { Linker::KnownIds };

	println!("{}", render_comments(&comments, &index, &base_url, extension, linker));
	Ok(())
}

fn show(args: ShowArgs, settings: &Settings) -> Result<()> {
	let index = AttachmentIndex::load(&args.attachments).map_err(diagnostic)?;
	let attachment = index.require(&args.id).map_err(diagnostic)?;
	let base_url = args.base_url.unwrap_or_else(|| settings.base_url.clone());

	print!("{}", describe(attachment, &base_url)?);
	Ok(())
}

fn describe(attachment: &Attachment, base_url: &Url) -> Result<String> {
	let yes_no = |b: bool| if b { "yes" } else { "no" };
	let actions = LinkAction::available_for(attachment).iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");

	let mut out = String::new();
	writeln!(out, "id:           {}", attachment.id)?;
	writeln!(out, "filename:     {}", attachment.filename)?;
	writeln!(out, "description:  {}", attachment.display_description())?;
	if let Some(content_type) = &attachment.content_type {
		writeln!(out, "content type: {content_type}")?;
	}
	writeln!(out, "author:       {}", attachment.author_display())?;
	if let Some(created) = attachment.created {
		writeln!(out, "created:      {created}")?;
	}
	if let Some(size) = attachment.size {
		writeln!(out, "size:         {size} bytes")?;
	}
	writeln!(out, "patch:        {}", yes_no(attachment.is_patch))?;
	writeln!(out, "obsolete:     {}", yes_no(attachment.is_obsolete))?;
	writeln!(out, "url:          {}", attachment.resolve_url(base_url))?;
	writeln!(out, "actions:      {actions}")?;
	Ok(out)
}

/// `1, 2,3` -> `["1", "2", "3"]`; an empty string is an empty list.
fn parse_ids(ids: &str) -> Vec<String> {
	ids.split(',').map(str::trim).filter(|id| !id.is_empty()).map(String::from).collect()
}

fn read_input(file: Option<&Path>) -> Result<String> {
	match file {
		Some(path) if path != Path::new("-") => std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display())),
		_ => {
			let mut text = String::new();
			std::io::stdin().read_to_string(&mut text).wrap_err("failed to read stdin")?;
			Ok(text)
		}
	}
}

/// Keep miette's source-annotated rendering when handing the error to color-eyre.
fn diagnostic(e: LoadError) -> color_eyre::Report {
	eyre!("{:?}", miette::Report::new(e))
}
