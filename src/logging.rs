//! Tracing subscriber setup for the binary.
//!
//! Directives come from `RUST_LOG`, falling back to the ones embedded at build time from
//! `.cargo/log_directives`, then to `info`. With `BZLINK_TRACE_FILE` set, events are written there
//! as JSON lines instead of to stderr.

use std::{fs::File, sync::Arc};

use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const TRACE_FILE_ENV: &str = "BZLINK_TRACE_FILE";

pub fn init() -> Result<()> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(option_env!("LOG_DIRECTIVES").unwrap_or("info")));

	match std::env::var_os(TRACE_FILE_ENV) {
		Some(path) => {
			let file = File::create(&path).wrap_err_with(|| format!("failed to create trace file {}", path.to_string_lossy()))?;
			tracing_subscriber::registry().with(filter).with(fmt::layer().json().with_ansi(false).with_writer(Arc::new(file))).init();
		}
		None => tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(std::io::stderr)).init(),
	}
	Ok(())
}
