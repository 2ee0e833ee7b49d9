use std::path::{Path, PathBuf};

use bzlink::Extension;
use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use smart_default::SmartDefault;
use url::Url;

pub const CONFIG_ENV: &str = "BZLINK_CONFIG";
const ENV_PREFIX: &str = "BZLINK";
const DEFAULT_BASE_URL: &str = "https://bugzilla.mozilla.org/";

/// Layered settings: optional TOML file, then `BZLINK_*` environment variables.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Settings {
	/// Bugzilla installation attachments are downloaded from
	#[default(default_base_url())]
	pub base_url: Url,
	pub default_extension: Extension,
}

impl Settings {
	/// `path` takes precedence over `$BZLINK_CONFIG`. A file given either way must exist.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let path = path.map(Path::to_path_buf).or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

		let mut builder = config::Config::builder();
		if let Some(path) = &path {
			tracing::debug!("[config] reading {}", path.display());
			builder = builder.add_source(config::File::from(path.as_path()).required(true));
		}
		let settings: Settings = builder
			.add_source(config::Environment::with_prefix(ENV_PREFIX))
			.build()
			.wrap_err("failed to load settings")?
			.try_deserialize()
			.wrap_err("settings are malformed")?;

		tracing::debug!("[config] {settings:?}");
		Ok(settings)
	}
}

fn default_base_url() -> Url {
	Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid url")
}
