// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files, environment and CLI flags.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::SecretsyncConfigLayer;
use crate::sections::{GeneratorConfigLayer, LogFormat, LoggingConfigLayer, TemplateConfigLayer};

/// Where a layer came from. Later variants win when layers are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	CommandLine = 60,
}

/// Something that can produce a partial configuration layer.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<SecretsyncConfigLayer, ConfigError>;
}

/// Contributes nothing; `finalize` fills in the built-in values.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<SecretsyncConfigLayer, ConfigError> {
		Ok(SecretsyncConfigLayer::default())
	}
}

/// A TOML file on disk.
///
/// A missing file is not an error; an unreadable or malformed one is.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/secretsync/config.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<SecretsyncConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(SecretsyncConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: SecretsyncConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// `SECRETSYNC_*` variables. Empty values count as unset.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<SecretsyncConfigLayer, ConfigError> {
		debug!("loading environment variables");
		layer_from_env(|name| std::env::var(name).ok())
	}
}

/// Flags given on the command line, already shaped as a layer.
pub struct OverrideSource(pub SecretsyncConfigLayer);

impl ConfigSource for OverrideSource {
	fn name(&self) -> &'static str {
		"command-line"
	}

	fn precedence(&self) -> Precedence {
		Precedence::CommandLine
	}

	fn load(&self) -> Result<SecretsyncConfigLayer, ConfigError> {
		Ok(self.0.clone())
	}
}

pub(crate) fn layer_from_env(
	lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretsyncConfigLayer, ConfigError> {
	let env_var = |name: &str| lookup(name).filter(|s| !s.is_empty());
	let env_u64 = |name: &str| -> Result<Option<u64>, ConfigError> {
		match env_var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid u64 value '{v}'"),
			}),
			None => Ok(None),
		}
	};

	let format = match env_var("SECRETSYNC_LOG_FORMAT") {
		Some(v) => Some(v.parse::<LogFormat>().map_err(|message| ConfigError::InvalidValue {
			key: "SECRETSYNC_LOG_FORMAT".to_string(),
			message,
		})?),
		None => None,
	};

	Ok(SecretsyncConfigLayer {
		template: Some(TemplateConfigLayer {
			left_delimiter: env_var("SECRETSYNC_TEMPLATE_LEFT_DELIMITER"),
			right_delimiter: env_var("SECRETSYNC_TEMPLATE_RIGHT_DELIMITER"),
		}),
		generator: Some(GeneratorConfigLayer {
			timeout_secs: env_u64("SECRETSYNC_GENERATOR_TIMEOUT_SECS")?,
			http_timeout_secs: env_u64("SECRETSYNC_GENERATOR_HTTP_TIMEOUT_SECS")?,
			github_api_url: env_var("SECRETSYNC_GITHUB_API_URL"),
		}),
		logging: Some(LoggingConfigLayer {
			level: env_var("SECRETSYNC_LOG_LEVEL"),
			format,
		}),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |name| vars.get(name).cloned()
	}

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::CommandLine > Precedence::Environment);
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.template.is_none());
		assert!(layer.generator.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let layer = TomlSource::new("/nonexistent/config.toml").load().unwrap();
		assert_eq!(layer, SecretsyncConfigLayer::default());
	}

	#[test]
	fn test_env_layer_reads_known_variables() {
		let layer = layer_from_env(lookup(&[
			("SECRETSYNC_TEMPLATE_LEFT_DELIMITER", "[["),
			("SECRETSYNC_GENERATOR_TIMEOUT_SECS", "12"),
			("SECRETSYNC_LOG_FORMAT", "json"),
			("SECRETSYNC_LOG_LEVEL", ""),
		]))
		.unwrap();

		let template = layer.template.unwrap();
		assert_eq!(template.left_delimiter.as_deref(), Some("[["));
		assert!(template.right_delimiter.is_none());
		assert_eq!(layer.generator.unwrap().timeout_secs, Some(12));
		let logging = layer.logging.unwrap();
		assert_eq!(logging.format, Some(LogFormat::Json));
		assert!(logging.level.is_none());
	}

	#[test]
	fn test_env_layer_rejects_bad_numbers() {
		let err = layer_from_env(lookup(&[("SECRETSYNC_GENERATOR_HTTP_TIMEOUT_SECS", "soon")]))
			.unwrap_err();
		let ConfigError::InvalidValue { key, .. } = &err else {
			panic!("expected InvalidValue, got {err:?}");
		};
		assert_eq!(key, "SECRETSYNC_GENERATOR_HTTP_TIMEOUT_SECS");
	}

	#[test]
	fn test_env_layer_rejects_unknown_format() {
		assert!(layer_from_env(lookup(&[("SECRETSYNC_LOG_FORMAT", "xml")])).is_err());
	}
}
