// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for secretsync.
//!
//! This crate provides:
//! - Layered configuration from defaults, a TOML file, environment and CLI flags
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`SECRETSYNC_*`)
//!
//! # Usage
//!
//! ```no_run
//! use secretsync_config::load_config;
//!
//! let config = load_config()?;
//! println!("delimiters: {} {}", config.template.left_delimiter, config.template.right_delimiter);
//! # Ok::<(), secretsync_config::ConfigError>(())
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

use std::path::PathBuf;

pub use error::ConfigError;
pub use layer::SecretsyncConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, OverrideSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecretsyncConfig {
	pub template: TemplateConfig,
	pub generator: GeneratorConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`SECRETSYNC_*`)
/// 2. Config file (`/etc/secretsync/config.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<SecretsyncConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with an optional config file path and command-line
/// overrides on top of everything else.
pub fn load_config_with(
	config_path: Option<PathBuf>,
	overrides: SecretsyncConfigLayer,
) -> Result<SecretsyncConfig, ConfigError> {
	let file = match config_path {
		Some(path) => TomlSource::new(path),
		None => TomlSource::system(),
	};
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(file),
		Box::new(EnvSource),
		Box::new(OverrideSource(overrides)),
	])
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<SecretsyncConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = SecretsyncConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: SecretsyncConfigLayer) -> Result<SecretsyncConfig, ConfigError> {
	let template = layer.template.unwrap_or_default().finalize();
	let generator = layer.generator.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	template.validate()?;
	generator.validate()?;

	info!(
		left_delimiter = %template.left_delimiter,
		right_delimiter = %template.right_delimiter,
		generator_timeout_secs = generator.timeout_secs,
		github_api_url = %generator.github_api_url,
		log_format = %logging.format,
		"configuration loaded"
	);

	Ok(SecretsyncConfig {
		template,
		generator,
		logging,
	})
}
