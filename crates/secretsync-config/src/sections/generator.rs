// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Generator configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfigLayer {
	pub timeout_secs: Option<u64>,
	pub http_timeout_secs: Option<u64>,
	pub github_api_url: Option<String>,
}

impl GeneratorConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.http_timeout_secs.is_some() {
			self.http_timeout_secs = other.http_timeout_secs;
		}
		if other.github_api_url.is_some() {
			self.github_api_url = other.github_api_url;
		}
	}

	pub fn finalize(self) -> GeneratorConfig {
		GeneratorConfig {
			timeout_secs: self.timeout_secs.unwrap_or(30),
			http_timeout_secs: self.http_timeout_secs.unwrap_or(5),
			github_api_url: self
				.github_api_url
				.unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratorConfig {
	/// Upper bound on one generator call.
	pub timeout_secs: u64,
	/// Per-request HTTP timeout.
	pub http_timeout_secs: u64,
	pub github_api_url: String,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		GeneratorConfigLayer::default().finalize()
	}
}

impl GeneratorConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}

	pub fn http_timeout(&self) -> Duration {
		Duration::from_secs(self.http_timeout_secs)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.timeout_secs == 0 || self.http_timeout_secs == 0 {
			return Err(ConfigError::Validation(
				"generator timeouts must be greater than zero".to_string(),
			));
		}
		let url = &self.github_api_url;
		if !(url.starts_with("https://") || url.starts_with("http://")) {
			return Err(ConfigError::Validation(format!(
				"github_api_url must be an http(s) URL, got '{}'",
				self.github_api_url
			)));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = GeneratorConfig::default();
		assert_eq!(config.timeout(), Duration::from_secs(30));
		assert_eq!(config.http_timeout(), Duration::from_secs(5));
		assert_eq!(config.github_api_url, "https://api.github.com");
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_layer_finalize_with_values() {
		let config = GeneratorConfigLayer {
			timeout_secs: Some(10),
			github_api_url: Some("https://ghe.example.com/api/v3".to_string()),
			..Default::default()
		}
		.finalize();
		assert_eq!(config.timeout_secs, 10);
		assert_eq!(config.http_timeout_secs, 5);
		assert_eq!(config.github_api_url, "https://ghe.example.com/api/v3");
	}

	#[test]
	fn test_zero_timeout_is_invalid() {
		let config = GeneratorConfig {
			timeout_secs: 0,
			..Default::default()
		};
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_non_http_url_is_invalid() {
		let config = GeneratorConfig {
			github_api_url: "ftp://example.com".to_string(),
			..Default::default()
		};
		assert!(config.validate().is_err());
	}
}
