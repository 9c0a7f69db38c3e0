// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration for the GitHub access-token generator.

use std::time::Duration;

use reqwest::Url;

use crate::context::DEFAULT_GENERATOR_TIMEOUT;
use crate::error::GeneratorError;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Operator-level settings shared by every GitHub generator invocation.
///
/// A spec may still override the base URL per request.
#[derive(Debug, Clone)]
pub struct GithubGeneratorConfig {
	/// Base URL for the GitHub API, without a trailing slash.
	base_url: String,

	/// Per-request HTTP timeout.
	http_timeout: Duration,

	/// Upper bound on a whole `generate` call.
	timeout: Duration,
}

impl Default for GithubGeneratorConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			http_timeout: secretsync_common_http::DEFAULT_TIMEOUT,
			timeout: DEFAULT_GENERATOR_TIMEOUT,
		}
	}
}

impl GithubGeneratorConfig {
	/// Validate and normalize a base URL.
	///
	/// Requirements:
	/// - Must be a valid URL
	/// - Must use the http or https scheme
	/// - Must have a host
	/// - Trailing slashes are trimmed
	pub(crate) fn validate_base_url(raw: &str) -> Result<String, GeneratorError> {
		let url = Url::parse(raw)
			.map_err(|e| GeneratorError::Config(format!("invalid GitHub base URL '{raw}': {e}")))?;

		if !matches!(url.scheme(), "http" | "https") {
			return Err(GeneratorError::Config(format!(
				"GitHub base URL must use http or https, got '{}'",
				url.scheme()
			)));
		}

		if url.host_str().is_none() {
			return Err(GeneratorError::Config(
				"GitHub base URL must include a host".to_string(),
			));
		}

		Ok(raw.trim_end_matches('/').to_string())
	}

	/// Set a custom base URL (for GitHub Enterprise or testing).
	pub fn with_base_url(mut self, url: impl AsRef<str>) -> Result<Self, GeneratorError> {
		self.base_url = Self::validate_base_url(url.as_ref())?;
		Ok(self)
	}

	pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
		self.http_timeout = timeout;
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn http_timeout(&self) -> Duration {
		self.http_timeout
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = GithubGeneratorConfig::default();
		assert_eq!(config.base_url(), "https://api.github.com");
		assert_eq!(config.http_timeout(), Duration::from_secs(5));
		assert_eq!(config.timeout(), Duration::from_secs(30));
	}

	#[test]
	fn trailing_slash_is_trimmed() {
		let config = GithubGeneratorConfig::default()
			.with_base_url("https://github.example.com/api/v3/")
			.unwrap();
		assert_eq!(config.base_url(), "https://github.example.com/api/v3");
	}

	#[test]
	fn rejects_non_http_schemes() {
		let err = GithubGeneratorConfig::default()
			.with_base_url("ftp://github.example.com")
			.unwrap_err();
		assert!(matches!(err, GeneratorError::Config(_)));
	}

	#[test]
	fn rejects_garbage() {
		assert!(GithubGeneratorConfig::default()
			.with_base_url("not a url")
			.is_err());
	}
}
