// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;

/// Per-request timeout applied when the caller does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// `secretsync/{version}`, sent on every outbound request.
pub fn user_agent() -> String {
	format!("secretsync/{}", env!("CARGO_PKG_VERSION"))
}

/// A client builder preloaded with the secretsync User-Agent.
///
/// ```ignore
/// let client = secretsync_common_http::builder()
///     .connect_timeout(Duration::from_secs(2))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

pub fn new_client() -> reqwest::Result<Client> {
	new_client_with_timeout(DEFAULT_TIMEOUT)
}

/// Build a client whose requests give up after `timeout`.
pub fn new_client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	debug!(timeout_ms = timeout.as_millis() as u64, "building HTTP client");
	builder().timeout(timeout).build()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_names_crate_version() {
		let ua = user_agent();
		let (product, version) = ua.split_once('/').unwrap();
		assert_eq!(product, "secretsync");
		assert_eq!(version, env!("CARGO_PKG_VERSION"));
	}

	#[test]
	fn clients_build_with_default_and_custom_timeouts() {
		assert!(new_client().is_ok());
		assert!(new_client_with_timeout(Duration::from_millis(250)).is_ok());
		assert!(builder().build().is_ok());
	}
}
