// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub App installation access tokens.
//!
//! The generator signs a short-lived app assertion with the app's RSA key,
//! exchanges it at `/app/installations/{id}/access_tokens` and returns the
//! installation token under the `token` field. Tokens expire on their own,
//! so there is nothing to clean up.

mod config;
mod jwt;
mod spec;

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Url;
use secretsync_common_config::{SecretBytes, SecretString};
use secretsync_kube::ObjectClient;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::context::Context;
use crate::error::{GeneratorError, GeneratorResult};
use crate::generator::{require_spec, Generated, Generator, ProviderState};

pub use config::{GithubGeneratorConfig, DEFAULT_BASE_URL};
pub use jwt::{
	parse_private_key, sign_app_assertion, AssertionClaims, ASSERTION_LIFETIME_SECS,
	CLOCK_SKEW_SECS,
};
pub use spec::{GithubAccessTokenSpec, GithubAuth, PrivateKeySource, SecretKeySelector};

/// Output field holding the installation token.
pub const TOKEN_FIELD: &str = "token";

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Debug, Deserialize)]
struct ErrorBody {
	message: Option<serde_json::Value>,
}

/// Mints GitHub App installation tokens.
#[derive(Debug, Clone)]
pub struct GithubAccessTokenGenerator {
	http: reqwest::Client,
	config: GithubGeneratorConfig,
}

impl GithubAccessTokenGenerator {
	pub fn new(config: GithubGeneratorConfig) -> reqwest::Result<Self> {
		let http = secretsync_common_http::new_client_with_timeout(config.http_timeout())?;
		Ok(Self { http, config })
	}

	/// Use a caller-supplied HTTP client.
	pub fn with_client(config: GithubGeneratorConfig, http: reqwest::Client) -> Self {
		Self { http, config }
	}

	pub fn config(&self) -> &GithubGeneratorConfig {
		&self.config
	}

	fn endpoint(&self, spec: &GithubAccessTokenSpec) -> GeneratorResult<Url> {
		if !spec::is_installation_id(&spec.install_id) {
			return Err(GeneratorError::RequestBuild(format!(
				"installId '{}' is not a numeric installation ID",
				spec.install_id
			)));
		}
		let base = spec
			.url
			.as_deref()
			.filter(|u| !u.trim().is_empty())
			.unwrap_or(self.config.base_url());
		let raw = format!(
			"{}/app/installations/{}/access_tokens",
			base.trim_end_matches('/'),
			spec.install_id
		);
		let url = Url::parse(&raw)
			.map_err(|e| GeneratorError::RequestBuild(format!("invalid URL '{raw}': {e}")))?;
		if !matches!(url.scheme(), "http" | "https") {
			return Err(GeneratorError::RequestBuild(format!(
				"unsupported URL scheme '{}'",
				url.scheme()
			)));
		}
		Ok(url)
	}

	async fn fetch_private_key(
		&self,
		ctx: &Context,
		spec: &GithubAccessTokenSpec,
		client: &dyn ObjectClient,
		namespace: &str,
	) -> GeneratorResult<SecretBytes> {
		let selector = &spec.auth.private_key.secret_ref;
		let unavailable = |reason: String, source| GeneratorError::KeyMaterialUnavailable {
			namespace: namespace.to_string(),
			name: selector.name.clone(),
			reason,
			source,
		};

		let secret = ctx
			.run(async {
				client
					.get_secret(namespace, &selector.name)
					.await
					.map_err(|e| unavailable(e.to_string(), Some(e)))
			})
			.await?;

		match secret.get(&selector.key) {
			Some(value) if !value.is_empty() => Ok(SecretBytes::new(value.to_vec())),
			Some(_) => Err(unavailable(format!("key {} is empty", selector.key), None)),
			None => Err(unavailable(format!("key {} not found", selector.key), None)),
		}
	}

	#[instrument(skip(self, url, assertion, body), fields(url = %url))]
	async fn exchange(
		&self,
		url: Url,
		assertion: &str,
		body: Option<serde_json::Value>,
	) -> GeneratorResult<SecretString> {
		let mut request = self
			.http
			.post(url)
			.header("Accept", GITHUB_ACCEPT)
			.header("Authorization", format!("Bearer {assertion}"));
		if let Some(body) = &body {
			request = request.json(body);
		}

		let response = request.send().await.map_err(GeneratorError::Transport)?;
		let status = response.status();
		let payload = response.bytes().await.map_err(GeneratorError::Transport)?;

		if !status.is_success() {
			let message = serde_json::from_slice::<ErrorBody>(&payload)
				.ok()
				.and_then(|b| b.message)
				.map(|m| match m {
					serde_json::Value::String(s) => s,
					other => other.to_string(),
				});
			warn!(status = status.as_u16(), "GitHub rejected installation token request");
			return Err(GeneratorError::backend_rejected(status.as_u16(), message));
		}

		let decoded: serde_json::Value = serde_json::from_slice(&payload).map_err(|e| {
			GeneratorError::MalformedBackendResponse(format!("error decoding response: {e}"))
		})?;
		match decoded.get(TOKEN_FIELD) {
			Some(serde_json::Value::String(token)) => Ok(SecretString::new(token.clone())),
			_ => Err(GeneratorError::MalformedBackendResponse(
				"token isn't a string or token key doesn't exist".to_string(),
			)),
		}
	}
}

#[async_trait]
impl Generator for GithubAccessTokenGenerator {
	#[instrument(skip(self, ctx, spec, client))]
	async fn generate(
		&self,
		ctx: &Context,
		spec: Option<&[u8]>,
		client: &dyn ObjectClient,
		namespace: &str,
	) -> GeneratorResult<Generated> {
		let raw = require_spec(spec)?;
		let ctx = ctx.bounded(self.config.timeout());
		let spec = GithubAccessTokenSpec::parse(raw)?;

		let pem = self.fetch_private_key(&ctx, &spec, client, namespace).await?;
		let key = parse_private_key(pem.expose())?;
		let assertion = sign_app_assertion(&spec.app_id, &key)?;
		let url = self.endpoint(&spec)?;

		let token = ctx
			.run(self.exchange(url, &assertion, spec.request_body()))
			.await?;
		debug!(app_id = %spec.app_id, install_id = %spec.install_id, "minted installation token");

		Ok(Generated::new(BTreeMap::from([(
			TOKEN_FIELD.to_string(),
			token.expose().as_bytes().to_vec(),
		)])))
	}

	async fn cleanup(
		&self,
		_ctx: &Context,
		_spec: Option<&[u8]>,
		_state: Option<&ProviderState>,
		_client: &dyn ObjectClient,
		_namespace: &str,
	) -> GeneratorResult<()> {
		debug!("installation tokens expire on their own; nothing to clean up");
		Ok(())
	}
}
