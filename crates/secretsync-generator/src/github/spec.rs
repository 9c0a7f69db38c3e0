// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The `GithubAccessToken` generator spec.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{GeneratorError, GeneratorResult};

const KIND: &str = "GithubAccessToken";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GithubAccessTokenSpec {
	/// GitHub App ID, sent as the `iss` claim.
	pub app_id: String,

	/// Installation to mint a token for.
	pub install_id: String,

	/// Overrides the configured API base URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,

	pub auth: GithubAuth,

	/// Restrict the token to these repositories.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub repositories: Option<Vec<String>>,

	/// Restrict the token to these permissions, e.g. `contents: read`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub permissions: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GithubAuth {
	pub private_key: PrivateKeySource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PrivateKeySource {
	pub secret_ref: SecretKeySelector,
}

/// Points at one key of a secret in the generator's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretKeySelector {
	pub name: String,
	pub key: String,
}

impl GithubAccessTokenSpec {
	/// Parse a spec from YAML or JSON.
	///
	/// Accepts either the bare spec or a full `GithubAccessToken` resource,
	/// in which case the `spec` field is used.
	pub fn parse(raw: &[u8]) -> GeneratorResult<Self> {
		let document: serde_yaml::Value =
			serde_yaml::from_slice(raw).map_err(GeneratorError::SpecParse)?;

		let body = match document {
			serde_yaml::Value::Mapping(mut resource) if resource.contains_key("spec") => {
				if let Some(kind) = resource.get("kind").and_then(serde_yaml::Value::as_str) {
					if kind != KIND {
						return Err(GeneratorError::SpecParse(serde::de::Error::custom(format!(
							"expected kind {KIND}, got {kind}"
						))));
					}
				}
				resource
					.remove("spec")
					.unwrap_or(serde_yaml::Value::Null)
			}
			other => other,
		};

		let spec: Self = serde_yaml::from_value(body).map_err(GeneratorError::SpecParse)?;
		spec.validate()?;
		Ok(spec)
	}

	fn validate(&self) -> GeneratorResult<()> {
		let invalid = |msg: String| GeneratorError::SpecParse(serde::de::Error::custom(msg));

		if self.app_id.trim().is_empty() {
			return Err(invalid("appId must not be empty".to_string()));
		}
		if self.install_id.trim().is_empty() {
			return Err(invalid("installId must not be empty".to_string()));
		}
		if !is_installation_id(&self.install_id) {
			return Err(invalid(format!(
				"installId '{}' must be a numeric installation ID",
				self.install_id
			)));
		}
		let selector = &self.auth.private_key.secret_ref;
		if selector.name.is_empty() || selector.key.is_empty() {
			return Err(invalid(
				"auth.privateKey.secretRef needs both name and key".to_string(),
			));
		}
		Ok(())
	}

	/// JSON body for the token request; `None` when no scoping was asked for.
	pub fn request_body(&self) -> Option<serde_json::Value> {
		let repositories = self.repositories.as_ref().filter(|r| !r.is_empty());
		if repositories.is_none() && self.permissions.is_none() {
			return None;
		}

		let mut body = serde_json::Map::new();
		if let Some(repositories) = repositories {
			body.insert("repositories".to_string(), json!(repositories));
		}
		if let Some(permissions) = &self.permissions {
			body.insert("permissions".to_string(), json!(permissions));
		}
		Some(serde_json::Value::Object(body))
	}
}

/// Installation IDs are decimal integers and become one URL path segment.
pub(crate) fn is_installation_id(id: &str) -> bool {
	!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
	use super::*;

	const BARE: &str = r#"
appId: "123"
installId: "456"
auth:
  privateKey:
    secretRef:
      name: gh-app
      key: privateKey
"#;

	#[test]
	fn parses_bare_spec() {
		let spec = GithubAccessTokenSpec::parse(BARE.as_bytes()).unwrap();
		assert_eq!(spec.app_id, "123");
		assert_eq!(spec.install_id, "456");
		assert_eq!(spec.auth.private_key.secret_ref.name, "gh-app");
		assert_eq!(spec.auth.private_key.secret_ref.key, "privateKey");
		assert!(spec.url.is_none());
		assert!(spec.request_body().is_none());
	}

	#[test]
	fn parses_resource_envelope() {
		let resource = r#"
apiVersion: generators.external-secrets.io/v1alpha1
kind: GithubAccessToken
metadata:
  name: gh
spec:
  appId: "1"
  installId: "2"
  url: https://github.example.com/api/v3
  auth:
    privateKey:
      secretRef: {name: k, key: pem}
"#;
		let spec = GithubAccessTokenSpec::parse(resource.as_bytes()).unwrap();
		assert_eq!(spec.app_id, "1");
		assert_eq!(spec.url.as_deref(), Some("https://github.example.com/api/v3"));
	}

	#[test]
	fn parses_json() {
		let raw = r#"{"appId":"9","installId":"8","auth":{"privateKey":{"secretRef":{"name":"n","key":"k"}}}}"#;
		let spec = GithubAccessTokenSpec::parse(raw.as_bytes()).unwrap();
		assert_eq!(spec.install_id, "8");
	}

	#[test]
	fn rejects_wrong_kind() {
		let raw = "kind: Password\nspec:\n  length: 4\n";
		assert!(matches!(
			GithubAccessTokenSpec::parse(raw.as_bytes()),
			Err(GeneratorError::SpecParse(_))
		));
	}

	#[test]
	fn rejects_unknown_fields() {
		let raw = format!("{BARE}surprise: true\n");
		assert!(matches!(
			GithubAccessTokenSpec::parse(raw.as_bytes()),
			Err(GeneratorError::SpecParse(_))
		));
	}

	#[test]
	fn rejects_missing_auth() {
		let raw = "appId: \"1\"\ninstallId: \"2\"\n";
		assert!(matches!(
			GithubAccessTokenSpec::parse(raw.as_bytes()),
			Err(GeneratorError::SpecParse(_))
		));
	}

	#[test]
	fn rejects_install_id_with_path() {
		for bad in ["456/../../x", "..", ".", "x\\\\..\\\\..\\\\user", "45%2F6", " 456", "-1"] {
			let raw = BARE.replace("\"456\"", &format!("\"{bad}\""));
			assert!(
				matches!(
					GithubAccessTokenSpec::parse(raw.as_bytes()),
					Err(GeneratorError::SpecParse(_))
				),
				"accepted installId {bad:?}"
			);
		}
	}

	#[test]
	fn installation_ids_are_decimal() {
		assert!(is_installation_id("0"));
		assert!(is_installation_id("48213377"));
		assert!(!is_installation_id(""));
		assert!(!is_installation_id("4e3"));
		assert!(!is_installation_id("x\\..\\..\\user"));
	}

	#[test]
	fn request_body_includes_scoping() {
		let raw = format!(
			"{BARE}repositories: [api, web]\npermissions:\n  contents: read\n"
		);
		let spec = GithubAccessTokenSpec::parse(raw.as_bytes()).unwrap();
		assert_eq!(
			spec.request_body(),
			Some(json!({
				"repositories": ["api", "web"],
				"permissions": {"contents": "read"}
			}))
		);
	}

	#[test]
	fn empty_repository_list_sends_no_body() {
		let raw = format!("{BARE}repositories: []\n");
		let spec = GithubAccessTokenSpec::parse(raw.as_bytes()).unwrap();
		assert!(spec.request_body().is_none());
	}
}
