// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-process [`ObjectClient`] for tests and local runs.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::{ObjectClient, SecretObject};
use crate::error::{ObjectError, ObjectResult};

type Key = (String, String);

/// Object client holding secrets in memory, keyed by namespace and name.
///
/// Resource versions are assigned from a counter so update conflicts behave
/// like the API server's optimistic concurrency.
#[derive(Default)]
pub struct InMemoryObjectClient {
	secrets: RwLock<BTreeMap<Key, SecretObject>>,
	version: AtomicU64,
}

impl InMemoryObjectClient {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seed the client with a set of secrets.
	pub fn with_secrets(secrets: impl IntoIterator<Item = SecretObject>) -> Self {
		let mut map = BTreeMap::new();
		let mut version = 0u64;
		for mut secret in secrets {
			version += 1;
			secret.resource_version = Some(version.to_string());
			map.insert((secret.namespace.clone(), secret.name.clone()), secret);
		}
		Self {
			secrets: RwLock::new(map),
			version: AtomicU64::new(version),
		}
	}

	/// Load secrets from a YAML file containing a list of [`SecretObject`]s.
	pub fn from_yaml_file(path: impl AsRef<Path>) -> ObjectResult<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ObjectError::Seed {
			message: format!("{}: {e}", path.display()),
		})?;
		let secrets: Vec<SecretObject> =
			serde_yaml::from_str(&content).map_err(|e| ObjectError::Seed {
				message: format!("{}: {e}", path.display()),
			})?;
		debug!(path = %path.display(), count = secrets.len(), "seeded in-memory secrets");
		Ok(Self::with_secrets(secrets))
	}

	/// Insert or overwrite a secret without a version check.
	pub async fn insert(&self, mut secret: SecretObject) {
		secret.resource_version = Some(self.next_version());
		self
			.secrets
			.write()
			.await
			.insert((secret.namespace.clone(), secret.name.clone()), secret);
	}

	fn next_version(&self) -> String {
		(self.version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
	}
}

#[async_trait]
impl ObjectClient for InMemoryObjectClient {
	async fn get_secret(&self, namespace: &str, name: &str) -> ObjectResult<SecretObject> {
		self
			.secrets
			.read()
			.await
			.get(&(namespace.to_string(), name.to_string()))
			.cloned()
			.ok_or_else(|| ObjectError::not_found(namespace, name))
	}

	async fn list_secrets(&self, namespace: &str) -> ObjectResult<Vec<SecretObject>> {
		Ok(self
			.secrets
			.read()
			.await
			.values()
			.filter(|s| s.namespace == namespace)
			.cloned()
			.collect())
	}

	async fn update_secret(&self, mut secret: SecretObject) -> ObjectResult<SecretObject> {
		let key = (secret.namespace.clone(), secret.name.clone());
		let mut secrets = self.secrets.write().await;
		let current = secrets
			.get(&key)
			.ok_or_else(|| ObjectError::not_found(&key.0, &key.1))?;

		let stale = secret.resource_version.is_some()
			&& secret.resource_version != current.resource_version;
		if stale {
			return Err(ObjectError::Conflict {
				namespace: key.0,
				name: key.1,
			});
		}

		secret.resource_version = Some(self.next_version());
		secrets.insert(key, secret.clone());
		Ok(secret)
	}
}
