// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! [`ObjectClient`] backed by the Kubernetes API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::api::{ListParams, PostParams};
use kube::{Api, Client};
use tracing::{debug, instrument};

use crate::client::{ObjectClient, SecretObject};
use crate::error::{ObjectError, ObjectResult};

/// Object client that reads and writes `v1/Secret` objects.
#[derive(Clone)]
pub struct KubeObjectClient {
	client: Client,
}

impl KubeObjectClient {
	pub fn new(client: Client) -> Self {
		Self { client }
	}

	/// Build a client from the ambient kubeconfig or in-cluster service
	/// account.
	pub async fn try_default() -> ObjectResult<Self> {
		let client = Client::try_default().await?;
		Ok(Self::new(client))
	}

	fn api(&self, namespace: &str) -> Api<Secret> {
		Api::namespaced(self.client.clone(), namespace)
	}
}

#[async_trait]
impl ObjectClient for KubeObjectClient {
	#[instrument(skip(self))]
	async fn get_secret(&self, namespace: &str, name: &str) -> ObjectResult<SecretObject> {
		match self.api(namespace).get_opt(name).await? {
			Some(secret) => {
				debug!("fetched secret");
				Ok(from_k8s(secret, namespace))
			}
			None => Err(ObjectError::not_found(namespace, name)),
		}
	}

	#[instrument(skip(self))]
	async fn list_secrets(&self, namespace: &str) -> ObjectResult<Vec<SecretObject>> {
		let list = self.api(namespace).list(&ListParams::default()).await?;
		debug!(count = list.items.len(), "listed secrets");
		Ok(list
			.items
			.into_iter()
			.map(|s| from_k8s(s, namespace))
			.collect())
	}

	#[instrument(skip(self, secret), fields(namespace = %secret.namespace, name = %secret.name))]
	async fn update_secret(&self, secret: SecretObject) -> ObjectResult<SecretObject> {
		let namespace = secret.namespace.clone();
		let name = secret.name.clone();
		let replaced = self
			.api(&namespace)
			.replace(&name, &PostParams::default(), &to_k8s(secret))
			.await
			.map_err(|err| match err {
				kube::Error::Api(ref response) if response.code == 404 => {
					ObjectError::not_found(&namespace, &name)
				}
				kube::Error::Api(ref response) if response.code == 409 => ObjectError::Conflict {
					namespace: namespace.clone(),
					name: name.clone(),
				},
				other => ObjectError::from(other),
			})?;
		debug!("updated secret");
		Ok(from_k8s(replaced, &namespace))
	}
}

fn from_k8s(secret: Secret, namespace: &str) -> SecretObject {
	let data = secret
		.data
		.unwrap_or_default()
		.into_iter()
		.map(|(k, ByteString(v))| (k, v))
		.collect();
	SecretObject {
		name: secret.metadata.name.unwrap_or_default(),
		namespace: secret
			.metadata
			.namespace
			.unwrap_or_else(|| namespace.to_string()),
		data,
		labels: secret.metadata.labels.unwrap_or_default(),
		annotations: secret.metadata.annotations.unwrap_or_default(),
		resource_version: secret.metadata.resource_version,
	}
}

fn to_k8s(secret: SecretObject) -> Secret {
	let data: BTreeMap<String, ByteString> = secret
		.data
		.into_iter()
		.map(|(k, v)| (k, ByteString(v)))
		.collect();
	Secret {
		metadata: ObjectMeta {
			name: Some(secret.name),
			namespace: Some(secret.namespace),
			labels: non_empty(secret.labels),
			annotations: non_empty(secret.annotations),
			resource_version: secret.resource_version,
			..Default::default()
		},
		data: Some(data),
		..Default::default()
	}
}

fn non_empty(map: BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
	if map.is_empty() {
		None
	} else {
		Some(map)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_through_k8s_type() {
		let mut secret = SecretObject::new("ci", "gh-app").with_data("privateKey", "pem");
		secret.labels.insert("team".into(), "infra".into());
		secret.resource_version = Some("42".into());

		let k8s = to_k8s(secret.clone());
		assert_eq!(k8s.metadata.annotations, None);
		assert_eq!(from_k8s(k8s, "ci"), secret);
	}

	#[test]
	fn missing_metadata_falls_back_to_request_namespace() {
		let k8s = Secret {
			metadata: ObjectMeta {
				name: Some("x".into()),
				..Default::default()
			},
			..Default::default()
		};
		let secret = from_k8s(k8s, "fallback");
		assert_eq!(secret.namespace, "fallback");
		assert!(secret.data.is_empty());
	}
}
