// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Generator registry: built once at startup, read-only afterwards.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use secretsync_kube::ObjectClient;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, instrument};

use crate::context::Context;
use crate::error::{GeneratorError, GeneratorResult, RegistryError};
use crate::generator::{Generated, Generator, ProviderState};
use crate::github::{GithubAccessTokenGenerator, GithubGeneratorConfig};

/// Generator kinds known to secretsync.
///
/// Only some kinds have an implementation; the rest parse so a request for
/// them reports "unsupported" rather than "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeneratorKind {
	AcrAccessToken,
	EcrAuthorizationToken,
	Fake,
	GcrAccessToken,
	GithubAccessToken,
	QuayAccessToken,
	Password,
	SshKey,
	StsSessionToken,
	Uuid,
	VaultDynamicSecret,
	Webhook,
	Grafana,
	Mfa,
	ClusterGenerator,
}

impl GeneratorKind {
	pub const ALL: [GeneratorKind; 15] = [
		Self::AcrAccessToken,
		Self::EcrAuthorizationToken,
		Self::Fake,
		Self::GcrAccessToken,
		Self::GithubAccessToken,
		Self::QuayAccessToken,
		Self::Password,
		Self::SshKey,
		Self::StsSessionToken,
		Self::Uuid,
		Self::VaultDynamicSecret,
		Self::Webhook,
		Self::Grafana,
		Self::Mfa,
		Self::ClusterGenerator,
	];

	/// The kind name as it appears in generator resources.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::AcrAccessToken => "ACRAccessToken",
			Self::EcrAuthorizationToken => "ECRAuthorizationToken",
			Self::Fake => "Fake",
			Self::GcrAccessToken => "GCRAccessToken",
			Self::GithubAccessToken => "GithubAccessToken",
			Self::QuayAccessToken => "QuayAccessToken",
			Self::Password => "Password",
			Self::SshKey => "SSHKey",
			Self::StsSessionToken => "STSSessionToken",
			Self::Uuid => "UUID",
			Self::VaultDynamicSecret => "VaultDynamicSecret",
			Self::Webhook => "Webhook",
			Self::Grafana => "Grafana",
			Self::Mfa => "MFA",
			Self::ClusterGenerator => "ClusterGenerator",
		}
	}
}

impl fmt::Display for GeneratorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error for a kind string that names no known generator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown generator kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for GeneratorKind {
	type Err = UnknownKind;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|k| k.as_str() == s)
			.ok_or_else(|| UnknownKind(s.to_string()))
	}
}

impl Serialize for GeneratorKind {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for GeneratorKind {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// Maps generator kinds to implementations.
///
/// Construct with [`GeneratorRegistry::builder`]; the finished registry has
/// no mutating methods and is shared behind an `Arc`.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
	generators: HashMap<GeneratorKind, Arc<dyn Generator>>,
}

impl fmt::Debug for GeneratorRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut kinds: Vec<_> = self.generators.keys().collect();
		kinds.sort();
		f.debug_struct("GeneratorRegistry")
			.field("kinds", &kinds)
			.finish()
	}
}

impl GeneratorRegistry {
	pub fn builder() -> RegistryBuilder {
		RegistryBuilder::default()
	}

	/// A registry with every built-in generator.
	pub fn with_defaults(github: GithubGeneratorConfig) -> Result<Self, RegistryError> {
		let github = GithubAccessTokenGenerator::new(github).map_err(|e| RegistryError::Init {
			kind: GeneratorKind::GithubAccessToken,
			reason: e.to_string(),
		})?;
		Ok(Self::builder()
			.register(GeneratorKind::GithubAccessToken, Arc::new(github))?
			.build())
	}

	pub fn lookup(&self, kind: GeneratorKind) -> Option<Arc<dyn Generator>> {
		self.generators.get(&kind).cloned()
	}

	/// Registered kinds in a stable order.
	pub fn kinds(&self) -> Vec<GeneratorKind> {
		let mut kinds: Vec<_> = self.generators.keys().copied().collect();
		kinds.sort();
		kinds
	}

	fn require(&self, kind: GeneratorKind) -> GeneratorResult<Arc<dyn Generator>> {
		self.lookup(kind).ok_or(GeneratorError::UnsupportedKind(kind))
	}

	#[instrument(skip(self, kind, ctx, spec, client), fields(kind = %kind))]
	pub async fn generate(
		&self,
		kind: GeneratorKind,
		ctx: &Context,
		spec: Option<&[u8]>,
		client: &dyn ObjectClient,
		namespace: &str,
	) -> GeneratorResult<Generated> {
		let generator = self.require(kind)?;
		let generated = generator.generate(ctx, spec, client, namespace).await?;
		debug!(fields = generated.fields.len(), stateful = generated.state.is_some(), "generated");
		Ok(generated)
	}

	#[instrument(skip(self, kind, ctx, spec, state, client), fields(kind = %kind))]
	pub async fn cleanup(
		&self,
		kind: GeneratorKind,
		ctx: &Context,
		spec: Option<&[u8]>,
		state: Option<&ProviderState>,
		client: &dyn ObjectClient,
		namespace: &str,
	) -> GeneratorResult<()> {
		self
			.require(kind)?
			.cleanup(ctx, spec, state, client, namespace)
			.await
	}
}

/// Collects registrations during process initialisation.
#[derive(Default)]
pub struct RegistryBuilder {
	generators: HashMap<GeneratorKind, Arc<dyn Generator>>,
}

impl RegistryBuilder {
	/// Register `generator` for `kind`. Each kind may be registered once.
	pub fn register(
		mut self,
		kind: GeneratorKind,
		generator: Arc<dyn Generator>,
	) -> Result<Self, RegistryError> {
		if self.generators.contains_key(&kind) {
			return Err(RegistryError::DuplicateKind(kind));
		}
		self.generators.insert(kind, generator);
		Ok(self)
	}

	pub fn build(self) -> GeneratorRegistry {
		GeneratorRegistry {
			generators: self.generators,
		}
	}
}
