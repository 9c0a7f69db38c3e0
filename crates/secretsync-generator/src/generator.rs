// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The generator contract.

use std::collections::BTreeMap;

use async_trait::async_trait;
use secretsync_kube::ObjectClient;
use serde::{de::DeserializeOwned, Serialize};

use crate::context::Context;
use crate::error::{GeneratorError, GeneratorResult};

/// Opaque state returned by [`Generator::generate`] and handed back to
/// [`Generator::cleanup`].
///
/// The caller persists the bytes verbatim; only the generator that produced
/// them interprets the contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderState(Vec<u8>);

impl ProviderState {
	pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
		Self(bytes.into())
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	pub fn into_bytes(self) -> Vec<u8> {
		self.0
	}

	/// Serialize a generator-specific state value as JSON.
	pub fn to_json<T: Serialize>(value: &T) -> GeneratorResult<Self> {
		serde_json::to_vec(value)
			.map(Self)
			.map_err(|e| GeneratorError::State(e.to_string()))
	}

	/// Decode JSON state produced by [`ProviderState::to_json`].
	pub fn from_json<T: DeserializeOwned>(&self) -> GeneratorResult<T> {
		serde_json::from_slice(&self.0).map_err(|e| GeneratorError::State(e.to_string()))
	}
}

/// Output of a successful [`Generator::generate`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generated {
	/// Field name to raw credential bytes.
	pub fields: BTreeMap<String, Vec<u8>>,
	/// State needed to undo side effects; `None` when there are none.
	pub state: Option<ProviderState>,
}

impl Generated {
	pub fn new(fields: BTreeMap<String, Vec<u8>>) -> Self {
		Self {
			fields,
			state: None,
		}
	}

	pub fn with_state(mut self, state: ProviderState) -> Self {
		self.state = Some(state);
		self
	}
}

/// A source of generated credential material.
///
/// Implementations are registered once in a [`crate::GeneratorRegistry`] and
/// shared across tasks.
#[async_trait]
pub trait Generator: Send + Sync {
	/// Produce credential fields from `spec`.
	///
	/// A missing or empty `spec` fails with [`GeneratorError::SpecMissing`]
	/// before any I/O. Outbound calls are bounded by `ctx`.
	async fn generate(
		&self,
		ctx: &Context,
		spec: Option<&[u8]>,
		client: &dyn ObjectClient,
		namespace: &str,
	) -> GeneratorResult<Generated>;

	/// Undo whatever `generate` created. Must be idempotent.
	async fn cleanup(
		&self,
		ctx: &Context,
		spec: Option<&[u8]>,
		state: Option<&ProviderState>,
		client: &dyn ObjectClient,
		namespace: &str,
	) -> GeneratorResult<()>;
}

/// Reject a missing or empty spec.
pub(crate) fn require_spec(spec: Option<&[u8]>) -> GeneratorResult<&[u8]> {
	match spec {
		Some(raw) if !raw.iter().all(u8::is_ascii_whitespace) => Ok(raw),
		_ => Err(GeneratorError::SpecMissing),
	}
}
