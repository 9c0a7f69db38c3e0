// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for generators and the registry.

use secretsync_kube::ObjectError;
use thiserror::Error;

use crate::registry::GeneratorKind;

/// Errors returned by [`crate::Generator`] implementations.
///
/// Input problems (`Spec*`, `Key*`) are kept apart from backend failures.
#[derive(Debug, Error)]
pub enum GeneratorError {
	/// No spec (or an empty one) was supplied.
	#[error("no config spec provided")]
	SpecMissing,

	#[error("unable to parse spec: {0}")]
	SpecParse(#[source] serde_yaml::Error),

	/// The signing key could not be read from the object store.
	#[error("error getting private key from secret {namespace}/{name}: {reason}")]
	KeyMaterialUnavailable {
		namespace: String,
		name: String,
		reason: String,
		#[source]
		source: Option<ObjectError>,
	},

	#[error("error parsing RSA private key: {0}")]
	KeyParse(#[source] jsonwebtoken::errors::Error),

	#[error("error signing token: {0}")]
	AssertionSign(#[source] jsonwebtoken::errors::Error),

	#[error("error creating request: {0}")]
	RequestBuild(String),

	/// Network-level error during HTTP communication.
	#[error("error performing request: {0}")]
	Transport(#[source] reqwest::Error),

	/// The backend answered with a non-success status.
	#[error("error generating token: response code: {status}{}", .message.as_deref().map(|m| format!(", response: {m}")).unwrap_or_default())]
	BackendRejected { status: u16, message: Option<String> },

	#[error("malformed backend response: {0}")]
	MalformedBackendResponse(String),

	#[error("deadline exceeded")]
	DeadlineExceeded,

	#[error("operation cancelled")]
	Cancelled,

	#[error("unsupported generator kind: {0}")]
	UnsupportedKind(GeneratorKind),

	#[error("invalid provider state: {0}")]
	State(String),

	/// Generator configuration error.
	#[error("configuration error: {0}")]
	Config(String),
}

impl GeneratorError {
	/// Create a backend rejection from status code and optional message.
	pub fn backend_rejected(status: u16, message: Option<String>) -> Self {
		Self::BackendRejected { status, message }
	}

	/// Whether a caller may reasonably retry the same request.
	///
	/// Nothing in this crate retries; the reconciler owns backoff.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
			Self::DeadlineExceeded => true,
			Self::BackendRejected { status, .. } => *status >= 500 || *status == 429,
			_ => false,
		}
	}
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Errors raised while assembling a [`crate::GeneratorRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("generator kind {0} is already registered")]
	DuplicateKind(GeneratorKind),

	#[error("unable to build generator {kind}: {reason}")]
	Init { kind: GeneratorKind, reason: String },
}
