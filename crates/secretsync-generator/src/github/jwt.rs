// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! App assertion signing for GitHub App authentication.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{GeneratorError, GeneratorResult};

/// Seconds the issued-at claim is backdated to absorb clock drift.
pub const CLOCK_SKEW_SECS: u64 = 10;

/// Assertion lifetime, counted from the backdated issued-at.
pub const ASSERTION_LIFETIME_SECS: u64 = 300;

/// JWT claims for GitHub App authentication.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Issued at (Unix timestamp).
	pub iat: u64,
	/// Expiration (Unix timestamp).
	pub exp: u64,
	/// Issuer (GitHub App ID).
	pub iss: String,
}

/// Load an RSA private key (PKCS#1 or PKCS#8 PEM).
pub fn parse_private_key(pem: &[u8]) -> GeneratorResult<EncodingKey> {
	EncodingKey::from_rsa_pem(pem).map_err(GeneratorError::KeyParse)
}

/// Sign a short-lived RS256 assertion identifying the app.
#[instrument(skip(key))]
pub fn sign_app_assertion(app_id: &str, key: &EncodingKey) -> GeneratorResult<String> {
	let now = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs();
	let iat = now.saturating_sub(CLOCK_SKEW_SECS);

	let claims = AssertionClaims {
		iat,
		exp: iat + ASSERTION_LIFETIME_SECS,
		iss: app_id.to_string(),
	};

	encode(&Header::new(Algorithm::RS256), &claims, key).map_err(GeneratorError::AssertionSign)
}
