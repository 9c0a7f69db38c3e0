// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Format converters between PEM, PKCS#12 and JWK.
//!
//! Every function here is pure: bytes in, text out. They are exposed to
//! templates through [`crate::functions`] but are usable on their own.

mod chain;
mod jwk;
mod pkcs12;

use pem::{EncodeConfig, LineEnding, Pem};
use thiserror::Error;

pub use chain::{filter_cert_chain, filter_pem, CertType};
pub use jwk::{jwk_private_key_pem, jwk_public_key_pem};
pub use pkcs12::{
	full_pem_to_pkcs12, pem_to_pkcs12, pkcs12_cert, pkcs12_key, private_key_to_pkcs8,
};

pub(crate) const PEM_TYPE_CERTIFICATE: &str = "CERTIFICATE";
pub(crate) const PEM_TYPE_KEY: &str = "PRIVATE KEY";

/// Errors from format conversion. Each variant names a distinct operator
/// mistake so a wrong password is never reported as corrupt input.
#[derive(Debug, Error)]
pub enum CryptoError {
	#[error("cannot decode PKCS12 bundle: {0}")]
	Pkcs12Decode(String),

	#[error("cannot decode PKCS12 with given password")]
	Pkcs12Password,

	#[error("cannot encode PKCS12 bundle from the given certificate and key")]
	Pkcs12Encode,

	#[error("cannot decode PEM: {0}")]
	PemDecode(#[from] pem::PemError),

	#[error("no certificate found in input")]
	NoCertificate,

	#[error("no private key found in input")]
	NoPrivateKey,

	#[error("not a recognized private key type: {0}")]
	UnsupportedKeyType(String),

	#[error("cannot parse certificate: {0}")]
	Certificate(String),

	#[error("unknown certificate type '{0}': expected 'leaf', 'intermediate' or 'root'")]
	UnknownCertType(String),

	#[error("invalid JWK: {0}")]
	InvalidJwk(String),

	#[error("unsupported JWK key type: {0}")]
	UnsupportedJwk(String),

	#[error("cannot encode key as PEM: {0}")]
	KeyEncode(String),

	#[error("yaml: {0}")]
	Yaml(String),

	#[error("json: {0}")]
	Json(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

fn pem_config() -> EncodeConfig {
	EncodeConfig::new().set_line_ending(LineEnding::LF)
}

/// Encode a single DER blob as a PEM block with LF line endings.
pub(crate) fn encode_pem(tag: &str, der: impl Into<Vec<u8>>) -> String {
	pem::encode_config(&Pem::new(tag, der), pem_config())
}

pub(crate) fn encode_pem_many(blocks: &[Pem]) -> String {
	pem::encode_many_config(blocks, pem_config())
}
