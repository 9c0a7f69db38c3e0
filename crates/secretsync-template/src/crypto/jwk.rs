// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! JWK → PEM conversion for RSA, EC (P-256, P-384) and Ed25519 keys.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::Deserialize;

use super::{CryptoError, CryptoResult};

#[derive(Debug, Deserialize)]
struct Jwk {
	kty: String,
	#[serde(default)]
	crv: Option<String>,
	#[serde(default)]
	n: Option<String>,
	#[serde(default)]
	e: Option<String>,
	#[serde(default)]
	d: Option<String>,
	#[serde(default)]
	p: Option<String>,
	#[serde(default)]
	q: Option<String>,
	#[serde(default)]
	x: Option<String>,
}

impl Jwk {
	fn parse(input: &str) -> CryptoResult<Self> {
		serde_json::from_str(input).map_err(|e| CryptoError::InvalidJwk(e.to_string()))
	}

	fn field(&self, name: &'static str, value: &Option<String>) -> CryptoResult<Vec<u8>> {
		let raw = value.as_deref().ok_or_else(|| {
			CryptoError::InvalidJwk(format!("missing '{name}' for kty {}", self.kty))
		})?;
		URL_SAFE_NO_PAD
			.decode(raw.trim_end_matches('='))
			.map_err(|e| CryptoError::InvalidJwk(format!("'{name}' is not base64url: {e}")))
	}

	fn uint(&self, name: &'static str, value: &Option<String>) -> CryptoResult<BigUint> {
		Ok(BigUint::from_bytes_be(&self.field(name, value)?))
	}

	fn ed25519_bytes(&self, name: &'static str, value: &Option<String>) -> CryptoResult<[u8; 32]> {
		self
			.field(name, value)?
			.try_into()
			.map_err(|_| CryptoError::InvalidJwk(format!("'{name}' must be 32 bytes for Ed25519")))
	}

	fn curve(&self) -> CryptoResult<&str> {
		self
			.crv
			.as_deref()
			.ok_or_else(|| CryptoError::InvalidJwk(format!("missing 'crv' for kty {}", self.kty)))
	}
}

fn encode_err(e: impl std::fmt::Display) -> CryptoError {
	CryptoError::KeyEncode(e.to_string())
}

fn invalid(e: impl std::fmt::Display) -> CryptoError {
	CryptoError::InvalidJwk(e.to_string())
}

/// Convert a JWK (public or private) to a PEM `PUBLIC KEY` (SPKI) block.
pub fn jwk_public_key_pem(input: &str) -> CryptoResult<String> {
	let jwk = Jwk::parse(input)?;
	match jwk.kty.as_str() {
		"RSA" => {
			let key = RsaPublicKey::new(jwk.uint("n", &jwk.n)?, jwk.uint("e", &jwk.e)?)
				.map_err(invalid)?;
			key.to_public_key_pem(LineEnding::LF).map_err(encode_err)
		}
		"EC" => match jwk.curve()? {
			"P-256" => p256::PublicKey::from_jwk_str(input)
				.map_err(invalid)?
				.to_public_key_pem(LineEnding::LF)
				.map_err(encode_err),
			"P-384" => p384::PublicKey::from_jwk_str(input)
				.map_err(invalid)?
				.to_public_key_pem(LineEnding::LF)
				.map_err(encode_err),
			other => Err(CryptoError::UnsupportedJwk(format!("EC curve {other}"))),
		},
		"OKP" => match jwk.curve()? {
			"Ed25519" => VerifyingKey::from_bytes(&jwk.ed25519_bytes("x", &jwk.x)?)
				.map_err(invalid)?
				.to_public_key_pem(LineEnding::LF)
				.map_err(encode_err),
			other => Err(CryptoError::UnsupportedJwk(format!("OKP curve {other}"))),
		},
		other => Err(CryptoError::UnsupportedJwk(other.to_string())),
	}
}

/// Convert a private JWK to a PEM `PRIVATE KEY` (PKCS#8) block.
pub fn jwk_private_key_pem(input: &str) -> CryptoResult<String> {
	let jwk = Jwk::parse(input)?;
	if jwk.d.is_none() {
		return Err(CryptoError::InvalidJwk("not a private key: missing 'd'".to_string()));
	}
	let pem = match jwk.kty.as_str() {
		"RSA" => {
			let primes = match (&jwk.p, &jwk.q) {
				(Some(_), Some(_)) => vec![jwk.uint("p", &jwk.p)?, jwk.uint("q", &jwk.q)?],
				_ => Vec::new(),
			};
			let key = RsaPrivateKey::from_components(
				jwk.uint("n", &jwk.n)?,
				jwk.uint("e", &jwk.e)?,
				jwk.uint("d", &jwk.d)?,
				primes,
			)
			.map_err(invalid)?;
			key.to_pkcs8_pem(LineEnding::LF).map_err(encode_err)?
		}
		"EC" => match jwk.curve()? {
			"P-256" => p256::SecretKey::from_jwk_str(input)
				.map_err(invalid)?
				.to_pkcs8_pem(LineEnding::LF)
				.map_err(encode_err)?,
			"P-384" => p384::SecretKey::from_jwk_str(input)
				.map_err(invalid)?
				.to_pkcs8_pem(LineEnding::LF)
				.map_err(encode_err)?,
			other => return Err(CryptoError::UnsupportedJwk(format!("EC curve {other}"))),
		},
		"OKP" => match jwk.curve()? {
			"Ed25519" => SigningKey::from_bytes(&jwk.ed25519_bytes("d", &jwk.d)?)
				.to_pkcs8_pem(LineEnding::LF)
				.map_err(encode_err)?,
			other => return Err(CryptoError::UnsupportedJwk(format!("OKP curve {other}"))),
		},
		other => return Err(CryptoError::UnsupportedJwk(other.to_string())),
	};
	Ok(pem.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
	use rsa::traits::{PrivateKeyParts, PublicKeyParts};

	fn b64(bytes: &[u8]) -> String {
		URL_SAFE_NO_PAD.encode(bytes)
	}

	#[test]
	fn rsa_private_and_public() {
		let key = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
		let primes = key.primes();
		let jwk = serde_json::json!({
			"kty": "RSA",
			"n": b64(&key.n().to_bytes_be()),
			"e": b64(&key.e().to_bytes_be()),
			"d": b64(&key.d().to_bytes_be()),
			"p": b64(&primes[0].to_bytes_be()),
			"q": b64(&primes[1].to_bytes_be()),
		})
		.to_string();

		let private_pem = jwk_private_key_pem(&jwk).unwrap();
		let parsed = RsaPrivateKey::from_pkcs8_pem(&private_pem).unwrap();
		assert_eq!(parsed.n(), key.n());
		assert_eq!(parsed.d(), key.d());

		let public_pem = jwk_public_key_pem(&jwk).unwrap();
		assert!(public_pem.starts_with("-----BEGIN PUBLIC KEY-----"));
		let public = RsaPublicKey::from_public_key_pem(&public_pem).unwrap();
		assert_eq!(public, key.to_public_key());
	}

	#[test]
	fn ec_p256_private_and_public() {
		let secret = p256::SecretKey::random(&mut rand::thread_rng());
		let jwk = secret.to_jwk_string();

		let private_pem = jwk_private_key_pem(&jwk).unwrap();
		let parsed = p256::SecretKey::from_pkcs8_pem(&private_pem).unwrap();
		assert_eq!(parsed.to_bytes(), secret.to_bytes());

		let public_pem = jwk_public_key_pem(&jwk).unwrap();
		let public = p256::PublicKey::from_public_key_pem(&public_pem).unwrap();
		assert_eq!(public, secret.public_key());
	}

	#[test]
	fn ed25519_private_and_public() {
		let signing = SigningKey::from_bytes(&[7u8; 32]);
		let jwk = serde_json::json!({
			"kty": "OKP",
			"crv": "Ed25519",
			"x": b64(signing.verifying_key().as_bytes()),
			"d": b64(&signing.to_bytes()),
		})
		.to_string();

		let private_pem = jwk_private_key_pem(&jwk).unwrap();
		let parsed = SigningKey::from_pkcs8_pem(&private_pem).unwrap();
		assert_eq!(parsed.to_bytes(), signing.to_bytes());

		let public_pem = jwk_public_key_pem(&jwk).unwrap();
		let public = VerifyingKey::from_public_key_pem(&public_pem).unwrap();
		assert_eq!(public, signing.verifying_key());
	}

	#[test]
	fn public_jwk_cannot_yield_private_pem() {
		let secret = p256::SecretKey::random(&mut rand::thread_rng());
		let public_jwk = secret.public_key().to_jwk_string();
		assert!(matches!(
			jwk_private_key_pem(&public_jwk),
			Err(CryptoError::InvalidJwk(_))
		));
		assert!(jwk_public_key_pem(&public_jwk).is_ok());
	}

	#[test]
	fn unsupported_types_are_named() {
		assert!(matches!(
			jwk_public_key_pem(r#"{"kty":"oct","k":"c2VjcmV0"}"#),
			Err(CryptoError::UnsupportedJwk(t)) if t == "oct"
		));
		assert!(matches!(
			jwk_public_key_pem(r#"{"kty":"EC","crv":"secp256k1","x":"AA","y":"AA"}"#),
			Err(CryptoError::UnsupportedJwk(_))
		));
	}

	#[test]
	fn malformed_json_is_invalid_jwk() {
		assert!(matches!(
			jwk_public_key_pem("not json"),
			Err(CryptoError::InvalidJwk(_))
		));
		assert!(matches!(
			jwk_public_key_pem(r#"{"kty":"RSA","e":"AQAB"}"#),
			Err(CryptoError::InvalidJwk(_))
		));
	}
}
