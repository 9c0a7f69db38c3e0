// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! PKCS#12 ⇄ PEM conversion.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use p12::PFX;
use pem::Pem;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, PrivateKeyInfo};
use rsa::RsaPrivateKey;

use super::chain::order_chain;
use super::{encode_pem, encode_pem_many, CryptoError, CryptoResult};
use super::{PEM_TYPE_CERTIFICATE, PEM_TYPE_KEY};

fn parse_pfx(input: &[u8], password: &str) -> CryptoResult<PFX> {
	let pfx = PFX::parse(input).map_err(|e| CryptoError::Pkcs12Decode(format!("{e:?}")))?;
	if !pfx.verify_mac(password) {
		return Err(CryptoError::Pkcs12Password);
	}
	Ok(pfx)
}

/// Extract the private key from a PKCS#12 bundle as a PKCS#8 PEM block.
pub fn pkcs12_key(input: &[u8], password: &str) -> CryptoResult<String> {
	let pfx = parse_pfx(input, password)?;
	let key = pfx
		.key_bags(password)
		.map_err(|e| CryptoError::Pkcs12Decode(format!("{e:?}")))?
		.into_iter()
		.next()
		.ok_or(CryptoError::NoPrivateKey)?;
	Ok(encode_pem(PEM_TYPE_KEY, key))
}

/// Extract all certificates from a PKCS#12 bundle, leaf first.
pub fn pkcs12_cert(input: &[u8], password: &str) -> CryptoResult<String> {
	let pfx = parse_pfx(input, password)?;
	let certs = pfx
		.cert_x509_bags(password)
		.map_err(|e| CryptoError::Pkcs12Decode(format!("{e:?}")))?;
	if certs.is_empty() {
		return Err(CryptoError::NoCertificate);
	}
	let (chain, rest) = order_chain(certs)?;
	let blocks: Vec<Pem> = chain
		.into_iter()
		.chain(rest)
		.map(|c| Pem::new(PEM_TYPE_CERTIFICATE, c.der))
		.collect();
	Ok(encode_pem_many(&blocks))
}

/// Bundle the first certificate in `cert_pem` with `key_pem` into a
/// base64-encoded PKCS#12 archive.
pub fn pem_to_pkcs12(cert_pem: &str, key_pem: &str, password: &str) -> CryptoResult<String> {
	let cert = pem::parse_many(cert_pem)?
		.into_iter()
		.find(|b| b.tag() == PEM_TYPE_CERTIFICATE)
		.ok_or(CryptoError::NoCertificate)?;
	let key = first_private_key(&pem::parse_many(key_pem)?)?;

	let pfx = PFX::new(cert.contents(), &key, None, password, "")
		.ok_or(CryptoError::Pkcs12Encode)?;
	Ok(STANDARD.encode(pfx.to_der()))
}

/// Bundle a PEM document holding a private key and a full certificate chain
/// into a base64-encoded PKCS#12 archive. The leaf is found by walking the
/// chain; every other certificate is stored as a CA certificate.
pub fn full_pem_to_pkcs12(input: &str, password: &str) -> CryptoResult<String> {
	let blocks = pem::parse_many(input)?;
	let key = first_private_key(&blocks)?;
	let certs: Vec<Vec<u8>> = blocks
		.iter()
		.filter(|b| b.tag() == PEM_TYPE_CERTIFICATE)
		.map(|b| b.contents().to_vec())
		.collect();
	if certs.is_empty() {
		return Err(CryptoError::NoCertificate);
	}

	let (chain, rest) = order_chain(certs)?;
	let mut ordered = chain.into_iter().chain(rest);
	let leaf = ordered.next().ok_or(CryptoError::NoCertificate)?;
	let cas: Vec<Vec<u8>> = ordered.map(|c| c.der).collect();
	let ca_refs: Vec<&[u8]> = cas.iter().map(Vec::as_slice).collect();

	let pfx = PFX::new_with_cas(&leaf.der, &key, &ca_refs, password, "")
		.ok_or(CryptoError::Pkcs12Encode)?;
	Ok(STANDARD.encode(pfx.to_der()))
}

fn first_private_key(blocks: &[Pem]) -> CryptoResult<Vec<u8>> {
	let block = blocks
		.iter()
		.find(|b| b.tag().ends_with(PEM_TYPE_KEY))
		.ok_or(CryptoError::NoPrivateKey)?;
	private_key_to_pkcs8(block)
}

/// Normalise a PEM private key block (PKCS#8, PKCS#1 RSA or SEC1 EC) to
/// PKCS#8 DER.
pub fn private_key_to_pkcs8(block: &Pem) -> CryptoResult<Vec<u8>> {
	let unsupported = || CryptoError::UnsupportedKeyType(block.tag().to_string());
	match block.tag() {
		"PRIVATE KEY" => {
			PrivateKeyInfo::try_from(block.contents()).map_err(|_| unsupported())?;
			Ok(block.contents().to_vec())
		}
		"RSA PRIVATE KEY" => {
			let key = RsaPrivateKey::from_pkcs1_der(block.contents()).map_err(|_| unsupported())?;
			let doc = key
				.to_pkcs8_der()
				.map_err(|e| CryptoError::KeyEncode(e.to_string()))?;
			Ok(doc.as_bytes().to_vec())
		}
		"EC PRIVATE KEY" => {
			let doc = if let Ok(key) = p256::SecretKey::from_sec1_der(block.contents()) {
				key.to_pkcs8_der()
			} else if let Ok(key) = p384::SecretKey::from_sec1_der(block.contents()) {
				key.to_pkcs8_der()
			} else {
				return Err(unsupported());
			};
			let doc = doc.map_err(|e| CryptoError::KeyEncode(e.to_string()))?;
			Ok(doc.as_bytes().to_vec())
		}
		_ => Err(unsupported()),
	}
}
