// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! PEM bundle filtering and certificate chain selection.

use std::str::FromStr;

use pem::Pem;
use x509_parser::parse_x509_certificate;

use super::{encode_pem_many, CryptoError, CryptoResult, PEM_TYPE_CERTIFICATE};

/// Position of a certificate within a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertType {
	Leaf,
	Intermediate,
	Root,
}

impl FromStr for CertType {
	type Err = CryptoError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"leaf" => Ok(Self::Leaf),
			"intermediate" => Ok(Self::Intermediate),
			"root" => Ok(Self::Root),
			other => Err(CryptoError::UnknownCertType(other.to_string())),
		}
	}
}

pub(crate) struct ChainCert {
	pub der: Vec<u8>,
	subject: Vec<u8>,
	issuer: Vec<u8>,
}

impl ChainCert {
	fn parse(der: Vec<u8>) -> CryptoResult<Self> {
		let (subject, issuer) = {
			let (_, cert) =
				parse_x509_certificate(&der).map_err(|e| CryptoError::Certificate(e.to_string()))?;
			(
				cert.subject().as_raw().to_vec(),
				cert.issuer().as_raw().to_vec(),
			)
		};
		Ok(Self {
			der,
			subject,
			issuer,
		})
	}

	fn is_self_signed(&self) -> bool {
		self.subject == self.issuer
	}
}

/// Order certificates leaf → root by following issuer links.
///
/// Returns the linked chain and, separately, any certificates that are not
/// part of it (in input order). The leaf is the first certificate that does
/// not issue any other certificate in the set.
pub(crate) fn order_chain(ders: Vec<Vec<u8>>) -> CryptoResult<(Vec<ChainCert>, Vec<ChainCert>)> {
	let mut pool = ders
		.into_iter()
		.map(ChainCert::parse)
		.collect::<CryptoResult<Vec<_>>>()?;
	if pool.is_empty() {
		return Ok((Vec::new(), Vec::new()));
	}

	let leaf_idx = (0..pool.len())
		.find(|&i| {
			!pool
				.iter()
				.enumerate()
				.any(|(j, other)| j != i && other.issuer == pool[i].subject)
		})
		.unwrap_or(0);

	let mut chain = vec![pool.remove(leaf_idx)];
	loop {
		let current = &chain[chain.len() - 1];
		if current.is_self_signed() {
			break;
		}
		match pool.iter().position(|c| c.subject == current.issuer) {
			Some(idx) => chain.push(pool.remove(idx)),
			None => break,
		}
	}
	Ok((chain, pool))
}

/// Keep only the PEM blocks whose type matches `pem_type`
/// (case-insensitive), re-encoded in input order.
pub fn filter_pem(pem_type: &str, input: &str) -> CryptoResult<String> {
	let blocks: Vec<Pem> = pem::parse_many(input)?
		.into_iter()
		.filter(|b| b.tag().eq_ignore_ascii_case(pem_type))
		.collect();
	Ok(encode_pem_many(&blocks))
}

/// Select certificates from a PEM chain by position.
///
/// - `leaf`: the end-entity certificate, if it is not self-signed
/// - `intermediate`: every certificate between leaf and root
/// - `root`: the last certificate of the chain, if it is self-signed
///
/// Selections with no match render as an empty string.
pub fn filter_cert_chain(cert_type: &str, input: &str) -> CryptoResult<String> {
	let cert_type = CertType::from_str(cert_type)?;
	let ders: Vec<Vec<u8>> = pem::parse_many(input)?
		.into_iter()
		.filter(|b| b.tag() == PEM_TYPE_CERTIFICATE)
		.map(|b| b.into_contents())
		.collect();
	let (chain, _) = order_chain(ders)?;

	let selected: Vec<&ChainCert> = match cert_type {
		CertType::Leaf => chain.first().filter(|c| !c.is_self_signed()).into_iter().collect(),
		CertType::Root => chain.last().filter(|c| c.is_self_signed()).into_iter().collect(),
		CertType::Intermediate => chain
			.iter()
			.enumerate()
			.filter(|(i, c)| *i > 0 && !c.is_self_signed())
			.map(|(_, c)| c)
			.collect(),
	};

	let blocks: Vec<Pem> = selected
		.into_iter()
		.map(|c| Pem::new(PEM_TYPE_CERTIFICATE, c.der.clone()))
		.collect();
	Ok(encode_pem_many(&blocks))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::test_support::chain;

	fn contents(pem_text: &str) -> Vec<Vec<u8>> {
		pem::parse_many(pem_text)
			.unwrap()
			.into_iter()
			.map(|b| b.into_contents())
			.collect()
	}

	#[test]
	fn filter_pem_keeps_requested_type() {
		let chain = chain();
		let bundle = format!("{}{}{}", chain.leaf_pem, chain.leaf_key_pem, chain.root_pem);

		let certs = filter_pem("CERTIFICATE", &bundle).unwrap();
		assert_eq!(
			contents(&certs),
			[contents(&chain.leaf_pem), contents(&chain.root_pem)].concat()
		);

		let keys = filter_pem("private key", &bundle).unwrap();
		assert_eq!(contents(&keys), contents(&chain.leaf_key_pem));
	}

	#[test]
	fn filter_pem_without_match_is_empty() {
		let chain = chain();
		assert_eq!(filter_pem("PUBLIC KEY", &chain.leaf_pem).unwrap(), "");
	}

	#[test]
	fn filter_cert_chain_selects_positions() {
		let chain = chain();
		let bundle = format!(
			"{}{}{}",
			chain.intermediate_pem, chain.root_pem, chain.leaf_pem
		);

		let leaf = filter_cert_chain("leaf", &bundle).unwrap();
		assert_eq!(contents(&leaf), contents(&chain.leaf_pem));

		let intermediate = filter_cert_chain("intermediate", &bundle).unwrap();
		assert_eq!(contents(&intermediate), contents(&chain.intermediate_pem));

		let root = filter_cert_chain("root", &bundle).unwrap();
		assert_eq!(contents(&root), contents(&chain.root_pem));
	}

	#[test]
	fn lone_self_signed_cert_is_root_not_leaf() {
		let chain = chain();
		assert_eq!(filter_cert_chain("leaf", &chain.root_pem).unwrap(), "");
		assert_eq!(
			contents(&filter_cert_chain("root", &chain.root_pem).unwrap()),
			contents(&chain.root_pem)
		);
	}

	#[test]
	fn unknown_cert_type_is_rejected() {
		let chain = chain();
		assert!(matches!(
			filter_cert_chain("middle", &chain.leaf_pem),
			Err(CryptoError::UnknownCertType(t)) if t == "middle"
		));
	}

	#[test]
	fn invalid_certificate_is_reported() {
		let input = pem::encode(&Pem::new("CERTIFICATE", vec![1, 2, 3]));
		assert!(matches!(
			filter_cert_chain("leaf", &input),
			Err(CryptoError::Certificate(_))
		));
	}
}
