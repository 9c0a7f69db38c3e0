// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Render scopes, targets and the secret projection they write into.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TemplateError;

/// How a template document is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TemplateScope {
	/// Each entry renders to the value stored under its own key.
	Values,
	/// Each entry renders to a YAML map of keys and values.
	KeysAndValues,
}

impl FromStr for TemplateScope {
	type Err = TemplateError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Values" => Ok(Self::Values),
			"KeysAndValues" => Ok(Self::KeysAndValues),
			other => Err(TemplateError::UnknownScope(other.to_string())),
		}
	}
}

impl fmt::Display for TemplateScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Values => write!(f, "Values"),
			Self::KeysAndValues => write!(f, "KeysAndValues"),
		}
	}
}

impl<'de> Deserialize<'de> for TemplateScope {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// Which part of the secret receives rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TemplateTarget {
	Data,
	Annotations,
	Labels,
}

impl FromStr for TemplateTarget {
	type Err = TemplateError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Data" => Ok(Self::Data),
			"Annotations" => Ok(Self::Annotations),
			"Labels" => Ok(Self::Labels),
			other => Err(TemplateError::UnknownTarget(other.to_string())),
		}
	}
}

impl fmt::Display for TemplateTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Data => write!(f, "Data"),
			Self::Annotations => write!(f, "Annotations"),
			Self::Labels => write!(f, "Labels"),
		}
	}
}

impl<'de> Deserialize<'de> for TemplateTarget {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// The parts of a secret that templates can write.
///
/// Each map is created on first write; writing one never touches the
/// others. Last write wins per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretProjection {
	pub data: Option<BTreeMap<String, Vec<u8>>>,
	pub annotations: Option<BTreeMap<String, String>>,
	pub labels: Option<BTreeMap<String, String>>,
}

impl SecretProjection {
	pub fn new() -> Self {
		Self::default()
	}

	/// Write `value` under `key` in the map selected by `target`.
	///
	/// Annotations and labels hold text; bytes that are not UTF-8 are
	/// replaced there. `execute` refuses such output before it gets here.
	pub fn apply(&mut self, target: TemplateTarget, key: impl Into<String>, value: Vec<u8>) {
		let key = key.into();
		match target {
			TemplateTarget::Data => {
				self.data.get_or_insert_with(BTreeMap::new).insert(key, value);
			}
			TemplateTarget::Annotations => {
				self
					.annotations
					.get_or_insert_with(BTreeMap::new)
					.insert(key, String::from_utf8_lossy(&value).into_owned());
			}
			TemplateTarget::Labels => {
				self
					.labels
					.get_or_insert_with(BTreeMap::new)
					.insert(key, String::from_utf8_lossy(&value).into_owned());
			}
		}
	}

	/// Apply every entry of `other` on top of `self`.
	pub fn merge(&mut self, other: SecretProjection) {
		if let Some(data) = other.data {
			self.data.get_or_insert_with(BTreeMap::new).extend(data);
		}
		if let Some(annotations) = other.annotations {
			self
				.annotations
				.get_or_insert_with(BTreeMap::new)
				.extend(annotations);
		}
		if let Some(labels) = other.labels {
			self.labels.get_or_insert_with(BTreeMap::new).extend(labels);
		}
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_none() && self.annotations.is_none() && self.labels.is_none()
	}
}
