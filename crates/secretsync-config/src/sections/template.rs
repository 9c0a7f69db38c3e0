// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Template renderer configuration section.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_LEFT_DELIMITER: &str = "{{";
pub const DEFAULT_RIGHT_DELIMITER: &str = "}}";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfigLayer {
	pub left_delimiter: Option<String>,
	pub right_delimiter: Option<String>,
}

impl TemplateConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.left_delimiter.is_some() {
			self.left_delimiter = other.left_delimiter;
		}
		if other.right_delimiter.is_some() {
			self.right_delimiter = other.right_delimiter;
		}
	}

	pub fn finalize(self) -> TemplateConfig {
		TemplateConfig {
			left_delimiter: self
				.left_delimiter
				.unwrap_or_else(|| DEFAULT_LEFT_DELIMITER.to_string()),
			right_delimiter: self
				.right_delimiter
				.unwrap_or_else(|| DEFAULT_RIGHT_DELIMITER.to_string()),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateConfig {
	pub left_delimiter: String,
	pub right_delimiter: String,
}

impl Default for TemplateConfig {
	fn default() -> Self {
		TemplateConfigLayer::default().finalize()
	}
}

impl TemplateConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.left_delimiter.is_empty() || self.right_delimiter.is_empty() {
			return Err(ConfigError::Validation(
				"template delimiters must not be empty".to_string(),
			));
		}
		if self.left_delimiter == self.right_delimiter {
			return Err(ConfigError::Validation(format!(
				"template delimiters must differ, both are '{}'",
				self.left_delimiter
			)));
		}
		Ok(())
	}
}
