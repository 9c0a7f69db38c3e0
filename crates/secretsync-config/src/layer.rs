// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration as produced by a single source.

use serde::{Deserialize, Serialize};

use crate::sections::{GeneratorConfigLayer, LoggingConfigLayer, TemplateConfigLayer};

/// One source's view of the configuration. Unset fields defer to
/// lower-precedence layers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SecretsyncConfigLayer {
	pub template: Option<TemplateConfigLayer>,
	pub generator: Option<GeneratorConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

impl SecretsyncConfigLayer {
	/// Overlay `other` on top of `self`.
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.template, other.template, TemplateConfigLayer::merge);
		merge_section(&mut self.generator, other.generator, GeneratorConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(base), Some(other)) => merge(base, other),
		(None, Some(other)) => *base = Some(other),
		(_, None) => {}
	}
}
