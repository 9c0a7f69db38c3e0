// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Errors raised while rendering secret templates.
#[derive(Debug, Error)]
pub enum TemplateError {
	#[error("unable to parse template at key {key}")]
	Parse {
		key: String,
		#[source]
		source: minijinja::Error,
	},

	#[error("unable to execute template at key {key}")]
	Execute {
		key: String,
		#[source]
		source: minijinja::Error,
	},

	#[error("unable to decode template output at key {key} as a string map")]
	StructuredDecode {
		key: String,
		#[source]
		source: serde_yaml::Error,
	},

	#[error("unknown template scope '{0}': expected 'Values' or 'KeysAndValues'")]
	UnknownScope(String),

	#[error("unknown template target '{0}': expected 'Data', 'Annotations' or 'Labels'")]
	UnknownTarget(String),

	#[error("invalid template delimiters: {0}")]
	Delimiters(String),
}

impl TemplateError {
	/// Classify a minijinja failure for the template stored under `key`.
	pub(crate) fn from_render(key: &str, source: minijinja::Error) -> Self {
		match source.kind() {
			minijinja::ErrorKind::SyntaxError => Self::Parse {
				key: key.to_string(),
				source,
			},
			_ => Self::Execute {
				key: key.to_string(),
				source,
			},
		}
	}

	/// The template key this error relates to, if any.
	pub fn key(&self) -> Option<&str> {
		match self {
			Self::Parse { key, .. }
			| Self::Execute { key, .. }
			| Self::StructuredDecode { key, .. } => Some(key),
			_ => None,
		}
	}
}

pub type TemplateResult<T> = Result<T, TemplateError>;
