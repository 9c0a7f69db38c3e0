// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for object client operations.
pub type ObjectResult<T> = Result<T, ObjectError>;

/// Errors that can occur while reading or writing secret objects.
#[derive(Error, Debug)]
pub enum ObjectError {
	#[error("secret {namespace}/{name} not found")]
	NotFound { namespace: String, name: String },

	#[error("secret {namespace}/{name} was modified concurrently")]
	Conflict { namespace: String, name: String },

	#[error("K8s API error: {message}")]
	Api {
		message: String,
		#[source]
		source: Option<kube::Error>,
	},

	#[error("failed to load secrets file: {message}")]
	Seed { message: String },
}

impl ObjectError {
	pub fn not_found(namespace: impl Into<String>, name: impl Into<String>) -> Self {
		Self::NotFound {
			namespace: namespace.into(),
			name: name.into(),
		}
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}
}

impl From<kube::Error> for ObjectError {
	fn from(err: kube::Error) -> Self {
		ObjectError::Api {
			message: err.to_string(),
			source: Some(err),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn not_found_display() {
		let err = ObjectError::not_found("default", "gh-app-key");
		assert_eq!(err.to_string(), "secret default/gh-app-key not found");
		assert!(err.is_not_found());
	}

	#[test]
	fn conflict_is_not_not_found() {
		let err = ObjectError::Conflict {
			namespace: "default".to_string(),
			name: "gh-app-key".to_string(),
		};
		assert!(!err.is_not_found());
		assert!(err.to_string().contains("modified concurrently"));
	}
}
