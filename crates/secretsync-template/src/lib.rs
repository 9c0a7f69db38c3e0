// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Secret templating for secretsync.
//!
//! Templates are rendered with minijinja against a string-keyed view of
//! secret data and written into a [`SecretProjection`] (data, annotations
//! or labels). The function table in [`functions`] adds PEM, PKCS#12 and
//! JWK converters alongside an allow-listed set of string helpers.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use secretsync_template::{execute, SecretProjection, TemplateScope, TemplateTarget};
//!
//! let templates = BTreeMap::from([("greeting".to_string(), b"hello {{ .user }}".to_vec())]);
//! let data = BTreeMap::from([("user".to_string(), b"alice".to_vec())]);
//! let mut projection = SecretProjection::new();
//!
//! execute(Some(&templates), &data, TemplateScope::Values, TemplateTarget::Data, &mut projection)?;
//! assert_eq!(projection.data.unwrap()["greeting"], b"hello alice");
//! # Ok::<(), secretsync_template::TemplateError>(())
//! ```

pub mod crypto;
mod error;
pub mod functions;
mod output;
mod projection;
mod renderer;
mod syntax;

pub use crypto::{CryptoError, CryptoResult};
pub use error::{TemplateError, TemplateResult};
pub use projection::{SecretProjection, TemplateScope, TemplateTarget};
pub use output::{MAX_RENDERED_LEN, MAX_VALUE_LEN};
pub use renderer::{execute, Renderer, TEMPLATE_FUEL};
pub use syntax::{Delimiters, DEFAULT_LEFT_DELIMITER, DEFAULT_RIGHT_DELIMITER};
