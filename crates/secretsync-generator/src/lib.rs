// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Credential generators for secretsync.
//!
//! A [`Generator`] turns a provider-specific spec into a set of credential
//! fields. Generators are looked up by [`GeneratorKind`] in a
//! [`GeneratorRegistry`] that is assembled once at startup:
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use secretsync_generator::{Context, GeneratorKind, GeneratorRegistry, GithubGeneratorConfig};
//! use secretsync_kube::InMemoryObjectClient;
//!
//! let registry = GeneratorRegistry::with_defaults(GithubGeneratorConfig::default())?;
//! let client = InMemoryObjectClient::new();
//! let spec = std::fs::read("github.yaml")?;
//! let generated = registry
//! 	.generate(GeneratorKind::GithubAccessToken, &Context::new(), Some(&spec), &client, "ci")
//! 	.await?;
//! assert!(generated.fields.contains_key("token"));
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod generator;
pub mod github;
mod registry;

pub use context::{Context, DEFAULT_GENERATOR_TIMEOUT};
pub use error::{GeneratorError, GeneratorResult, RegistryError};
pub use generator::{Generated, Generator, ProviderState};
pub use github::{GithubAccessTokenGenerator, GithubAccessTokenSpec, GithubGeneratorConfig};
pub use registry::{GeneratorKind, GeneratorRegistry, RegistryBuilder, UnknownKind};
