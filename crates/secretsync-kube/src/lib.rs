// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Object client abstraction for secretsync.
//!
//! Generators never talk to the Kubernetes API directly. They receive an
//! [`ObjectClient`] and read key material through it, which keeps them
//! testable against [`InMemoryObjectClient`].

mod client;
mod error;
mod kube_client;
mod memory;

pub use client::{ObjectClient, SecretObject};
pub use error::{ObjectError, ObjectResult};
pub use kube_client::KubeObjectClient;
pub use memory::InMemoryObjectClient;
