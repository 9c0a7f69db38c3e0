// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Common configuration primitives for secretsync.
//!
//! [`Secret<T>`] wraps sensitive values (private keys, issued tokens) so
//! they never show up in logs or `Debug` output.

pub mod secret;

pub use secret::{Secret, SecretBytes, SecretString, REDACTED};
