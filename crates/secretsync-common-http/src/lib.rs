// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for secretsync.
//!
//! Every outbound client carries the same User-Agent and an explicit request
//! timeout. Nothing here retries; backoff is owned by the caller.

mod client;

pub use client::{builder, new_client, new_client_with_timeout, user_agent, DEFAULT_TIMEOUT};
