// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deadline and cancellation for generator calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{GeneratorError, GeneratorResult};

/// Upper bound a generator imposes when the caller's deadline is later or
/// absent.
pub const DEFAULT_GENERATOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call context: an optional deadline plus a cancellation token.
///
/// Cloning shares the token, so cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct Context {
	deadline: Option<Instant>,
	cancellation_token: CancellationToken,
}

impl Context {
	/// A context with no deadline and a fresh token.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(deadline);
		self
	}

	pub fn with_timeout(self, timeout: Duration) -> Self {
		self.with_deadline(Instant::now() + timeout)
	}

	pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
		self.cancellation_token = token;
		self
	}

	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	pub fn cancellation_token(&self) -> &CancellationToken {
		&self.cancellation_token
	}

	pub fn cancel(&self) {
		self.cancellation_token.cancel();
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancellation_token.is_cancelled()
	}

	/// A child context whose deadline is the earlier of this context's and
	/// `now + limit`. Cancelling the parent cancels the child.
	pub fn bounded(&self, limit: Duration) -> Self {
		let cap = Instant::now() + limit;
		Self {
			deadline: Some(self.deadline.map_or(cap, |d| d.min(cap))),
			cancellation_token: self.cancellation_token.child_token(),
		}
	}

	/// Run `fut` until it completes, the deadline passes or the context is
	/// cancelled, whichever comes first. The losing future is dropped.
	pub async fn run<F, T>(&self, fut: F) -> GeneratorResult<T>
	where
		F: Future<Output = GeneratorResult<T>>,
	{
		if self.is_cancelled() {
			return Err(GeneratorError::Cancelled);
		}
		match self.deadline {
			Some(deadline) => {
				tokio::select! {
					_ = self.cancellation_token.cancelled() => Err(GeneratorError::Cancelled),
					res = tokio::time::timeout_at(deadline, fut) => {
						res.map_err(|_| GeneratorError::DeadlineExceeded)?
					}
				}
			}
			None => {
				tokio::select! {
					_ = self.cancellation_token.cancelled() => Err(GeneratorError::Cancelled),
					res = fut => res,
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn run_passes_through_results() {
		let ctx = Context::new();
		let value = tokio_test::assert_ok!(ctx.run(async { Ok(42) }).await);
		assert_eq!(value, 42);
	}

	#[tokio::test]
	async fn run_reports_deadline() {
		let ctx = Context::new().with_timeout(Duration::from_millis(10));
		let result: GeneratorResult<()> = ctx
			.run(async {
				tokio::time::sleep(Duration::from_secs(5)).await;
				Ok(())
			})
			.await;
		let err = tokio_test::assert_err!(result);
		assert!(matches!(err, GeneratorError::DeadlineExceeded));
	}

	#[tokio::test]
	async fn run_reports_cancellation() {
		let ctx = Context::new();
		let trigger = ctx.clone();
		let result: GeneratorResult<()> = ctx
			.run(async move {
				trigger.cancel();
				std::future::pending::<()>().await;
				Ok(())
			})
			.await;
		assert!(matches!(result, Err(GeneratorError::Cancelled)));
	}

	#[tokio::test]
	async fn already_cancelled_context_never_polls() {
		let ctx = Context::new();
		ctx.cancel();
		let polled = std::sync::atomic::AtomicBool::new(false);
		let result = ctx
			.run(async {
				polled.store(true, std::sync::atomic::Ordering::SeqCst);
				Ok(())
			})
			.await;
		assert!(matches!(result, Err(GeneratorError::Cancelled)));
		assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
	}

	#[tokio::test]
	async fn bounded_keeps_the_earlier_deadline() {
		let short = Context::new().with_timeout(Duration::from_secs(1));
		let bounded = short.bounded(DEFAULT_GENERATOR_TIMEOUT);
		assert_eq!(bounded.deadline(), short.deadline());

		let long = Context::new().with_timeout(Duration::from_secs(600));
		let bounded = long.bounded(DEFAULT_GENERATOR_TIMEOUT);
		assert!(bounded.deadline().unwrap() < long.deadline().unwrap());

		let open = Context::new().bounded(DEFAULT_GENERATOR_TIMEOUT);
		assert!(open.deadline().is_some());
	}

	#[tokio::test]
	async fn cancelling_parent_cancels_bounded_child() {
		let parent = Context::new();
		let child = parent.bounded(DEFAULT_GENERATOR_TIMEOUT);
		parent.cancel();
		assert!(child.is_cancelled());
	}
}
