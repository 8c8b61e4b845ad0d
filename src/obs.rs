//! Optional observability helpers for explorer flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `reddit_explorer.flow` with the `flow` and
//!   `stage` fields, plus events for cache hits, refresh fallbacks, and upstream failures.
//! - Enable `metrics` to increment the `reddit_explorer_flow_total` counter for every
//!   attempt/cache hit/success/fallback/failure, labeled by `flow` + `outcome`.
//!   `reddit_explorer_upstream_responses_total` counts upstream responses by `status_class`.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the explorer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Refresh-token exchange against the token endpoint.
	TokenRefresh,
	/// Search listing fetch.
	Search,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::TokenRefresh => "token_refresh",
			FlowKind::Search => "search",
		}
	}

	/// Human-readable name of the upstream endpoint the flow talks to.
	pub const fn endpoint(self) -> &'static str {
		match self {
			FlowKind::TokenRefresh => "token endpoint",
			FlowKind::Search => "search endpoint",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an explorer helper.
	Attempt,
	/// Answered from the response cache.
	CacheHit,
	/// Successful completion.
	Success,
	/// Degraded completion (stale token reused after a failed refresh).
	Fallback,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::CacheHit => "cache_hit",
			FlowOutcome::Success => "success",
			FlowOutcome::Fallback => "fallback",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
