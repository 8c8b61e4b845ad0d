//! Counters published through the `metrics` facade; every function is a no-op without the
//! `metrics` feature.

// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counter of flow outcomes, labeled by `flow` and `outcome`.
pub const FLOW_COUNTER: &str = "reddit_explorer_flow_total";
/// Counter of upstream responses, labeled by `flow` and `status_class`.
pub const UPSTREAM_RESPONSE_COUNTER: &str = "reddit_explorer_upstream_responses_total";

/// Counts one outcome of an explorer flow.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_COUNTER, "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Counts one upstream response by status class, keeping throttling apart from other 4xx.
pub fn record_upstream_status(kind: FlowKind, status: u16) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		UPSTREAM_RESPONSE_COUNTER,
		"flow" => kind.as_str(),
		"status_class" => status_class(status)
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, status);
}

/// Low-cardinality label for an HTTP status.
pub fn status_class(status: u16) -> &'static str {
	match status {
		429 => "throttled",
		200..=299 => "2xx",
		300..=399 => "3xx",
		400..=499 => "4xx",
		500..=599 => "5xx",
		_ => "other",
	}
}
