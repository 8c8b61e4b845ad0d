//! Tracing spans and structured events for explorer flows.

// self
use crate::{_prelude::*, auth::UserId, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by explorer flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("reddit_explorer.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Notable moments inside a flow, emitted as structured events when tracing is enabled.
///
/// Events never carry secrets; cache keys are identified by fingerprint only.
pub enum FlowEvent<'a> {
	/// A search was answered from the response cache.
	CacheHit {
		/// Fingerprint of the canonical cache key.
		fingerprint: &'a str,
	},
	/// A search reused the outcome of an identical search that finished while it waited.
	Coalesced {
		/// Fingerprint of the canonical cache key.
		fingerprint: &'a str,
	},
	/// A refreshed credential was persisted.
	CredentialRefreshed {
		/// Owning user.
		user: &'a UserId,
		/// New expiry instant.
		expires_at: Option<OffsetDateTime>,
	},
	/// Refresh was impossible or failed; the stored access token is reused.
	RefreshFallback {
		/// Owning user.
		user: &'a UserId,
		/// Why the refresh did not happen.
		reason: &'a dyn Display,
	},
	/// The upstream throttled the search.
	RateLimited {
		/// Seconds the caller should wait.
		retry_after_secs: u64,
	},
	/// The upstream answered with a non-success status.
	UpstreamFailure {
		/// HTTP status code.
		status: u16,
	},
}
impl FlowEvent<'_> {
	/// Emits the event at its natural level.
	pub fn emit(&self) {
		#[cfg(feature = "tracing")]
		{
			match self {
				Self::CacheHit { fingerprint } => {
					tracing::debug!(cache_key = %fingerprint, "Serving search page from cache.");
				},
				Self::Coalesced { fingerprint } => {
					tracing::debug!(
						cache_key = %fingerprint,
						"Reusing the outcome of an identical in-flight search."
					);
				},
				Self::CredentialRefreshed { user, expires_at } => {
					tracing::info!(%user, ?expires_at, "Refreshed upstream credential.");
				},
				Self::RefreshFallback { user, reason } => {
					tracing::warn!(
						%user,
						%reason,
						"Token refresh skipped; reusing stored access token."
					);
				},
				Self::RateLimited { retry_after_secs } => {
					tracing::warn!(retry_after_secs, "Upstream rate limited the search.");
				},
				Self::UpstreamFailure { status } => {
					tracing::warn!(status, "Upstream search returned a non-success status.");
				},
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;
		}
	}
}
