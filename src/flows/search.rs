//! Search orchestrator: cache lookup, token upkeep, upstream fetch, normalization.

// crates.io
use oauth2::{
	AsyncHttpClient,
	http::{
		Method, StatusCode,
		header::{ACCEPT, AUTHORIZATION},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, UserId},
	error::ConfigError,
	flows::Explorer,
	http::{self, IdentifiedHandle, ResponseMetadataSlot, UpstreamHttpClient},
	oauth::TransportErrorMapper,
	obs::{self, FlowEvent, FlowKind, FlowOutcome, FlowSpan},
	search::{Listing, SearchPage, SearchParams, SearchResult},
};

/// Retry hint used when a rate-limited response carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Outcome a search leaves for identical searches queued behind it.
pub(crate) type SharedOutcome = std::result::Result<SearchPage, SharedFailure>;

/// Cloneable form of a search failure, replayed to queued identical searches.
#[derive(Clone, Debug)]
pub(crate) enum SharedFailure {
	Unauthorized,
	RateLimited { retry_after_secs: u64 },
	Upstream { status: u16, body: String },
	Other { status: u16, message: String },
}
impl From<&Error> for SharedFailure {
	fn from(err: &Error) -> Self {
		match err {
			Error::Unauthorized => Self::Unauthorized,
			Error::RateLimited { retry_after_secs } =>
				Self::RateLimited { retry_after_secs: *retry_after_secs },
			Error::Upstream { status, body } =>
				Self::Upstream { status: *status, body: body.clone() },
			other => Self::Other { status: other.status_code(), message: other.to_string() },
		}
	}
}
impl From<SharedFailure> for Error {
	fn from(failure: SharedFailure) -> Self {
		match failure {
			SharedFailure::Unauthorized => Self::Unauthorized,
			SharedFailure::RateLimited { retry_after_secs } =>
				Self::RateLimited { retry_after_secs },
			SharedFailure::Upstream { status, body } => Self::Upstream { status, body },
			SharedFailure::Other { status, message } => Self::Coalesced { status, message },
		}
	}
}

impl<C, M> Explorer<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Searches the requested channels on behalf of `user`.
	///
	/// Fresh cache entries are returned with `cached = true` without touching the credential
	/// store or the network. On a miss the user's token is refreshed when needed, the upstream
	/// is queried, and a successful page is cached under the canonical key before being
	/// returned with `cached = false`. Concurrent identical searches by the same user share one
	/// upstream call: callers queued behind it receive its page (with `cached = true`) or its
	/// error.
	///
	/// # Errors
	///
	/// - [`Error::Unauthorized`] when the user has no usable credential.
	/// - [`Error::RateLimited`] when the upstream answers 429; nothing is cached.
	/// - [`Error::Upstream`] for any other non-success status; nothing is cached.
	/// - [`Error::Coalesced`] when an identical search this call waited on failed with a
	///   transport, decoding, or storage error.
	pub async fn search(&self, user: &UserId, params: &SearchParams) -> Result<SearchResult> {
		const KIND: FlowKind = FlowKind::Search;

		let span = FlowSpan::new(KIND, "search");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.search_inner(user, params)).await;

		match &result {
			Ok(result) if result.cached => obs::record_flow_outcome(KIND, FlowOutcome::CacheHit),
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn search_inner(&self, user: &UserId, params: &SearchParams) -> Result<SearchResult> {
		let key = params.cache_key();

		if let Some(page) = self.cache.get(&key) {
			FlowEvent::CacheHit { fingerprint: &key.fingerprint() }.emit();

			return Ok(SearchResult::from_cache(page));
		}

		let mut flight = self.search_guards.acquire(&(user.clone(), key.clone())).await;

		// An identical search finished while this one waited.
		if let Some(outcome) = flight.settled() {
			FlowEvent::Coalesced { fingerprint: &key.fingerprint() }.emit();

			return outcome.clone().map(SearchResult::from_cache).map_err(Error::from);
		}
		// Another user's search may have filled the entry.
		if let Some(page) = self.cache.peek(&key) {
			FlowEvent::CacheHit { fingerprint: &key.fingerprint() }.emit();

			return Ok(SearchResult::from_cache(page));
		}

		match self.fetch_fresh(user, params).await {
			Ok(page) => {
				self.cache.put(key, page.clone(), self.cache_ttl);
				flight.settle(Ok(page.clone()));

				Ok(SearchResult::fresh(page))
			},
			Err(err) => {
				flight.settle(Err(SharedFailure::from(&err)));

				Err(err)
			},
		}
	}

	async fn fetch_fresh(&self, user: &UserId, params: &SearchParams) -> Result<SearchPage> {
		let token = self.ensure_valid_token(user).await?.ok_or(Error::Unauthorized)?;

		self.fetch_page(params, &token).await
	}

	async fn fetch_page(&self, params: &SearchParams, token: &TokenSecret) -> Result<SearchPage> {
		let url = self.descriptor.search_url(params)?;
		let request = oauth2::http::Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(AUTHORIZATION, format!("Bearer {}", token.expose()))
			.header(ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(ConfigError::from)?;
		let meta = ResponseMetadataSlot::default();
		let handle = IdentifiedHandle::new(
			self.http_client.with_metadata(meta.clone()),
			self.descriptor.user_agent_header()?,
		);
		let response = handle.call(request).await.map_err(|err| {
			self.transport_mapper.map_transport_error(FlowKind::Search, meta.take().as_ref(), err)
		})?;
		let status = response.status();

		obs::record_upstream_status(FlowKind::Search, status.as_u16());

		if status == StatusCode::TOO_MANY_REQUESTS {
			let retry_after_secs = http::parse_retry_after(response.headers())
				.and_then(|delay| u64::try_from(delay.whole_seconds()).ok())
				.unwrap_or(DEFAULT_RETRY_AFTER_SECS);

			FlowEvent::RateLimited { retry_after_secs }.emit();

			return Err(Error::RateLimited { retry_after_secs });
		}
		if !status.is_success() {
			FlowEvent::UpstreamFailure { status: status.as_u16() }.emit();

			return Err(Error::Upstream {
				status: status.as_u16(),
				body: String::from_utf8_lossy(response.body()).into_owned(),
			});
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());
		let listing: Listing = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::Decode { status: status.as_u16(), source })?;

		Ok(listing.into_page(&self.descriptor))
	}
}
