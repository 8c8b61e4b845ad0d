//! High-level flows: the token refresher and the search orchestrator.

pub mod refresh;
pub mod search;

pub(crate) mod common;

pub use refresh::*;
pub use search::*;

// self
use crate::{
	_prelude::*,
	auth::UserId,
	cache::{self, CacheKey, ResponseCache},
	flows::common::FlowGuards,
	http::UpstreamHttpClient,
	oauth::TransportErrorMapper,
	provider::UpstreamDescriptor,
	store::CredentialStore,
};
#[cfg(feature = "reqwest")]
use crate::{config::ExplorerConfig, http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Explorer specialized for the crate's default reqwest transport stack.
pub type ReqwestExplorer = Explorer<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Searches the upstream on behalf of users, keeping their credentials fresh and shielding
/// the upstream behind a shared response cache.
///
/// The explorer owns the HTTP client, credential store, upstream descriptor, and the
/// application-level client credentials used for refresh-token exchanges. Clones share the
/// cache, metrics, and single-flight guards.
#[derive(Clone)]
pub struct Explorer<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound upstream request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Store holding per-user upstream credentials.
	pub store: Arc<dyn CredentialStore>,
	/// Upstream endpoints and client identification.
	pub descriptor: UpstreamDescriptor,
	/// Application client identifier used to authenticate refresh exchanges.
	pub client_id: Option<String>,
	/// Application client secret used to authenticate refresh exchanges.
	pub client_secret: Option<String>,
	/// Process-wide response cache.
	pub cache: Arc<ResponseCache>,
	/// Lifetime of freshly cached pages.
	pub cache_ttl: Duration,
	/// Shared counters for refresh exchanges.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_guards: FlowGuards<UserId>,
	search_guards: FlowGuards<(UserId, CacheKey), search::SharedOutcome>,
}
impl<C, M> Explorer<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an explorer that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn CredentialStore>,
		descriptor: UpstreamDescriptor,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			descriptor,
			client_id: None,
			client_secret: None,
			cache: Default::default(),
			cache_ttl: cache::DEFAULT_TTL,
			refresh_metrics: Default::default(),
			refresh_guards: Default::default(),
			search_guards: Default::default(),
		}
	}

	/// Sets the application client credentials used for refresh exchanges.
	pub fn with_client_credentials(
		mut self,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		self.client_id = Some(client_id.into());
		self.client_secret = Some(client_secret.into());

		self
	}

	/// Shares an existing response cache (for example across several explorers).
	pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
		self.cache = cache;

		self
	}

	/// Overrides the lifetime of cached pages.
	pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
		self.cache_ttl = ttl;

		self
	}
}
#[cfg(feature = "reqwest")]
impl Explorer<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a new explorer for the provided store and descriptor.
	///
	/// The explorer provisions its own reqwest-backed transport, which does not follow
	/// redirects. Use [`Explorer::with_client_credentials`] to enable token refresh.
	pub fn new(store: Arc<dyn CredentialStore>, descriptor: UpstreamDescriptor) -> Result<Self> {
		Ok(Self::with_http_client(
			store,
			descriptor,
			ReqwestHttpClient::new()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}

	/// Builds an explorer from environment-style configuration.
	pub fn from_config(store: Arc<dyn CredentialStore>, config: &ExplorerConfig) -> Result<Self> {
		let mut explorer = Self::new(store, config.descriptor()?)?;

		if let Some((id, secret)) = config.client_credentials() {
			explorer = explorer.with_client_credentials(id, secret);
		}

		Ok(explorer)
	}
}
impl<C, M> Debug for Explorer<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Explorer")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("cache_entries", &self.cache.len())
			.field("cache_ttl", &self.cache_ttl)
			.finish()
	}
}
