//! Reddit search core for apps that browse on behalf of their users: per-user OAuth token upkeep,
//! canonical TTL response caching, and structured rate-limit errors in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod search;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		flows::Explorer,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::UpstreamDescriptor,
		store::{CredentialStore, MemoryStore},
	};

	/// Explorer type alias used by reqwest-backed integration tests.
	pub type ReqwestTestExplorer = Explorer<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a non-redirecting reqwest client that accepts the self-signed certificates served
	/// by `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a loopback descriptor whose endpoints all point at the provided mock base URL.
	pub fn test_descriptor(base_url: &str) -> UpstreamDescriptor {
		let base = Url::parse(base_url).expect("Mock base URL should parse successfully.");
		let token = base
			.join("/api/v1/access_token")
			.expect("Mock token endpoint should join onto the base URL.");

		UpstreamDescriptor::builder()
			.token_endpoint(token)
			.api_base(base.clone())
			.permalink_origin(base)
			.user_agent("reddit-explorer-tests/1.0")
			.build()
			.expect("Loopback test descriptor should build successfully.")
	}

	/// Constructs an [`Explorer`] backed by an in-memory store and the reqwest transport used
	/// across integration tests.
	pub fn build_reqwest_test_explorer(
		descriptor: UpstreamDescriptor,
		client_id: &str,
		client_secret: &str,
	) -> (ReqwestTestExplorer, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let http_client = test_reqwest_http_client();
		let mapper = Arc::new(ReqwestTransportErrorMapper);
		let explorer = Explorer::with_http_client(store, descriptor, http_client, mapper)
			.with_client_credentials(client_id, client_secret);

		(explorer, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)]
use {color_eyre as _, httpmock as _, tokio as _, tracing_subscriber as _};
