//! Upstream descriptor: where the token and search endpoints live and how the explorer
//! identifies itself to them.

pub mod builder;

pub use builder::*;

// crates.io
use oauth2::http::HeaderValue;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	search::{SearchParams, SortMode},
};

/// Immutable description of the upstream service consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamDescriptor {
	/// Token endpoint used for refresh-token exchanges.
	pub token_endpoint: Url,
	/// Base URL of the authenticated API that serves search listings.
	pub api_base: Url,
	/// Origin prepended to post permalinks when building canonical URLs.
	pub permalink_origin: Url,
	/// Client-identifying label sent as the `User-Agent` on every request.
	pub user_agent: String,
}
impl UpstreamDescriptor {
	/// Maximum number of posts requested per search page.
	pub const PAGE_SIZE: u8 = 25;

	/// Creates a builder seeded with the public Reddit endpoints.
	pub fn builder() -> UpstreamDescriptorBuilder {
		UpstreamDescriptorBuilder::new()
	}

	/// Builds the upstream search URL for the provided parameters.
	///
	/// Channels are joined with `+` into a single multi-channel path segment. `q` is only
	/// sent for non-empty queries and `t` only accompanies the `top` sort.
	pub fn search_url(&self, params: &SearchParams) -> Result<Url> {
		let mut url = self.api_base.clone();
		let multi = params.channels.joined();

		url.path_segments_mut()
			.map_err(|_| {
				ConfigError::from(DescriptorError::CannotBeABase {
					url: self.api_base.to_string(),
				})
			})?
			.pop_if_empty()
			.extend(["r", multi.as_str(), "search"]);

		{
			let mut query = url.query_pairs_mut();

			if let Some(q) = params.query() {
				query.append_pair("q", q);
			}

			query.append_pair("sort", params.sort.as_str());

			if params.sort == SortMode::Top {
				query.append_pair("t", params.time.as_str());
			}

			query.append_pair("restrict_sr", "true");
			query.append_pair("limit", &Self::PAGE_SIZE.to_string());

			if let Some(after) = params.after() {
				query.append_pair("after", after);
			}
		}

		Ok(url)
	}

	/// Canonical URL for a post permalink (`/r/<channel>/comments/...`).
	pub fn permalink_url(&self, permalink: &str) -> String {
		format!("{}{permalink}", self.permalink_origin.as_str().trim_end_matches('/'))
	}

	/// The user agent as a header value.
	pub fn user_agent_header(&self) -> Result<HeaderValue, ConfigError> {
		HeaderValue::from_str(&self.user_agent)
			.map_err(|_| DescriptorError::InvalidUserAgent.into())
	}
}
