//! Builder and default endpoints for [`UpstreamDescriptor`].

// self
use crate::{_prelude::*, provider::UpstreamDescriptor};

/// Reddit's token endpoint for confidential clients.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://www.reddit.com/api/v1/access_token";
/// Reddit's authenticated API host.
pub const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";
/// Origin used for public post permalinks.
pub const DEFAULT_PERMALINK_ORIGIN: &str = "https://reddit.com";
/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "RedditExplorer/1.0 (by u/yourusername)";

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum DescriptorError {
	/// A built-in endpoint constant failed to parse.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidUrl {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// API base URL cannot carry path segments.
	#[error("API base URL `{url}` cannot be used as a base.")]
	CannotBeABase {
		/// Offending URL.
		url: String,
	},
	/// The user agent is empty.
	#[error("User agent cannot be empty.")]
	EmptyUserAgent,
	/// The user agent contains bytes that are not allowed in HTTP headers.
	#[error("User agent contains characters that are not allowed in HTTP headers.")]
	InvalidUserAgent,
}

/// Builder for [`UpstreamDescriptor`] values.
#[derive(Debug, Default)]
pub struct UpstreamDescriptorBuilder {
	/// Token endpoint override.
	pub token_endpoint: Option<Url>,
	/// API base override.
	pub api_base: Option<Url>,
	/// Permalink origin override.
	pub permalink_origin: Option<Url>,
	/// User agent override.
	pub user_agent: Option<String>,
}
impl UpstreamDescriptorBuilder {
	/// Creates a builder that falls back to the public Reddit endpoints.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the API base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Sets the origin prepended to post permalinks.
	pub fn permalink_origin(mut self, url: Url) -> Self {
		self.permalink_origin = Some(url);

		self
	}

	/// Sets the client-identifying user agent.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<UpstreamDescriptor, DescriptorError> {
		let descriptor = UpstreamDescriptor {
			token_endpoint: or_default("token", self.token_endpoint, DEFAULT_TOKEN_ENDPOINT)?,
			api_base: or_default("api", self.api_base, DEFAULT_API_BASE)?,
			permalink_origin: or_default(
				"permalink",
				self.permalink_origin,
				DEFAULT_PERMALINK_ORIGIN,
			)?,
			user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.into()),
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl UpstreamDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), DescriptorError> {
		validate_endpoint("token", &self.token_endpoint)?;
		validate_endpoint("api", &self.api_base)?;

		if self.api_base.cannot_be_a_base() {
			return Err(DescriptorError::CannotBeABase { url: self.api_base.to_string() });
		}
		if self.user_agent.trim().is_empty() {
			return Err(DescriptorError::EmptyUserAgent);
		}
		if self.user_agent.bytes().any(|byte| byte.is_ascii_control()) {
			return Err(DescriptorError::InvalidUserAgent);
		}

		Ok(())
	}
}

fn or_default(
	endpoint: &'static str,
	value: Option<Url>,
	default: &str,
) -> Result<Url, DescriptorError> {
	match value {
		Some(url) => Ok(url),
		None =>
			Url::parse(default).map_err(|source| DescriptorError::InvalidUrl { endpoint, source }),
	}
}

fn validate_endpoint(endpoint: &'static str, url: &Url) -> Result<(), DescriptorError> {
	if url.scheme() == "https" || is_loopback(url) {
		Ok(())
	} else {
		Err(DescriptorError::InsecureEndpoint { endpoint, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain == "localhost",
		Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
		Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL.")
	}

	#[test]
	fn defaults_point_at_reddit() {
		let descriptor = UpstreamDescriptor::builder().build().expect("Defaults should build.");

		assert_eq!(descriptor.token_endpoint.as_str(), DEFAULT_TOKEN_ENDPOINT);
		assert_eq!(descriptor.api_base.as_str(), "https://oauth.reddit.com/");
		assert_eq!(descriptor.user_agent, DEFAULT_USER_AGENT);
	}

	#[test]
	fn rejects_plain_http_for_remote_hosts() {
		let err = UpstreamDescriptor::builder()
			.api_base(url("http://oauth.reddit.com"))
			.build()
			.expect_err("Plain HTTP must be rejected for remote hosts.");

		assert!(matches!(err, DescriptorError::InsecureEndpoint { endpoint: "api", .. }));
	}

	#[test]
	fn allows_plain_http_for_loopback_hosts() {
		UpstreamDescriptor::builder()
			.token_endpoint(url("http://127.0.0.1:8080/api/v1/access_token"))
			.api_base(url("http://localhost:8080"))
			.build()
			.expect("Loopback endpoints should be accepted.");
	}

	#[test]
	fn rejects_blank_or_control_user_agents() {
		let err = UpstreamDescriptor::builder()
			.user_agent("  ")
			.build()
			.expect_err("Blank user agents must be rejected.");

		assert_eq!(err, DescriptorError::EmptyUserAgent);

		let err = UpstreamDescriptor::builder()
			.user_agent("bad\nagent")
			.build()
			.expect_err("Control characters must be rejected.");

		assert_eq!(err, DescriptorError::InvalidUserAgent);
	}
}
