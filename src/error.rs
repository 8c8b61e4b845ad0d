//! Explorer-level error types shared across flows, stores, and transports.

// self
use crate::_prelude::*;

/// Explorer-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical explorer error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token refresh failure; the refresher logs these and falls back to the stored token.
	#[error(transparent)]
	Refresh(#[from] RefreshError),

	/// The user has no usable upstream credential and must (re)connect their account.
	#[error("Not connected to Reddit.")]
	Unauthorized,
	/// Upstream throttled the request; callers should back off before retrying.
	#[error("Rate limited by Reddit; retry after {retry_after_secs} seconds.")]
	RateLimited {
		/// Seconds to wait before the next attempt.
		retry_after_secs: u64,
	},
	/// Upstream answered with a non-success status other than 429.
	#[error("Reddit error: {status} {body}")]
	Upstream {
		/// HTTP status code returned by the upstream.
		status: u16,
		/// Raw response body text.
		body: String,
	},
	/// Upstream answered successfully but the listing payload could not be decoded.
	#[error("Reddit returned a malformed listing.")]
	Decode {
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// An identical concurrent search failed before producing a response; carries the status
	/// classification and message of that failure.
	#[error("{message}")]
	Coalesced {
		/// Status classification of the original failure.
		status: u16,
		/// Message of the original failure.
		message: String,
	},
}
impl Error {
	/// Status classification relayed to end users by the request layer.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::Unauthorized => 401,
			Self::RateLimited { .. } => 429,
			Self::Upstream { status, .. } | Self::Coalesced { status, .. } => *status,
			Self::Transport(_) | Self::Decode { .. } | Self::Refresh(_) => 502,
			Self::Storage(_) | Self::Config(_) => 500,
		}
	}

	/// Retry hint in seconds, present only for [`Error::RateLimited`].
	pub fn retry_after_secs(&self) -> Option<u64> {
		match self {
			Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
			_ => None,
		}
	}

	/// Serializable summary of the failure for the caller-facing response.
	pub fn report(&self) -> ErrorReport {
		ErrorReport {
			status: self.status_code(),
			message: self.to_string(),
			retry_after: self.retry_after_secs(),
		}
	}
}

/// Wire-ready error payload produced by [`Error::report`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
	/// HTTP status the request layer should answer with.
	pub status: u16,
	/// Human-readable message.
	pub message: String,
	/// Seconds to wait before retrying, for rate-limited failures.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub retry_after: Option<u64>,
}

/// Configuration and validation failures raised by the explorer.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Descriptor validation failed.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::DescriptorError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while exchanging a refresh token.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// No client credentials are configured, so the token endpoint cannot be called.
	#[error("Client credentials are not configured.")]
	MissingClientCredentials,
	/// Token endpoint rejected the exchange or answered unexpectedly.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or explorer-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint returned an empty access token.
	#[error("Token endpoint returned an empty access token.")]
	EmptyAccessToken,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Which upstream endpoint was being called.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request did not complete before the transport's deadline.
	#[error("Request timed out while calling {endpoint}.")]
	Timeout {
		/// Which upstream endpoint was being called.
		endpoint: &'static str,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// HTTP client failure that carries only a message.
	#[error("HTTP client error occurred while calling {endpoint}: {message}.")]
	Other {
		/// Which upstream endpoint was being called.
		endpoint: &'static str,
		/// Transport-supplied message.
		message: String,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the upstream.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}
