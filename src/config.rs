//! Environment-driven configuration for building an explorer.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::{DEFAULT_USER_AGENT, UpstreamDescriptor},
};

/// Environment variable holding the application client identifier.
pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
/// Environment variable holding the application client secret.
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
/// Environment variable holding the client-identifying user agent.
pub const ENV_USER_AGENT: &str = "REDDIT_USER_AGENT";

/// Application-level settings shared by every user of the explorer.
///
/// Empty values are treated as absent. Without both client credentials the explorer still
/// serves searches with stored tokens but never contacts the token endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
	/// Application client identifier.
	#[serde(default)]
	pub client_id: Option<String>,
	/// Application client secret.
	#[serde(default)]
	pub client_secret: Option<String>,
	/// Client-identifying label sent as the `User-Agent`.
	pub user_agent: String,
}
impl ExplorerConfig {
	/// Reads the configuration from the process environment.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through an arbitrary key lookup.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let read = |key: &str| {
			lookup(key).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
		};

		Self {
			client_id: read(ENV_CLIENT_ID),
			client_secret: read(ENV_CLIENT_SECRET),
			user_agent: read(ENV_USER_AGENT).unwrap_or_else(|| DEFAULT_USER_AGENT.into()),
		}
	}

	/// Returns the client identifier and secret when both are configured.
	pub fn client_credentials(&self) -> Option<(&str, &str)> {
		Some((self.client_id.as_deref()?, self.client_secret.as_deref()?))
	}

	/// Builds the public Reddit descriptor carrying the configured user agent.
	pub fn descriptor(&self) -> Result<UpstreamDescriptor, ConfigError> {
		Ok(UpstreamDescriptor::builder().user_agent(self.user_agent.as_str()).build()?)
	}
}
impl Default for ExplorerConfig {
	fn default() -> Self {
		Self { client_id: None, client_secret: None, user_agent: DEFAULT_USER_AGENT.into() }
	}
}
impl Debug for ExplorerConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExplorerConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
			.field("user_agent", &self.user_agent)
			.finish()
	}
}
