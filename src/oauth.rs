//! Refresh-token exchange facade and transport error mapping.

pub use oauth2;

// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RefreshToken,
	RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
	http::HeaderValue,
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, RefreshError, TransportError},
	http::{IdentifiedHandle, ResponseMetadata, ResponseMetadataSlot, UpstreamHttpClient},
	obs::FlowKind,
	provider::UpstreamDescriptor,
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Token lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::seconds(3600);

/// Maps HTTP transport failures into explorer [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into an explorer error.
	fn map_transport_error(
		&self,
		flow: FlowKind,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		flow: FlowKind,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(flow, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) =>
				TransportError::Other { endpoint: flow.endpoint(), message }.into(),
			_ => TransportError::Other {
				endpoint: flow.endpoint(),
				message: "unrecognized transport failure".into(),
			}
			.into(),
		}
	}
}

/// Token fields issued by a successful refresh exchange.
#[derive(Clone, Debug)]
pub(crate) struct RefreshGrant {
	pub(crate) access_token: TokenSecret,
	/// Present only when the upstream rotated the refresh token.
	pub(crate) refresh_token: Option<TokenSecret>,
	pub(crate) lifetime: Duration,
}

pub(crate) trait OAuth2Facade {
	fn refresh_token<'a, 'refresh>(
		&'a self,
		refresh_token: &'refresh TokenSecret,
	) -> FacadeFuture<'a, RefreshGrant>
	where
		'refresh: 'a;
}

pub(crate) struct BasicFacade<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	user_agent: HeaderValue,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds a facade authenticating with HTTP Basic client credentials.
	pub(crate) fn from_descriptor(
		descriptor: &UpstreamDescriptor,
		client_id: &str,
		client_secret: &str,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(descriptor.token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_token_uri(token_url);

		Ok(Self {
			oauth_client,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
			user_agent: descriptor.user_agent_header()?,
		})
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn refresh_token<'a, 'refresh>(
		&'a self,
		refresh_token: &'refresh TokenSecret,
	) -> FacadeFuture<'a, RefreshGrant>
	where
		'refresh: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = IdentifiedHandle::new(
				self.http_client.with_metadata(meta.clone()),
				self.user_agent.clone(),
			);
			let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
			let response = self
				.oauth_client
				.exchange_refresh_token(&refresh_secret)
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

			map_refresh_token_response(response)
		})
	}
}

fn map_refresh_token_response(response: FacadeTokenResponse) -> Result<RefreshGrant> {
	let access_token = response.access_token().secret();

	if access_token.is_empty() {
		return Err(RefreshError::EmptyAccessToken.into());
	}

	// A zero lifetime is treated like a missing one.
	let lifetime = response
		.expires_in()
		.filter(|lifetime| !lifetime.is_zero())
		.map(|lifetime| {
			Duration::seconds(i64::from(u32::try_from(lifetime.as_secs()).unwrap_or(u32::MAX)))
		})
		.unwrap_or(DEFAULT_TOKEN_LIFETIME);
	let refresh_token = response
		.refresh_token()
		.map(|token| token.secret())
		.filter(|secret| !secret.is_empty())
		.map(TokenSecret::new);

	Ok(RefreshGrant { access_token: TokenSecret::new(access_token), refresh_token, lifetime })
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(response, meta_ref),
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(FlowKind::TokenRefresh, meta_ref, error),
		RequestTokenError::Parse(error, _body) =>
			RefreshError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
				.into(),
		RequestTokenError::Other(message) =>
			RefreshError::TokenEndpoint { message, status: meta_status(meta_ref) }.into(),
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let message = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	};

	RefreshError::TokenEndpoint { message, status: meta_status(meta) }.into()
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(flow: FlowKind, meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout {
			endpoint: flow.endpoint(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
		}
		.into();
	}

	TransportError::network(flow.endpoint(), err).into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}
