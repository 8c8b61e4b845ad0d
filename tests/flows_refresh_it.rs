#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use reddit_explorer::{
	auth::{CredentialId, CredentialRecord, UserId},
	flows::{Explorer, ReqwestExplorer},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::UpstreamDescriptor,
	reqwest::{Client, redirect::Policy},
	store::{CredentialStore, MemoryStore},
	url::Url,
};

const CLIENT_ID: &str = "client-id";
const CLIENT_SECRET: &str = "client-secret";
// base64("client-id:client-secret")
const BASIC_AUTH: &str = "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=";
const TOKEN_PATH: &str = "/api/v1/access_token";

// httpmock serves its https endpoints with a self-signed certificate.
fn mock_http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(Policy::none())
		.build()
		.expect("Lenient reqwest client should build for tests.");

	ReqwestHttpClient::with_client(client)
}

fn build_descriptor(server: &MockServer) -> UpstreamDescriptor {
	let base = Url::parse(&server.url("/")).expect("Mock base URL should parse successfully.");

	UpstreamDescriptor::builder()
		.token_endpoint(
			Url::parse(&server.url(TOKEN_PATH))
				.expect("Mock token endpoint should parse successfully."),
		)
		.api_base(base.clone())
		.permalink_origin(base)
		.user_agent("reddit-explorer-refresh-tests/1.0")
		.build()
		.expect("Loopback descriptor should build successfully.")
}

fn build_explorer(server: &MockServer) -> (ReqwestExplorer, Arc<MemoryStore>) {
	let backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn CredentialStore> = backend.clone();
	let http_client = mock_http_client();
	let explorer = Explorer::with_http_client(
		store,
		build_descriptor(server),
		http_client,
		Arc::new(ReqwestTransportErrorMapper),
	);

	(explorer, backend)
}

fn user() -> UserId {
	UserId::new("user-refresh").expect("User identifier should be valid for refresh tests.")
}

async fn seed(store: &MemoryStore, access: &str, refresh: Option<&str>, expires_in: Duration) {
	let mut builder = CredentialRecord::builder(
		CredentialId::new("cred-refresh")
			.expect("Credential identifier should be valid for refresh tests."),
		user(),
	)
	.access_token(access)
	.expires_in(expires_in);

	if let Some(value) = refresh {
		builder = builder.refresh_token(value);
	}

	let record = builder.build().expect("Credential record fixture should build successfully.");

	store.save(record).await.expect("Failed to seed credential into the store.");
}

async fn stored(store: &MemoryStore) -> CredentialRecord {
	store
		.find_credential(&user())
		.await
		.expect("Lookup should succeed.")
		.expect("Seeded credential should still exist.")
}

#[tokio::test]
async fn valid_token_is_returned_without_calling_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let (explorer, store) = build_explorer(&server);
	let explorer = explorer.with_client_credentials(CLIENT_ID, CLIENT_SECRET);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(500);
		})
		.await;

	seed(&store, "still-valid", Some("refresh"), Duration::minutes(10)).await;

	let token = explorer
		.ensure_valid_token(&user())
		.await
		.expect("Token lookup should succeed.")
		.expect("A token should be returned.");

	assert_eq!(token.expose(), "still-valid");
	mock.assert_calls_async(0).await;
	assert_eq!(explorer.refresh_metrics.attempts(), 0);
}

#[tokio::test]
async fn token_inside_safety_margin_is_refreshed_and_persisted() {
	let server = MockServer::start_async().await;
	let (explorer, store) = build_explorer(&server);
	let explorer = explorer.with_client_credentials(CLIENT_ID, CLIENT_SECRET);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.header("authorization", BASIC_AUTH)
				.header("user-agent", "reddit-explorer-refresh-tests/1.0")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "refresh-old");
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"access-new","token_type":"bearer","expires_in":3600}"#,
			);
		})
		.await;

	seed(&store, "access-old", Some("refresh-old"), Duration::seconds(10)).await;

	let before = OffsetDateTime::now_utc();
	let token = explorer
		.ensure_valid_token(&user())
		.await
		.expect("Refresh should succeed.")
		.expect("A token should be returned.");

	mock.assert_async().await;
	assert_eq!(token.expose(), "access-new");

	let record = stored(&store).await;
	let expires_at = record.expires_at.expect("Refreshed credential should carry an expiry.");

	assert_eq!(record.access_token.expose(), "access-new");
	assert_eq!(record.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-old"));
	assert!(expires_at >= before + Duration::seconds(3599));
	assert!(expires_at <= OffsetDateTime::now_utc() + Duration::seconds(3600));
	assert_eq!(explorer.refresh_metrics.attempts(), 1);
	assert_eq!(explorer.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn rotated_refresh_token_replaces_the_old_one() {
	let server = MockServer::start_async().await;
	let (explorer, store) = build_explorer(&server);
	let explorer = explorer.with_client_credentials(CLIENT_ID, CLIENT_SECRET);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"access-new","token_type":"bearer","refresh_token":"rt-new"}"#,
			);
		})
		.await;

	seed(&store, "access-old", Some("refresh-old"), Duration::seconds(-60)).await;

	let before = OffsetDateTime::now_utc();
	let token = explorer
		.ensure_valid_token(&user())
		.await
		.expect("Refresh should succeed.")
		.expect("A token should be returned.");

	mock.assert_async().await;
	assert_eq!(token.expose(), "access-new");

	let record = stored(&store).await;
	let expires_at = record.expires_at.expect("Refreshed credential should carry an expiry.");

	assert_eq!(record.refresh_token.as_ref().map(|secret| secret.expose()), Some("rt-new"));
	// Missing `expires_in` falls back to a one-hour lifetime.
	assert!(expires_at >= before + Duration::seconds(3599));
}

#[tokio::test]
async fn rejected_refresh_falls_back_to_the_stored_token() {
	let server = MockServer::start_async().await;
	let (explorer, store) = build_explorer(&server);
	let explorer = explorer.with_client_credentials(CLIENT_ID, CLIENT_SECRET);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_grant"}"#);
		})
		.await;

	seed(&store, "access-old", Some("refresh-old"), Duration::seconds(5)).await;

	let token = explorer
		.ensure_valid_token(&user())
		.await
		.expect("Refresh failures should not surface.")
		.expect("The stored token should be returned.");

	mock.assert_async().await;
	assert_eq!(token.expose(), "access-old");

	let record = stored(&store).await;

	assert_eq!(record.access_token.expose(), "access-old");
	assert_eq!(record.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-old"));
	assert_eq!(explorer.refresh_metrics.failures(), 1);
	assert_eq!(explorer.refresh_metrics.fallbacks(), 1);
}

#[tokio::test]
async fn missing_client_credentials_skip_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let (explorer, store) = build_explorer(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200);
		})
		.await;

	seed(&store, "access-old", Some("refresh-old"), Duration::seconds(-5)).await;

	let token = explorer
		.ensure_valid_token(&user())
		.await
		.expect("Missing client credentials should not surface.")
		.expect("The stored token should be returned.");

	assert_eq!(token.expose(), "access-old");
	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn expired_token_without_refresh_token_is_returned_as_is() {
	let server = MockServer::start_async().await;
	let (explorer, store) = build_explorer(&server);
	let explorer = explorer.with_client_credentials(CLIENT_ID, CLIENT_SECRET);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200);
		})
		.await;

	seed(&store, "access-old", None, Duration::seconds(-5)).await;

	let token = explorer
		.ensure_valid_token(&user())
		.await
		.expect("Token lookup should succeed.")
		.expect("The stored token should be returned.");

	assert_eq!(token.expose(), "access-old");
	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn unknown_user_has_no_token() {
	let server = MockServer::start_async().await;
	let (explorer, _store) = build_explorer(&server);
	let explorer = explorer.with_client_credentials(CLIENT_ID, CLIENT_SECRET);
	let token = explorer.ensure_valid_token(&user()).await.expect("Token lookup should succeed.");

	assert!(token.is_none());
}
