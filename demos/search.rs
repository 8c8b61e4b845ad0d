//! Demonstrates a search against a mocked upstream: the stored token is refreshed first, the
//! second identical search is served from the cache, and a throttled query reports its retry
//! hint.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;
// self
use reddit_explorer::{
	auth::{CredentialId, CredentialRecord, UserId},
	config::ExplorerConfig,
	flows::ReqwestExplorer,
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::UpstreamDescriptor,
	reqwest::{Client, redirect::Policy},
	search::{ChannelSet, SearchParams, SortMode, TimeWindow},
	store::{CredentialStore, MemoryStore},
};

const LISTING: &str = r#"{
	"kind": "Listing",
	"data": {
		"after": "t3_demo2",
		"children": [
			{ "kind": "t3", "data": {
				"name": "t3_demo1", "title": "Async Rust in production", "author": "ferris",
				"subreddit": "rust", "permalink": "/r/rust/comments/demo1/", "score": 512,
				"created_utc": 1700000000.0, "num_comments": 64, "over_18": false,
				"link_flair_text": "Discussion"
			} },
			{ "kind": "t3", "data": {
				"name": "t3_demo2", "title": "Borrow checker tips", "author": "crab",
				"subreddit": "learnrust", "permalink": "/r/learnrust/comments/demo2/", "score": 128,
				"created_utc": 1700000600.0, "num_comments": 12, "over_18": null,
				"link_flair_text": ""
			} }
		]
	}
}"#;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let config = ExplorerConfig::from_env();
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"demo-access-2","token_type":"bearer","expires_in":3600}"#,
			);
		})
		.await;
	let search_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/r/learnrust+rust/search");
			then.status(200).header("content-type", "application/json").body(LISTING);
		})
		.await;
	let throttled_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/r/golang/search");
			then.status(429).header("retry-after", "30");
		})
		.await;
	let base = Url::parse(&server.url("/"))?;
	let descriptor = UpstreamDescriptor::builder()
		.token_endpoint(base.join("/api/v1/access_token")?)
		.api_base(base)
		.user_agent(config.user_agent.as_str())
		.build()?;
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let user = UserId::new("demo-user")?;

	store
		.save(
			CredentialRecord::builder(CredentialId::for_user(&user), user.clone())
				.access_token("demo-access-1")
				.refresh_token("demo-refresh")
				.expires_in(Duration::seconds(5))
				.build()?,
		)
		.await?;

	let (client_id, client_secret) =
		config.client_credentials().unwrap_or(("demo-client", "demo-secret"));
	// The mock server presents a self-signed certificate.
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(Policy::none())
			.build()?,
	);
	let explorer = ReqwestExplorer::with_http_client(
		store,
		descriptor,
		http_client,
		Arc::new(ReqwestTransportErrorMapper),
	)
	.with_client_credentials(client_id, client_secret);
	let params = SearchParams::new(ChannelSet::new(["rust", "learnrust"])?)
		.with_query("async")
		.with_sort(SortMode::Top)
		.with_time(TimeWindow::Week);
	let fresh = explorer.search(&user, &params).await?;

	println!("Fetched {} posts (cached: {}).", fresh.items.len(), fresh.cached);

	for post in &fresh.items {
		println!(
			"  [{}] {} by u/{} in r/{}: {}",
			post.score, post.title, post.author, post.channel, post.url
		);
	}

	let again = explorer.search(&user, &params).await?;

	println!("Repeated search served from cache: {}.", again.cached);

	let throttled = SearchParams::new(ChannelSet::new(["golang"])?);

	match explorer.search(&user, &throttled).await {
		Ok(result) => println!("Unexpected success with {} posts.", result.items.len()),
		Err(err) => println!("Search failed: {}", serde_json::to_string(&err.report())?),
	}

	token_mock.assert_async().await;
	search_mock.assert_calls_async(1).await;
	throttled_mock.assert_async().await;

	Ok(())
}
