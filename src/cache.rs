//! Canonical cache keys and the process-wide TTL response cache.
//!
//! Entries are only usable while the current instant is strictly before their expiry. Expired
//! entries are never purged eagerly; the next write to the same key supersedes them.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	search::{SearchPage, SearchParams},
};

/// Lifetime of a cached search page.
pub const DEFAULT_TTL: Duration = Duration::seconds(90);

/// Deterministic, order-independent key derived from [`SearchParams`].
///
/// The key is the JSON encoding of `[sorted channels, query, sort, time, after]`, with absent
/// values rendered as empty strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);
impl CacheKey {
	/// Builds the canonical key for the provided parameters.
	pub fn from_params(params: &SearchParams) -> Self {
		let channels: Vec<&str> = params.channels.iter().collect();
		let encoded = serde_json::json!([
			channels,
			params.query().unwrap_or_default(),
			params.sort.as_str(),
			params.time.as_str(),
			params.after().unwrap_or_default(),
		]);

		Self(encoded.to_string())
	}

	/// Returns the canonical string.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Base64 (no padding) SHA-256 digest of the key, safe to log.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());

		STANDARD_NO_PAD.encode(digest)
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

impl SearchParams {
	/// Canonical cache key for these parameters.
	pub fn cache_key(&self) -> CacheKey {
		CacheKey::from_params(self)
	}
}

/// Cached page plus its absolute expiry instant.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
	/// Instant at which the entry stops being usable.
	pub expires_at: OffsetDateTime,
	/// Cached page.
	pub page: SearchPage,
}
impl CacheEntry {
	/// Returns `true` while `now` is strictly before the expiry instant.
	pub fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
		now < self.expires_at
	}
}

/// Shared response cache keyed by [`CacheKey`].
#[derive(Debug, Default)]
pub struct ResponseCache {
	entries: RwLock<HashMap<CacheKey, CacheEntry>>,
	hits: AtomicU64,
	misses: AtomicU64,
}
impl ResponseCache {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the cached page for `key` if it has not expired.
	pub fn get(&self, key: &CacheKey) -> Option<SearchPage> {
		self.get_at(key, OffsetDateTime::now_utc())
	}

	/// Same as [`get`](Self::get) against an explicit clock reading.
	pub fn get_at(&self, key: &CacheKey, now: OffsetDateTime) -> Option<SearchPage> {
		let page = self.lookup_at(key, now);
		let counter = if page.is_some() { &self.hits } else { &self.misses };

		counter.fetch_add(1, Ordering::Relaxed);

		page
	}

	/// Like [`get`](Self::get) but leaves the hit/miss counters untouched.
	pub fn peek(&self, key: &CacheKey) -> Option<SearchPage> {
		self.lookup_at(key, OffsetDateTime::now_utc())
	}

	/// Stores `page` under `key`, replacing any previous entry, expiring `ttl` from now.
	pub fn put(&self, key: CacheKey, page: SearchPage, ttl: Duration) -> OffsetDateTime {
		self.put_at(key, page, ttl, OffsetDateTime::now_utc())
	}

	/// Same as [`put`](Self::put) against an explicit clock reading; returns the expiry instant.
	pub fn put_at(
		&self,
		key: CacheKey,
		page: SearchPage,
		ttl: Duration,
		now: OffsetDateTime,
	) -> OffsetDateTime {
		let expires_at = now + ttl;

		self.entries.write().insert(key, CacheEntry { expires_at, page });

		expires_at
	}

	fn lookup_at(&self, key: &CacheKey, now: OffsetDateTime) -> Option<SearchPage> {
		self.entries
			.read()
			.get(key)
			.filter(|entry| entry.is_fresh_at(now))
			.map(|entry| entry.page.clone())
	}

	/// Expiry instant of the stored entry, fresh or not.
	pub fn expires_at(&self, key: &CacheKey) -> Option<OffsetDateTime> {
		self.entries.read().get(key).map(|entry| entry.expires_at)
	}

	/// Number of stored entries, including expired ones awaiting replacement.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` when nothing has been stored yet.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Number of lookups answered from a fresh entry.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Number of lookups that found nothing usable.
	pub fn misses(&self) -> u64 {
		self.misses.load(Ordering::Relaxed)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::search::{ChannelSet, PostSummary, SortMode, TimeWindow};

	fn params(channels: &[&str]) -> SearchParams {
		SearchParams::new(
			ChannelSet::new(channels.iter().copied()).expect("Channel fixture should be valid."),
		)
	}

	fn page(id: &str) -> SearchPage {
		SearchPage {
			items: vec![PostSummary {
				id: id.into(),
				title: "title".into(),
				author: "ferris".into(),
				channel: "rust".into(),
				url: "https://reddit.com/r/rust/comments/x/".into(),
				score: 1,
				created_utc: 1_700_000_000.0,
				num_comments: 0,
				nsfw: false,
				flair: None,
			}],
			next_page_token: None,
		}
	}

	#[test]
	fn key_ignores_channel_order() {
		let permutations =
			[["a", "b", "c"], ["c", "b", "a"], ["b", "a", "c"], ["a", "c", "b"], ["c", "a", "b"]];
		let expected = params(&["a", "b", "c"]).with_query("q").cache_key();

		for channels in permutations {
			assert_eq!(params(&channels).with_query("q").cache_key(), expected);
		}
	}

	#[test]
	fn key_renders_defaults_and_distinguishes_fields() {
		let key = params(&["b", "a"]).cache_key();

		assert_eq!(key.as_str(), r#"[["a","b"],"","hot","day",""]"#);
		assert_ne!(key, params(&["a", "b"]).with_sort(SortMode::Top).cache_key());
		assert_ne!(key, params(&["a", "b"]).with_time(TimeWindow::All).cache_key());
		assert_ne!(key, params(&["a", "b"]).with_after("t3_x").cache_key());
		assert_eq!(key, params(&["a", "b"]).with_query("").cache_key());
		assert_eq!(key.fingerprint(), params(&["a", "b"]).cache_key().fingerprint());
	}

	#[test]
	fn entries_expire_exactly_at_ttl() {
		let cache = ResponseCache::new();
		let key = params(&["rust"]).cache_key();
		let written = macros::datetime!(2025-01-01 00:00 UTC);
		let expires_at = cache.put_at(key.clone(), page("t3_a"), DEFAULT_TTL, written);

		assert_eq!(expires_at, written + Duration::seconds(90));
		assert_eq!(cache.get_at(&key, written + Duration::seconds(89)), Some(page("t3_a")));
		assert_eq!(cache.get_at(&key, written + DEFAULT_TTL), None);
		assert_eq!(cache.get_at(&key, written + Duration::minutes(5)), None);
		assert_eq!(cache.hits(), 1);
		assert_eq!(cache.misses(), 2);
		assert_eq!(cache.len(), 1, "Expired entries stay until superseded.");
	}

	#[test]
	fn put_overwrites_existing_entry() {
		let cache = ResponseCache::new();
		let key = params(&["rust"]).cache_key();
		let first = macros::datetime!(2025-01-01 00:00 UTC);

		cache.put_at(key.clone(), page("t3_a"), DEFAULT_TTL, first);
		cache.put_at(key.clone(), page("t3_b"), DEFAULT_TTL, first + Duration::minutes(10));

		assert_eq!(cache.get_at(&key, first + Duration::minutes(11)), Some(page("t3_b")));
		assert_eq!(cache.expires_at(&key), Some(first + Duration::minutes(10) + DEFAULT_TTL));
		assert_eq!(cache.len(), 1);
	}
}
