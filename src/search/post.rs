//! Post summaries and the upstream listing payload they are normalized from.

// self
use crate::{_prelude::*, provider::UpstreamDescriptor};

/// Normalized post returned to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
	/// Upstream fullname (for example `t3_abc123`).
	pub id: String,
	/// Post title.
	pub title: String,
	/// Author username.
	pub author: String,
	/// Channel the post was submitted to.
	#[serde(alias = "subreddit")]
	pub channel: String,
	/// Canonical URL of the post discussion.
	pub url: String,
	/// Net score.
	pub score: i64,
	/// Creation instant in epoch seconds.
	pub created_utc: f64,
	/// Number of comments.
	pub num_comments: u64,
	/// Adult-content flag.
	pub nsfw: bool,
	/// Flair label, when the post carries one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub flair: Option<String>,
}

/// One page of normalized posts plus the cursor for the next page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
	/// Posts in upstream order.
	pub items: Vec<PostSummary>,
	/// Continuation token for the next page.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub next_page_token: Option<String>,
}

/// Search outcome returned by [`Explorer::search`](crate::flows::Explorer::search).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
	/// Posts in upstream order.
	pub items: Vec<PostSummary>,
	/// Continuation token for the next page.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub next_page_token: Option<String>,
	/// Whether the page was served from the response cache.
	pub cached: bool,
}
impl SearchResult {
	/// Wraps a page served from the response cache.
	pub fn from_cache(page: SearchPage) -> Self {
		Self::with_origin(page, true)
	}

	/// Wraps a page freshly fetched from the upstream.
	pub fn fresh(page: SearchPage) -> Self {
		Self::with_origin(page, false)
	}

	fn with_origin(page: SearchPage, cached: bool) -> Self {
		Self { items: page.items, next_page_token: page.next_page_token, cached }
	}
}

/// Upstream listing envelope (`{ "data": { "children": [...], "after": ... } }`).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Listing {
	/// Listing body; tolerated as missing.
	#[serde(default)]
	pub data: Option<ListingData>,
}
impl Listing {
	/// Normalizes the listing into a [`SearchPage`], preserving upstream order.
	pub fn into_page(self, descriptor: &UpstreamDescriptor) -> SearchPage {
		let Some(data) = self.data else {
			return SearchPage::default();
		};
		let items =
			data.children.into_iter().map(|child| child.data.normalize(descriptor)).collect();

		SearchPage { items, next_page_token: data.after.filter(|after| !after.is_empty()) }
	}
}

/// Listing body holding the children and the pagination cursor.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListingData {
	/// Listing children.
	#[serde(default)]
	pub children: Vec<ListingChild>,
	/// Pagination cursor for the next page.
	#[serde(default)]
	pub after: Option<String>,
}

/// Single listing child wrapping a post.
#[derive(Clone, Debug, Deserialize)]
pub struct ListingChild {
	/// Raw post fields.
	pub data: RawPost,
}

/// Raw post fields as returned by the upstream.
#[derive(Clone, Debug, Deserialize)]
pub struct RawPost {
	/// Fullname of the post.
	pub name: String,
	/// Post title.
	pub title: String,
	/// Author username.
	pub author: String,
	/// Channel name.
	pub subreddit: String,
	/// Site-relative permalink.
	pub permalink: String,
	/// Net score.
	pub score: i64,
	/// Creation instant in epoch seconds.
	pub created_utc: f64,
	/// Number of comments.
	pub num_comments: u64,
	/// Adult-content flag; may be missing or null.
	#[serde(default)]
	pub over_18: Option<bool>,
	/// Flair label; may be missing, null, or empty.
	#[serde(default)]
	pub link_flair_text: Option<String>,
}
impl RawPost {
	/// Maps the raw fields onto a [`PostSummary`].
	pub fn normalize(self, descriptor: &UpstreamDescriptor) -> PostSummary {
		PostSummary {
			url: descriptor.permalink_url(&self.permalink),
			id: self.name,
			title: self.title,
			author: self.author,
			channel: self.subreddit,
			score: self.score,
			created_utc: self.created_utc,
			num_comments: self.num_comments,
			nsfw: self.over_18.unwrap_or(false),
			flair: self.link_flair_text.filter(|flair| !flair.is_empty()),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn descriptor() -> UpstreamDescriptor {
		UpstreamDescriptor::builder().build().expect("Default descriptor should build.")
	}

	fn child(
		name: &str,
		over_18: serde_json::Value,
		flair: serde_json::Value,
	) -> serde_json::Value {
		json!({
			"kind": "t3",
			"data": {
				"name": name,
				"title": format!("Title {name}"),
				"author": "ferris",
				"subreddit": "rust",
				"permalink": format!("/r/rust/comments/{name}/title/"),
				"score": 42,
				"created_utc": 1_700_000_000.0,
				"num_comments": 7,
				"over_18": over_18,
				"link_flair_text": flair,
			}
		})
	}

	#[test]
	fn listing_normalizes_in_upstream_order() {
		let listing: Listing = serde_json::from_value(json!({
			"kind": "Listing",
			"data": {
				"after": "t3_c",
				"children": [
					child("t3_b", json!(true), json!("Discussion")),
					child("t3_a", json!(null), json!("")),
					child("t3_c", json!(false), json!(null)),
				],
			}
		}))
		.expect("Listing fixture should deserialize.");
		let page = listing.into_page(&descriptor());
		let ids: Vec<&str> = page.items.iter().map(|post| post.id.as_str()).collect();

		assert_eq!(ids, vec!["t3_b", "t3_a", "t3_c"]);
		assert_eq!(page.next_page_token.as_deref(), Some("t3_c"));

		let first = &page.items[0];

		assert!(first.nsfw);
		assert_eq!(first.flair.as_deref(), Some("Discussion"));
		assert_eq!(first.url, "https://reddit.com/r/rust/comments/t3_b/title/");
		assert_eq!(first.channel, "rust");
		assert!(!page.items[1].nsfw, "Null adult flags must coerce to false.");
		assert_eq!(page.items[1].flair, None, "Empty flair must map to absent.");
		assert_eq!(page.items[2].flair, None);
	}

	#[test]
	fn missing_data_yields_empty_page() {
		let listing: Listing =
			serde_json::from_value(json!({})).expect("Empty object should parse.");
		let page = listing.into_page(&descriptor());

		assert!(page.items.is_empty());
		assert_eq!(page.next_page_token, None);
	}

	#[test]
	fn result_serializes_in_camel_case() {
		let page = SearchPage { items: Vec::new(), next_page_token: Some("t3_x".into()) };
		let json = serde_json::to_value(SearchResult::from_cache(page))
			.expect("Search result should serialize.");

		assert_eq!(json, json!({ "items": [], "nextPageToken": "t3_x", "cached": true }));
	}
}
