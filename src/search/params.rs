//! Search parameters, sort modes, and time windows.

// self
use crate::{_prelude::*, search::ChannelSet};

macro_rules! def_label_enum {
	(
		$(#[$meta:meta])*
		$name:ident, $kind:literal,
		{ $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)? }
	) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
		#[derive(Serialize, Deserialize)]
		#[serde(rename_all = "lowercase")]
		pub enum $name {
			$(
				$(#[$vmeta])*
				$variant,
			)+
		}
		impl $name {
			/// Every accepted value, in declaration order.
			pub const ALL: &'static [Self] = &[$(Self::$variant),+];

			/// Returns the wire label sent upstream.
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => $label,)+
				}
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(self.as_str())
			}
		}
		impl FromStr for $name {
			type Err = UnknownLabelError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($label => Ok(Self::$variant),)+
					other => Err(UnknownLabelError { kind: $kind, value: other.to_owned() }),
				}
			}
		}
	};
}

/// Error returned when a sort or time label is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown {kind} `{value}`.")]
pub struct UnknownLabelError {
	/// Which enumeration was being parsed.
	pub kind: &'static str,
	/// The rejected input.
	pub value: String,
}

def_label_enum! {
	/// Listing order requested from the upstream.
	SortMode, "sort mode",
	{
		/// Currently trending posts.
		#[default]
		Hot => "hot",
		/// Newest posts first.
		New => "new",
		/// Highest scoring posts within a [`TimeWindow`].
		Top => "top",
	}
}

def_label_enum! {
	/// Time window applied to the `top` sort.
	TimeWindow, "time window",
	{
		/// Past 24 hours.
		#[default]
		Day => "day",
		/// Past week.
		Week => "week",
		/// Past month.
		Month => "month",
		/// Past year.
		Year => "year",
		/// All time.
		All => "all",
	}
}

/// Normalized input to one search invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
	/// Target channels; never empty.
	#[serde(alias = "subreddits")]
	pub channels: ChannelSet,
	/// Optional free-text query; empty strings are treated as absent.
	#[serde(default)]
	pub query: Option<String>,
	/// Listing order.
	#[serde(default)]
	pub sort: SortMode,
	/// Time window; only sent upstream for [`SortMode::Top`].
	#[serde(default)]
	pub time: TimeWindow,
	/// Opaque continuation token from a prior page.
	#[serde(default)]
	pub after: Option<String>,
}
impl SearchParams {
	/// Creates parameters for the provided channels with default sort and time window.
	pub fn new(channels: ChannelSet) -> Self {
		Self {
			channels,
			query: None,
			sort: SortMode::default(),
			time: TimeWindow::default(),
			after: None,
		}
	}

	/// Sets the free-text query.
	pub fn with_query(mut self, query: impl Into<String>) -> Self {
		self.query = Some(query.into());

		self
	}

	/// Sets the sort mode.
	pub fn with_sort(mut self, sort: SortMode) -> Self {
		self.sort = sort;

		self
	}

	/// Sets the time window.
	pub fn with_time(mut self, time: TimeWindow) -> Self {
		self.time = time;

		self
	}

	/// Sets the continuation token returned by a previous page.
	pub fn with_after(mut self, after: impl Into<String>) -> Self {
		self.after = Some(after.into());

		self
	}

	/// Non-empty query, if any.
	pub fn query(&self) -> Option<&str> {
		self.query.as_deref().filter(|value| !value.is_empty())
	}

	/// Non-empty continuation token, if any.
	pub fn after(&self) -> Option<&str> {
		self.after.as_deref().filter(|value| !value.is_empty())
	}
}
