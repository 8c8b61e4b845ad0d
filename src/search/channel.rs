//! Order-independent channel (subreddit) sets.

// std
use std::collections::BTreeSet;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Delimiter joining channels into one multi-channel path segment.
pub const CHANNEL_DELIMITER: char = '+';

/// Errors emitted when validating channel names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ChannelValidationError {
	/// At least one channel is required.
	#[error("At least one channel is required.")]
	NoChannels,
	/// Empty channel names are not allowed.
	#[error("Channel names cannot be empty.")]
	Empty,
	/// Channel names cannot contain whitespace, path separators, or the multi-channel delimiter.
	#[error("Channel name contains a forbidden character: {channel}.")]
	InvalidCharacter {
		/// The offending channel name.
		channel: String,
	},
}

/// Non-empty, deduplicated, sorted set of channel names.
///
/// Sorting at construction makes every derived value (cache keys, request paths)
/// independent of the order callers listed the channels in.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelSet(Arc<[String]>);
impl ChannelSet {
	/// Creates a normalized channel set from any iterator.
	pub fn new<I, S>(channels: I) -> Result<Self, ChannelValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = BTreeSet::new();

		for channel in channels {
			let owned: String = channel.into();

			if owned.is_empty() {
				return Err(ChannelValidationError::Empty);
			}
			if owned.chars().any(|c| c.is_whitespace() || c == '/' || c == CHANNEL_DELIMITER) {
				return Err(ChannelValidationError::InvalidCharacter { channel: owned });
			}

			set.insert(owned);
		}

		if set.is_empty() {
			return Err(ChannelValidationError::NoChannels);
		}

		Ok(Self(Arc::from(set.into_iter().collect::<Vec<_>>())))
	}

	/// Number of distinct channels.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Always `false`; construction rejects empty sets.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over the sorted channel names.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Sorted channel names.
	pub fn as_slice(&self) -> &[String] {
		&self.0
	}

	/// Channels joined with [`CHANNEL_DELIMITER`].
	pub fn joined(&self) -> String {
		self.0.join(CHANNEL_DELIMITER.to_string().as_str())
	}
}
impl Debug for ChannelSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ChannelSet").field(&self.0).finish()
	}
}
impl Display for ChannelSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.joined())
	}
}
impl FromStr for ChannelSet {
	type Err = ChannelValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s.split(|c: char| c == CHANNEL_DELIMITER || c == ',').map(str::trim))
	}
}
impl TryFrom<Vec<String>> for ChannelSet {
	type Error = ChannelValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl Serialize for ChannelSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.0.len()))?;

		for channel in self.0.iter() {
			seq.serialize_element(channel)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ChannelSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		ChannelSet::new(values).map_err(DeError::custom)
	}
}
