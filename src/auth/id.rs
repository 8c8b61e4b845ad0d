//! Identifiers for the people the explorer acts for and the credentials it stores.
//!
//! [`UserId`] is whatever opaque subject the embedding auth layer hands over (an email, a UUID,
//! a session subject), so only framing problems are rejected. [`CredentialId`] keys stored
//! records and is restricted to a URL- and file-safe alphabet.

// std
use std::borrow::Borrow;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Longest accepted [`UserId`], in bytes.
pub const USER_ID_MAX_BYTES: usize = 256;
/// Longest accepted [`CredentialId`], in bytes.
pub const CREDENTIAL_ID_MAX_BYTES: usize = 64;

const CREDENTIAL_ID_PREFIX: &str = "reddit-";

/// Error returned when an identifier is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Which identifier was rejected.
		kind: &'static str,
	},
	/// The identifier starts or ends with whitespace.
	#[error("{kind} identifier has leading or trailing whitespace.")]
	Padded {
		/// Which identifier was rejected.
		kind: &'static str,
	},
	/// The identifier contains a character outside its alphabet.
	#[error("{kind} identifier contains the disallowed character {found:?}.")]
	DisallowedCharacter {
		/// Which identifier was rejected.
		kind: &'static str,
		/// First offending character.
		found: char,
	},
	/// The identifier is longer than allowed.
	#[error("{kind} identifier exceeds {max} bytes.")]
	TooLong {
		/// Which identifier was rejected.
		kind: &'static str,
		/// Maximum permitted length in bytes.
		max: usize,
	},
}

/// Opaque identifier of the end user the explorer acts for, as supplied by the auth layer.
///
/// Any printable text is accepted as long as it is non-empty, unpadded, and at most
/// [`USER_ID_MAX_BYTES`] long.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);
impl UserId {
	const KIND: &'static str = "User";

	/// Validates and wraps an auth-layer subject.
	pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
		let value = value.into();

		if value.is_empty() {
			return Err(IdentifierError::Empty { kind: Self::KIND });
		}
		if value.trim() != value {
			return Err(IdentifierError::Padded { kind: Self::KIND });
		}
		if let Some(found) = value.chars().find(|c| c.is_control()) {
			return Err(IdentifierError::DisallowedCharacter { kind: Self::KIND, found });
		}
		if value.len() > USER_ID_MAX_BYTES {
			return Err(IdentifierError::TooLong { kind: Self::KIND, max: USER_ID_MAX_BYTES });
		}

		Ok(Self(value))
	}

	/// Borrows the raw subject.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for UserId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("UserId").field(&self.0).finish()
	}
}
impl Display for UserId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl AsRef<str> for UserId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for UserId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl FromStr for UserId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl TryFrom<String> for UserId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<UserId> for String {
	fn from(value: UserId) -> Self {
		value.0
	}
}

/// Key of a stored upstream credential.
///
/// Restricted to ASCII letters, digits, `-`, `_`, `.`, and `:` so it can double as a file name
/// or URL segment, and at most [`CREDENTIAL_ID_MAX_BYTES`] long.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialId(String);
impl CredentialId {
	const KIND: &'static str = "Credential";

	/// Validates and wraps a credential key.
	pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
		let value = value.into();

		if value.is_empty() {
			return Err(IdentifierError::Empty { kind: Self::KIND });
		}
		if let Some(found) = value.chars().find(|&c| !is_credential_char(c)) {
			return Err(IdentifierError::DisallowedCharacter { kind: Self::KIND, found });
		}
		if value.len() > CREDENTIAL_ID_MAX_BYTES {
			return Err(IdentifierError::TooLong {
				kind: Self::KIND,
				max: CREDENTIAL_ID_MAX_BYTES,
			});
		}

		Ok(Self(value))
	}

	/// Derives the stable key of `user`'s Reddit credential.
	///
	/// The key is a hash of the subject, so arbitrary auth-layer ids map onto the credential
	/// alphabet without leaking the subject into file names or logs.
	pub fn for_user(user: &UserId) -> Self {
		let digest = Sha256::digest(user.as_str().as_bytes());

		Self(format!("{CREDENTIAL_ID_PREFIX}{}", URL_SAFE_NO_PAD.encode(&digest[..16])))
	}

	/// Borrows the raw key.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for CredentialId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("CredentialId").field(&self.0).finish()
	}
}
impl Display for CredentialId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl AsRef<str> for CredentialId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl FromStr for CredentialId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl TryFrom<String> for CredentialId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<CredentialId> for String {
	fn from(value: CredentialId) -> Self {
		value.0
	}
}

fn is_credential_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn user_ids_accept_opaque_subjects() {
		for subject in ["alice@example.com", "auth0|5f1c", "Jane Doe", "7c9e6679-7425-40de"] {
			let user = UserId::new(subject).expect("Opaque subjects should be accepted.");

			assert_eq!(user.as_str(), subject);
		}
	}

	#[test]
	fn user_ids_reject_framing_problems() {
		assert_eq!(UserId::new(""), Err(IdentifierError::Empty { kind: "User" }));
		assert_eq!(UserId::new(" alice"), Err(IdentifierError::Padded { kind: "User" }));
		assert_eq!(
			UserId::new("alice\nbob"),
			Err(IdentifierError::DisallowedCharacter { kind: "User", found: '\n' })
		);

		UserId::new("u".repeat(USER_ID_MAX_BYTES)).expect("Exact length should succeed.");

		assert!(matches!(
			UserId::new("u".repeat(USER_ID_MAX_BYTES + 1)),
			Err(IdentifierError::TooLong { max: USER_ID_MAX_BYTES, .. })
		));
	}

	#[test]
	fn credential_ids_keep_to_their_alphabet() {
		CredentialId::new("reddit:cred-1_v2.json").expect("Safe characters should be accepted.");

		assert_eq!(
			CredentialId::new("cred/1"),
			Err(IdentifierError::DisallowedCharacter { kind: "Credential", found: '/' })
		);
		assert!(CredentialId::new("cred 1").is_err());
		assert!(CredentialId::new("c".repeat(CREDENTIAL_ID_MAX_BYTES + 1)).is_err());
	}

	#[test]
	fn derived_credential_ids_are_stable_and_valid() {
		let alice = UserId::new("alice@example.com").expect("User fixture should be valid.");
		let bob = UserId::new("bob@example.com").expect("User fixture should be valid.");
		let derived = CredentialId::for_user(&alice);

		assert_eq!(derived, CredentialId::for_user(&alice));
		assert_ne!(derived, CredentialId::for_user(&bob));
		assert!(derived.as_str().starts_with("reddit-"));
		assert!(!derived.as_str().contains("alice"));
		assert_eq!(CredentialId::new(derived.as_str()), Ok(derived));
	}

	#[test]
	fn serde_rejects_invalid_values() {
		let user: UserId =
			serde_json::from_str("\"Jane Doe\"").expect("User should deserialize.");

		assert_eq!(format!("{user:?}"), r#"UserId("Jane Doe")"#);
		assert!(serde_json::from_str::<UserId>("\" padded\"").is_err());
		assert!(serde_json::from_str::<CredentialId>("\"a/b\"").is_err());
	}

	#[test]
	fn user_ids_index_maps_by_str() {
		let map = HashMap::from([(UserId::new("user-123").expect("User should be valid."), 7_u8)]);

		assert_eq!(map.get("user-123"), Some(&7));
	}
}
