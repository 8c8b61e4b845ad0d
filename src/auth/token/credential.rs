//! Per-user upstream credential records, lifecycle helpers, and builders.

// self
use crate::{
	_prelude::*,
	auth::{CredentialId, UserId, token::secret::TokenSecret},
};

/// Lifecycle state of a stored credential relative to an instant and safety margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenState {
	/// The access token can be used as-is.
	Valid,
	/// The access token is missing, expired, or about to expire.
	NeedsRefresh,
}

/// Errors produced by [`CredentialRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
}

/// Delegated credential one user granted the explorer for the upstream service.
///
/// An absent `expires_at` marks a non-expiring access token that is never refreshed
/// proactively. Expiry instants are kept at whole-second precision.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
	/// Store-assigned record identifier.
	pub id: CredentialId,
	/// Owning user.
	pub user: UserId,
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the upstream issued one.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Absolute expiry instant of the access token.
	#[serde(default, with = "time::serde::timestamp::option")]
	pub expires_at: Option<OffsetDateTime>,
}
impl CredentialRecord {
	/// Safety margin applied before the expiry instant when deciding to refresh.
	pub const REFRESH_MARGIN: Duration = Duration::seconds(30);

	/// Returns a builder for constructing records.
	pub fn builder(id: CredentialId, user: UserId) -> CredentialRecordBuilder {
		CredentialRecordBuilder::new(id, user)
	}

	/// Computes the token state at `now` using the provided safety margin.
	pub fn state_at(&self, now: OffsetDateTime, margin: Duration) -> TokenState {
		if self.access_token.is_empty() {
			return TokenState::NeedsRefresh;
		}

		match self.expires_at {
			Some(expires_at) if expires_at <= now + margin => TokenState::NeedsRefresh,
			_ => TokenState::Valid,
		}
	}

	/// Convenience helper that checks the state with the default margin at `now`.
	pub fn needs_refresh_at(&self, now: OffsetDateTime) -> bool {
		matches!(self.state_at(now, Self::REFRESH_MARGIN), TokenState::NeedsRefresh)
	}

	/// Returns `true` when an expired access token can be renewed.
	pub fn can_refresh(&self) -> bool {
		self.refresh_token.as_ref().is_some_and(|secret| !secret.is_empty())
	}

	/// Last-known access token, or `None` when the stored value is empty.
	pub fn usable_access_token(&self) -> Option<TokenSecret> {
		(!self.access_token.is_empty()).then(|| self.access_token.clone())
	}

	/// Overwrites the rotating fields with the provided update.
	pub fn apply(&mut self, update: CredentialUpdate) {
		self.access_token = update.access_token;
		self.refresh_token = update.refresh_token;
		self.expires_at = update.expires_at;
	}
}
impl Debug for CredentialRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialRecord")
			.field("id", &self.id)
			.field("user", &self.user)
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Rotated credential fields written back after a successful refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialUpdate {
	/// Newly issued access token.
	pub access_token: TokenSecret,
	/// Refresh token to keep (rotated or previous).
	pub refresh_token: Option<TokenSecret>,
	/// New absolute expiry instant.
	pub expires_at: Option<OffsetDateTime>,
}
impl CredentialUpdate {
	/// Builds an update that expires `lifetime` after `issued_at`, truncated to whole seconds.
	pub fn issued(
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Self {
		Self { access_token, refresh_token, expires_at: Some(whole_seconds(issued_at + lifetime)) }
	}
}

/// Builder for [`CredentialRecord`].
#[derive(Clone, Debug)]
pub struct CredentialRecordBuilder {
	id: CredentialId,
	user: UserId,
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	expires_at: Option<OffsetDateTime>,
}
impl CredentialRecordBuilder {
	fn new(id: CredentialId, user: UserId) -> Self {
		Self { id, user, access_token: None, refresh_token: None, expires_at: None }
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets the expiry relative to the current clock.
	pub fn expires_in(self, duration: Duration) -> Self {
		self.expires_at(OffsetDateTime::now_utc() + duration)
	}

	/// Consumes the builder and produces a [`CredentialRecord`].
	pub fn build(self) -> Result<CredentialRecord, CredentialRecordBuilderError> {
		let access_token =
			self.access_token.ok_or(CredentialRecordBuilderError::MissingAccessToken)?;

		Ok(CredentialRecord {
			id: self.id,
			user: self.user,
			access_token,
			refresh_token: self.refresh_token,
			expires_at: self.expires_at.map(whole_seconds),
		})
	}
}

fn whole_seconds(instant: OffsetDateTime) -> OffsetDateTime {
	instant - Duration::nanoseconds(i64::from(instant.nanosecond()))
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn builder() -> CredentialRecordBuilder {
		CredentialRecord::builder(
			CredentialId::new("cred-1").expect("Credential fixture should be valid."),
			UserId::new("user-1").expect("User fixture should be valid."),
		)
	}

	#[test]
	fn state_honors_safety_margin() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let record = builder()
			.access_token("access")
			.refresh_token("refresh")
			.expires_at(now + Duration::seconds(31))
			.build()
			.expect("Record builder should succeed.");

		assert_eq!(record.state_at(now, CredentialRecord::REFRESH_MARGIN), TokenState::Valid);
		assert_eq!(
			record.state_at(now + Duration::seconds(1), CredentialRecord::REFRESH_MARGIN),
			TokenState::NeedsRefresh
		);
		assert!(record.needs_refresh_at(now + Duration::minutes(5)));
	}

	#[test]
	fn missing_expiry_never_needs_refresh() {
		let record = builder().access_token("forever").build().expect("Record should build.");

		assert!(!record.needs_refresh_at(macros::datetime!(2100-01-01 00:00 UTC)));
		assert!(!record.can_refresh());
	}

	#[test]
	fn empty_access_token_needs_refresh_and_is_unusable() {
		let record = builder()
			.access_token("")
			.refresh_token("refresh")
			.build()
			.expect("Record should build.");

		assert!(record.needs_refresh_at(OffsetDateTime::now_utc()));
		assert!(record.usable_access_token().is_none());
		assert!(record.can_refresh());
	}

	#[test]
	fn builder_requires_access_token() {
		let err = builder().build().expect_err("Builder must reject missing access tokens.");

		assert_eq!(err, CredentialRecordBuilderError::MissingAccessToken);
	}

	#[test]
	fn update_truncates_to_whole_seconds() {
		let issued = macros::datetime!(2025-01-01 00:00:00.750 UTC);
		let update = CredentialUpdate::issued(
			TokenSecret::new("new"),
			None,
			issued,
			Duration::seconds(3600),
		);

		assert_eq!(update.expires_at, Some(macros::datetime!(2025-01-01 01:00:00 UTC)));
	}

	#[test]
	fn expiry_serializes_as_unix_seconds() {
		let record = builder()
			.access_token("access")
			.expires_at(macros::datetime!(2025-01-01 00:00 UTC))
			.build()
			.expect("Record should build.");
		let json = serde_json::to_value(&record).expect("Record should serialize.");

		assert_eq!(json["expires_at"], 1_735_689_600_i64);
		assert!(json["refresh_token"].is_null());

		let decoded: CredentialRecord =
			serde_json::from_value(json).expect("Record should deserialize.");

		assert_eq!(decoded.expires_at, record.expires_at);
		assert!(!format!("{decoded:?}").contains("\"access\""));
	}
}
