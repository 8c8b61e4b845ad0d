//! Token refresher: returns a currently valid access token for a user.
//!
//! [`Explorer::ensure_valid_token`] reads the user's stored credential and hands back its
//! access token unchanged while it is outside the 30-second safety margin (or carries no
//! expiry at all). Otherwise it exchanges the refresh token at the token endpoint, persists
//! the rotated credential, and returns the new token. When refreshing is impossible or fails,
//! the last-known access token is returned instead; any resulting rejection surfaces on the
//! following upstream call. Refreshes for the same user are serialized.

mod metrics;

pub use self::metrics::{RefreshCounts, RefreshMetrics};

// self
use self::metrics::RefreshTally;
use crate::{
	_prelude::*,
	auth::{CredentialUpdate, TokenSecret, UserId},
	error::RefreshError,
	flows::Explorer,
	http::UpstreamHttpClient,
	oauth::{BasicFacade, OAuth2Facade, RefreshGrant, TransportErrorMapper},
	obs::{self, FlowEvent, FlowKind, FlowOutcome, FlowSpan},
};

impl<C, M> Explorer<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a usable access token for `user`, refreshing and persisting it when needed.
	///
	/// `Ok(None)` means the user has no stored credential (or only an empty token) and must
	/// connect their account. Refresh failures never surface here; only store failures do.
	pub async fn ensure_valid_token(&self, user: &UserId) -> Result<Option<TokenSecret>> {
		const KIND: FlowKind = FlowKind::TokenRefresh;

		let span = FlowSpan::new(KIND, "ensure_valid_token");

		span.instrument(async move {
			let _singleflight = self.refresh_guards.acquire(user).await;
			let Some(record) = self.store.find_credential(user).await? else {
				return Ok(None);
			};

			if !record.needs_refresh_at(OffsetDateTime::now_utc()) {
				return Ok(record.usable_access_token());
			}

			let Some(refresh_token) = record.refresh_token.as_ref().filter(|_| record.can_refresh())
			else {
				self.refresh_metrics.tally(RefreshTally::Fallback);
				FlowEvent::RefreshFallback { user, reason: &"no refresh token is stored" }.emit();

				return Ok(record.usable_access_token());
			};

			obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

			let grant = match self.exchange_refresh_token(refresh_token).await {
				Ok(grant) => grant,
				Err(err) => {
					self.refresh_metrics.tally(RefreshTally::Fallback);
					obs::record_flow_outcome(KIND, FlowOutcome::Fallback);
					FlowEvent::RefreshFallback { user, reason: &err }.emit();

					return Ok(record.usable_access_token());
				},
			};
			// The upstream may omit the refresh token; keep the previous one in that case.
			let update = CredentialUpdate::issued(
				grant.access_token.clone(),
				grant.refresh_token.or_else(|| Some(refresh_token.clone())),
				OffsetDateTime::now_utc(),
				grant.lifetime,
			);
			let expires_at = update.expires_at;

			if let Err(err) = self.store.update_credential(&record.id, update).await {
				self.refresh_metrics.tally(RefreshTally::Failure);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				return Err(err.into());
			}

			self.refresh_metrics.tally(RefreshTally::Success);
			obs::record_flow_outcome(KIND, FlowOutcome::Success);
			FlowEvent::CredentialRefreshed { user, expires_at }.emit();

			Ok(Some(grant.access_token))
		})
		.await
	}

	async fn exchange_refresh_token(&self, refresh_token: &TokenSecret) -> Result<RefreshGrant> {
		let (Some(client_id), Some(client_secret)) =
			(self.client_id.as_deref(), self.client_secret.as_deref())
		else {
			return Err(RefreshError::MissingClientCredentials.into());
		};
		let facade = <BasicFacade<C, M>>::from_descriptor(
			&self.descriptor,
			client_id,
			client_secret,
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)?;

		self.refresh_metrics.tally(RefreshTally::Attempt);

		facade.refresh_token(refresh_token).await.inspect_err(|_| {
			self.refresh_metrics.tally(RefreshTally::Failure);
		})
	}
}
