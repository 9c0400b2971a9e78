//! Stored credential pair plus the opaque user blob written at sign-in.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access/refresh token pair. Both halves are present or the pair does not exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialPair {
	/// Short-lived bearer credential.
	pub access_token: TokenSecret,
	/// Longer-lived credential exchanged for a new access token.
	pub refresh_token: TokenSecret,
}
impl CredentialPair {
	/// Creates a pair from raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}
}

/// Everything persisted for a signed-in dashboard user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
	/// Token pair used for authenticated requests.
	pub credentials: CredentialPair,
	/// Opaque serialized user profile, stored verbatim.
	pub user: Option<String>,
}
impl Session {
	/// Creates a session without a user blob.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self { credentials: CredentialPair::new(access_token, refresh_token), user: None }
	}

	/// Attaches a serialized user profile.
	pub fn with_user(mut self, user: impl Into<String>) -> Self {
		self.user = Some(user.into());

		self
	}

	/// Serializes `user` to JSON and attaches it as the user blob.
	pub fn with_user_json<T>(self, user: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		Ok(self.with_user(serde_json::to_string(user)?))
	}
}
