//! Storage contracts and built-in backends for the persisted session keys.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, Session, TokenSecret},
};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value backend holding the dashboard's persisted session.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`, if present.
	fn fetch(&self, key: StorageKey) -> StoreFuture<'_, Option<String>>;

	/// Persists or replaces the value under `key`.
	fn save(&self, key: StorageKey, value: String) -> StoreFuture<'_, ()>;

	/// Removes the value under `key`.
	fn remove(&self, key: StorageKey) -> StoreFuture<'_, ()>;

	/// Removes every [`StorageKey`] in one step.
	fn clear(&self) -> StoreFuture<'_, ()>;
}
impl dyn SessionStore {
	/// Returns the stored access token; an empty value counts as absent.
	pub async fn access_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		self.token(StorageKey::AccessToken).await
	}

	/// Returns the stored refresh token; an empty value counts as absent.
	pub async fn refresh_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		self.token(StorageKey::RefreshToken).await
	}

	async fn token(&self, key: StorageKey) -> Result<Option<TokenSecret>, StoreError> {
		Ok(self.fetch(key).await?.filter(|value| !value.is_empty()).map(TokenSecret::from))
	}

	/// Returns the stored pair when both halves exist.
	pub async fn credentials(&self) -> Result<Option<CredentialPair>, StoreError> {
		let access = self.access_token().await?;
		let refresh = self.refresh_token().await?;

		Ok(access.zip(refresh).map(|(access_token, refresh_token)| CredentialPair {
			access_token,
			refresh_token,
		}))
	}

	/// Returns the full session when a credential pair exists.
	pub async fn session(&self) -> Result<Option<Session>, StoreError> {
		let Some(credentials) = self.credentials().await? else {
			return Ok(None);
		};
		let user = self.fetch(StorageKey::User).await?;

		Ok(Some(Session { credentials, user }))
	}

	/// Writes both tokens and the user blob, removing a stale user when none is given.
	pub async fn save_session(&self, session: &Session) -> Result<(), StoreError> {
		self.save(StorageKey::AccessToken, session.credentials.access_token.expose().into())
			.await?;
		self.save(StorageKey::RefreshToken, session.credentials.refresh_token.expose().into())
			.await?;

		match &session.user {
			Some(user) => self.save(StorageKey::User, user.clone()).await,
			None => self.remove(StorageKey::User).await,
		}
	}

	/// Stores a refreshed access token, rotating the refresh token only when one was issued.
	pub async fn rotate(
		&self,
		access_token: &TokenSecret,
		refresh_token: Option<&TokenSecret>,
	) -> Result<(), StoreError> {
		self.save(StorageKey::AccessToken, access_token.expose().into()).await?;

		if let Some(refresh_token) = refresh_token {
			self.save(StorageKey::RefreshToken, refresh_token.expose().into()).await?;
		}

		Ok(())
	}
}

/// Fixed names under which session values are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKey {
	/// `access_token`.
	AccessToken,
	/// `refresh_token`.
	RefreshToken,
	/// `user`.
	User,
}
impl StorageKey {
	/// Every key, in the order they are cleared.
	pub const ALL: [StorageKey; 3] = [Self::AccessToken, Self::RefreshToken, Self::User];

	/// Returns the persisted key name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AccessToken => "access_token",
			Self::RefreshToken => "refresh_token",
			Self::User => "user",
		}
	}
}
impl Display for StorageKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_client_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let client_error: Error = store_error.clone().into();

		assert!(matches!(client_error, Error::Storage(_)));
		assert!(client_error.to_string().contains("disk unavailable"));

		let source = StdError::source(&client_error)
			.expect("Client error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn storage_keys_use_fixed_names() {
		let names: Vec<_> = StorageKey::ALL.iter().map(|key| key.as_str()).collect();

		assert_eq!(names, ["access_token", "refresh_token", "user"]);
		assert_eq!(
			serde_json::to_string(&StorageKey::RefreshToken)
				.expect("StorageKey should serialize to JSON."),
			"\"refresh_token\"",
		);
	}

	#[tokio::test]
	async fn rotate_keeps_previous_refresh_token_when_none_issued() {
		let backend = MemoryStore::default();
		let store: &dyn SessionStore = &backend;

		store.save_session(&Session::new("old", "refresh-1")).await.expect("Seed should save.");
		store.rotate(&TokenSecret::new("new"), None).await.expect("Rotation should save.");

		let pair = store
			.credentials()
			.await
			.expect("Fetch should succeed.")
			.expect("Pair should remain present.");

		assert_eq!(pair, CredentialPair::new("new", "refresh-1"));
	}

	#[tokio::test]
	async fn partial_state_is_not_a_credential_pair() {
		let backend = MemoryStore::default();
		let store: &dyn SessionStore = &backend;

		store
			.save(StorageKey::AccessToken, "orphan".into())
			.await
			.expect("Access token should save.");

		assert!(store.credentials().await.expect("Fetch should succeed.").is_none());
		assert!(store.session().await.expect("Fetch should succeed.").is_none());
	}

	#[tokio::test]
	async fn empty_tokens_are_treated_as_absent() {
		let backend = MemoryStore::default();
		let store: &dyn SessionStore = &backend;

		store.save_session(&Session::new("", "")).await.expect("Seed should save.");

		assert!(store.access_token().await.expect("Fetch should succeed.").is_none());
		assert!(store.refresh_token().await.expect("Fetch should succeed.").is_none());
		assert!(store.credentials().await.expect("Fetch should succeed.").is_none());
	}
}
