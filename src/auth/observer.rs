//! Notification hook for session holders that must react when credentials are wiped.

// self
use crate::_prelude::*;

/// Why the client cleared the stored credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClearReason {
	/// The refresh endpoint rejected the refresh token or returned no access token.
	RefreshFailed,
	/// A refresh was needed but no refresh token was stored.
	MissingRefreshToken,
	/// The request retried with a fresh access token still failed.
	RetryRejected,
	/// The caller signed out explicitly.
	Logout,
}
impl ClearReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ClearReason::RefreshFailed => "refresh_failed",
			ClearReason::MissingRefreshToken => "missing_refresh_token",
			ClearReason::RetryRejected => "retry_rejected",
			ClearReason::Logout => "logout",
		}
	}
}
impl Display for ClearReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Receives a notification every time the client wipes `access_token`, `refresh_token`, and
/// `user` from its store.
///
/// Application-wide session holders implement this so they can drop their cached user and
/// redirect to login without the request layer depending on them.
pub trait AuthObserver: Send + Sync {
	/// Called after the store has been cleared.
	fn credentials_cleared(&self, reason: ClearReason);
}
impl<F> AuthObserver for F
where
	F: Fn(ClearReason) + Send + Sync,
{
	fn credentials_cleared(&self, reason: ClearReason) {
		self(reason)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn closures_act_as_observers() {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = seen.clone();
		let observer: Arc<dyn AuthObserver> =
			Arc::new(move |reason: ClearReason| sink.lock().push(reason));

		observer.credentials_cleared(ClearReason::Logout);

		assert_eq!(*seen.lock(), vec![ClearReason::Logout]);
		assert_eq!(ClearReason::RetryRejected.to_string(), "retry_rejected");
	}
}
