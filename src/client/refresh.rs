//! Refresh-token exchange shared by every request that hits a 401.
//!
//! The first caller to need a refresh starts the exchange through the client's
//! [`SingleFlight`](crate::client::SingleFlight); concurrent callers join it and receive the
//! same new access token or the same failure. A rejected refresh wipes the stored session
//! and notifies the observer exactly once, from inside the shared exchange.

mod metrics;

pub use metrics::{RefreshMetrics, RefreshStats};

// self
use crate::{
	_prelude::*,
	auth::{ClearReason, TokenSecret},
	client::{ApiClient, FlightRole, refresh::metrics::RefreshEvent, refresh_token_body},
	error::{AuthError, ConfigError, fallback_message},
	http::{ApiRequest, Headers, HttpTransport, Method, ResponseBody},
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::StoreError,
};

/// Result of one shared refresh exchange.
pub type RefreshOutcome = Result<TokenSecret, RefreshFailure>;

/// Cloneable refresh failure delivered to every waiter of a shared exchange.
#[derive(Clone, Debug, ThisError)]
pub enum RefreshFailure {
	/// Missing base URL or missing refresh token.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The refresh endpoint rejected the exchange.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// The session store failed while reading or rotating tokens.
	#[error(transparent)]
	Storage(#[from] StoreError),
}
impl From<RefreshFailure> for Error {
	fn from(failure: RefreshFailure) -> Self {
		match failure {
			RefreshFailure::Config(e) => e.into(),
			RefreshFailure::Auth(e) => e.into(),
			RefreshFailure::Storage(e) => e.into(),
		}
	}
}

/// Success payload of the refresh endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	refresh_token: Option<String>,
}
impl RefreshResponse {
	/// Extracts the rotated tokens; `None` when `access_token` is absent or blank.
	fn tokens(body: &ResponseBody) -> Option<(TokenSecret, Option<TokenSecret>)> {
		let response = RefreshResponse::deserialize(body.as_json()?).ok()?;
		let access = response.access_token.filter(|token| !token.is_empty())?;
		let refresh = response.refresh_token.filter(|token| !token.is_empty());

		Some((TokenSecret::new(access), refresh.map(TokenSecret::new)))
	}
}

impl<C> ApiClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Exchanges the stored refresh token for a new access token.
	///
	/// Joins the refresh already in flight for this client when there is one. The exchange is
	/// owned by the flight rather than by the caller that started it, so it keeps going for the
	/// remaining waiters if that caller is dropped.
	pub async fn refresh_access_token(&self) -> Result<TokenSecret> {
		let client = self.clone();
		let (flight, role) =
			self.refresh_flight.join(move || async move { client.perform_refresh().await });

		if role == FlightRole::Follower {
			self.refresh_metrics.record(RefreshEvent::Joined);
		}

		flight.await.map_err(Error::from)
	}

	async fn perform_refresh(&self) -> RefreshOutcome {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "refresh_access_token");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.refresh_metrics.record(RefreshEvent::Started);

		let result = span.instrument(self.exchange_refresh_token()).await;

		match &result {
			Ok(_) => {
				obs::record_call_outcome(KIND, CallOutcome::Success);
				self.refresh_metrics.record(RefreshEvent::Succeeded);
			},
			Err(_) => {
				obs::record_call_outcome(KIND, CallOutcome::Failure);
				self.refresh_metrics.record(RefreshEvent::Failed);
			},
		}

		result
	}

	async fn exchange_refresh_token(&self) -> RefreshOutcome {
		let url = self.config.refresh_url()?;
		let Some(refresh_token) = self.store.refresh_token().await? else {
			self.clear_credentials(ClearReason::MissingRefreshToken).await?;

			return Err(ConfigError::MissingRefreshToken.into());
		};
		let mut headers = Headers::default();

		headers.insert("content-type", "application/json");

		let request =
			ApiRequest { method: Method::Post, url, headers, body: refresh_token_body(&refresh_token) };
		let response = match self.http_client.execute(request).await {
			Ok(response) => response,
			Err(e) =>
				return self
					.reject(AuthError {
						status: None,
						message: format!("refresh request could not be sent ({e})"),
						body: None,
					})
					.await,
		};
		let body = response.parse_body();

		if !response.is_success() {
			let message = body.message().unwrap_or_else(|| fallback_message(response.status));

			return self
				.reject(AuthError { status: Some(response.status), message, body: Some(body) })
				.await;
		}

		let Some((access_token, rotated_refresh)) = RefreshResponse::tokens(&body) else {
			return self
				.reject(AuthError {
					status: Some(response.status),
					message: "refresh response is missing access_token".into(),
					body: Some(body),
				})
				.await;
		};

		self.store.rotate(&access_token, rotated_refresh.as_ref()).await?;

		Ok(access_token)
	}

	async fn reject(&self, error: AuthError) -> RefreshOutcome {
		self.clear_credentials(ClearReason::RefreshFailed).await?;

		Err(error.into())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn tokens_require_non_empty_access_token() {
		let body = ResponseBody::Json(serde_json::json!({ "access_token": "a", "refresh_token": "r" }));
		let (access, refresh) = RefreshResponse::tokens(&body).expect("Tokens should parse.");

		assert_eq!(access.expose(), "a");
		assert_eq!(refresh.as_ref().map(TokenSecret::expose), Some("r"));

		let body = ResponseBody::Json(serde_json::json!({ "access_token": "a" }));

		assert!(RefreshResponse::tokens(&body).is_some_and(|(_, refresh)| refresh.is_none()));

		for missing in [
			ResponseBody::Json(serde_json::json!({ "accessToken": "camel" })),
			ResponseBody::Json(serde_json::json!({ "access_token": "" })),
			ResponseBody::Json(serde_json::json!({ "access_token": 5 })),
			ResponseBody::Text("ok".into()),
			ResponseBody::Empty,
		] {
			assert!(RefreshResponse::tokens(&missing).is_none(), "{missing:?} should be rejected");
		}
	}

	#[test]
	fn refresh_failures_map_onto_client_errors() {
		let err = Error::from(RefreshFailure::Config(ConfigError::MissingRefreshToken));

		assert!(matches!(err, Error::Config(ConfigError::MissingRefreshToken)));

		let err = Error::from(RefreshFailure::Auth(AuthError {
			status: Some(400),
			message: "invalid refresh token".into(),
			body: None,
		}));

		assert_eq!(err.kind(), "AuthError");
		assert_eq!(err.to_string(), "Token refresh failed: invalid refresh token.");
	}
}
