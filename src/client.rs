//! Authenticated request client with transparent refresh-and-retry.
//!
//! [`ApiClient::request`] resolves an endpoint against the configured base URL, attaches the
//! stored access token (except on login/refresh/logout endpoints), and on a 401 joins or
//! starts a single-flight refresh before replaying the request exactly once. Every failure
//! surfaces as a tagged [`Error`]; nothing is swallowed.

pub mod refresh;
pub mod singleflight;

pub use refresh::*;
pub use singleflight::{Flight, FlightRole, SingleFlight};

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{AuthObserver, ClearReason, Session, TokenSecret},
	config::ClientConfig,
	error::HttpError,
	http::{
		ApiRequest, Headers, HttpResponse, HttpTransport, Method, RequestBody, RequestOptions,
		ResponseBody,
	},
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::{SessionStore, StoreError},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient>;

/// Issues authenticated calls against the dashboard REST API.
///
/// Clones share the transport, the store, the observer, and the refresh coordinator, so a
/// 401 seen through any clone joins the same refresh. Independently constructed clients
/// never coordinate with each other.
pub struct ApiClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// HTTP transport used for every outbound call.
	pub http_client: Arc<C>,
	/// Session storage holding the token pair and user blob.
	pub store: Arc<dyn SessionStore>,
	/// Base URL and auth endpoint layout.
	pub config: ClientConfig,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	observer: Option<Arc<dyn AuthObserver>>,
	refresh_flight: Arc<SingleFlight<RefreshOutcome>>,
}
impl<C> ApiClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client over the caller-provided transport.
	pub fn with_http_client(
		config: ClientConfig,
		store: Arc<dyn SessionStore>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			store,
			config,
			refresh_metrics: Default::default(),
			observer: None,
			refresh_flight: Default::default(),
		}
	}

	/// Registers the observer notified whenever stored credentials are cleared.
	pub fn with_observer(mut self, observer: Arc<dyn AuthObserver>) -> Self {
		self.observer = Some(observer);

		self
	}

	/// Sends `options` to `endpoint` and returns the parsed body.
	pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<ResponseBody> {
		const KIND: CallKind = CallKind::Request;

		let span = CallSpan::new(KIND, "request");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.request_with_recovery(endpoint, &options)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Like [`request`](Self::request) but decodes the JSON body into `T`.
	pub async fn request_json<T>(&self, endpoint: &str, options: RequestOptions) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let body = self.request(endpoint, options).await?.into_json();

		serde_path_to_error::deserialize(body).map_err(|source| Error::Decode { source })
	}

	/// `GET endpoint`.
	pub async fn get(&self, endpoint: &str) -> Result<ResponseBody> {
		self.request(endpoint, RequestOptions::new()).await
	}

	/// `POST endpoint` with a JSON body.
	pub async fn post(&self, endpoint: &str, body: JsonValue) -> Result<ResponseBody> {
		self.request(endpoint, RequestOptions::new().method(Method::Post).json(body)).await
	}

	/// `PUT endpoint` with a JSON body.
	pub async fn put(&self, endpoint: &str, body: JsonValue) -> Result<ResponseBody> {
		self.request(endpoint, RequestOptions::new().method(Method::Put).json(body)).await
	}

	/// `PATCH endpoint` with a JSON body.
	pub async fn patch(&self, endpoint: &str, body: JsonValue) -> Result<ResponseBody> {
		self.request(endpoint, RequestOptions::new().method(Method::Patch).json(body)).await
	}

	/// `DELETE endpoint`.
	pub async fn delete(&self, endpoint: &str) -> Result<ResponseBody> {
		self.request(endpoint, RequestOptions::new().method(Method::Delete)).await
	}

	/// Persists the credentials returned by an external login call.
	pub async fn sign_in(&self, session: &Session) -> Result<()> {
		self.store.save_session(session).await?;

		Ok(())
	}

	/// Returns the stored session, if a full credential pair exists.
	pub async fn session(&self) -> Result<Option<Session>> {
		Ok(self.store.session().await?)
	}

	/// Whether an access token is stored.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.store.access_token().await?.is_some())
	}

	/// Signs out: tells the API (best effort), then clears stored credentials.
	///
	/// Failures of the logout call itself are logged and ignored; the local session is
	/// always wiped and the observer notified.
	pub async fn logout(&self) -> Result<()> {
		const KIND: CallKind = CallKind::Logout;

		let span = CallSpan::new(KIND, "logout");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let revoked = match self.store.refresh_token().await? {
					Some(refresh_token) => self.revoke_remote(&refresh_token).await,
					None => Ok(()),
				};

				if let Err(e) = revoked {
					obs::log_ignored_failure(KIND, &e);
				}

				self.clear_credentials(ClearReason::Logout).await?;

				Ok::<_, Error>(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn request_with_recovery(
		&self,
		endpoint: &str,
		options: &RequestOptions,
	) -> Result<ResponseBody> {
		let url = self.config.endpoint_url(endpoint)?;
		let auth_endpoint = self.config.is_auth_endpoint(endpoint);
		let token = if auth_endpoint { None } else { self.store.access_token().await? };
		let response = self.dispatch(&url, options, token.as_ref()).await?;

		if response.status == 401 && !auth_endpoint && token.is_some() {
			return self.retry_after_refresh(&url, options).await;
		}

		into_result(response)
	}

	async fn retry_after_refresh(&self, url: &Url, options: &RequestOptions) -> Result<ResponseBody> {
		const KIND: CallKind = CallKind::Retry;

		let token = self.refresh_access_token().await?;
		let span = CallSpan::new(KIND, "retry_after_refresh");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let response = match span.instrument(self.dispatch(url, options, Some(&token))).await {
			Ok(response) => response,
			Err(e) => {
				obs::record_call_outcome(KIND, CallOutcome::Failure);

				return Err(e);
			},
		};

		if response.is_success() {
			obs::record_call_outcome(KIND, CallOutcome::Success);

			return Ok(response.parse_body());
		}

		obs::record_call_outcome(KIND, CallOutcome::Failure);
		self.clear_credentials(ClearReason::RetryRejected).await?;

		Err(HttpError::from_body(response.status, response.parse_body()).into())
	}

	async fn revoke_remote(&self, refresh_token: &TokenSecret) -> Result<()> {
		let request = ApiRequest {
			method: Method::Post,
			url: self.config.logout_url()?,
			headers: default_headers(&RequestBody::Empty, None),
			body: refresh_token_body(refresh_token),
		};

		into_result(self.http_client.execute(request).await?).map(|_| ())
	}

	async fn dispatch(
		&self,
		url: &Url,
		options: &RequestOptions,
		token: Option<&TokenSecret>,
	) -> Result<HttpResponse> {
		let request = build_request(url.clone(), options, token);

		Ok(self.http_client.execute(request).await?)
	}

	/// Wipes every stored key and notifies the observer, even when the wipe itself fails.
	pub(crate) async fn clear_credentials(&self, reason: ClearReason) -> Result<(), StoreError> {
		let cleared = self.store.clear().await;

		obs::log_credentials_cleared(reason);
		obs::record_credentials_cleared(reason);

		if let Some(observer) = &self.observer {
			observer.credentials_cleared(reason);
		}

		cleared
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient> {
	/// Creates a client that provisions its own reqwest transport.
	pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Self {
		Self::with_http_client(config, store, ReqwestHttpClient::default())
	}

	/// Creates a reqwest-backed client configured from [`BASE_URL_ENV`](crate::config::BASE_URL_ENV).
	pub fn from_env(store: Arc<dyn SessionStore>) -> Result<Self> {
		Ok(Self::new(ClientConfig::from_env()?, store))
	}
}
impl<C> Clone for ApiClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			observer: self.observer.clone(),
			refresh_flight: self.refresh_flight.clone(),
		}
	}
}
impl<C> Debug for ApiClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("config", &self.config)
			.field("observer_set", &self.observer.is_some())
			.field("refresh_in_flight", &self.refresh_flight.is_in_flight())
			.finish()
	}
}

/// Default headers: JSON content type unless the body brings its own, then the bearer token.
fn default_headers(body: &RequestBody, token: Option<&TokenSecret>) -> Headers {
	let mut headers = Headers::default();

	if !body.sets_own_content_type() {
		headers.insert("content-type", "application/json");
	}
	if let Some(token) = token {
		headers.insert("authorization", token.bearer());
	}

	headers
}

fn build_request(url: Url, options: &RequestOptions, token: Option<&TokenSecret>) -> ApiRequest {
	let mut headers = default_headers(&options.body, token);

	headers.merge(&options.headers);

	ApiRequest { method: options.method, url, headers, body: options.body.clone() }
}

fn into_result(response: HttpResponse) -> Result<ResponseBody> {
	let body = response.parse_body();

	if response.is_success() {
		Ok(body)
	} else {
		Err(HttpError::from_body(response.status, body).into())
	}
}

pub(crate) fn refresh_token_body(refresh_token: &TokenSecret) -> RequestBody {
	RequestBody::Json(serde_json::json!({ "refreshToken": refresh_token.expose() }))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::http::MultipartForm;

	fn url() -> Url {
		Url::parse("https://shop.example.com/api/v1/products").expect("URL fixture should parse.")
	}

	#[test]
	fn bearer_and_json_content_type_are_defaults() {
		let token = TokenSecret::new("access-1");
		let request = build_request(url(), &RequestOptions::new(), Some(&token));

		assert_eq!(request.method, Method::Get);
		assert_eq!(request.headers.get("authorization"), Some("Bearer access-1"));
		assert_eq!(request.headers.get("content-type"), Some("application/json"));
	}

	#[test]
	fn caller_headers_are_applied_last() {
		let options = RequestOptions::new()
			.header("Content-Type", "text/csv")
			.header("X-Store-Id", "42");
		let request = build_request(url(), &options, None);

		assert_eq!(request.headers.get("content-type"), Some("text/csv"));
		assert_eq!(request.headers.get("x-store-id"), Some("42"));
		assert!(!request.headers.contains("authorization"));
	}

	#[test]
	fn multipart_bodies_leave_content_type_to_the_transport() {
		let form = MultipartForm::default().file("image", "shoe.png", "image/png", vec![0_u8; 4]);
		let options = RequestOptions::new().method(Method::Post).multipart(form);
		let request = build_request(url(), &options, Some(&TokenSecret::new("t")));

		assert!(!request.headers.contains("content-type"));
		assert_eq!(request.headers.get("authorization"), Some("Bearer t"));
	}

	#[test]
	fn non_success_responses_become_http_errors() {
		let err = into_result(HttpResponse::new(404, r#"{"message":"Product not found"}"#))
			.expect_err("404 should surface as an error.");

		match err {
			Error::Http(e) => {
				assert_eq!(e.status, 404);
				assert_eq!(e.message, "Product not found");
			},
			other => panic!("Unexpected error: {other:?}"),
		}

		let ok = into_result(HttpResponse::new(200, "plain text"))
			.expect("2xx text bodies should be returned.");

		assert_eq!(ok, ResponseBody::Text("plain text".into()));
	}
}
