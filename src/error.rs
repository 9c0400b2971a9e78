//! Client-level error types shared across the request, refresh, and storage layers.

// self
use crate::{_prelude::*, http::ResponseBody};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; never retried.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS) with the original cause attached.
	#[error(transparent)]
	Network(#[from] NetworkError),
	/// Token refresh failed; stored credentials have been cleared.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Non-2xx response after recovery was exhausted or not applicable.
	#[error(transparent)]
	Http(#[from] HttpError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Response body did not match the requested type.
	#[error("Response body could not be decoded at `{}`.", .source.path())]
	Decode {
		/// Structured decoding failure carrying the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns the HTTP status code associated with the failure, when one exists.
	pub fn status_code(&self) -> Option<u16> {
		match self {
			Self::Http(e) => Some(e.status),
			Self::Auth(e) => e.status,
			_ => None,
		}
	}

	/// Returns a stable label identifying the error family.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Config(_) => "ConfigError",
			Self::Network(_) => "NetworkError",
			Self::Auth(_) => "AuthError",
			Self::Http(_) => "HTTPError",
			Self::Storage(_) => "StorageError",
			Self::Decode { .. } => "DecodeError",
		}
	}

	/// Returns the raw response payload attached to the failure, if any.
	pub fn body(&self) -> Option<&ResponseBody> {
		match self {
			Self::Http(e) => Some(&e.body),
			Self::Auth(e) => e.body.as_ref(),
			_ => None,
		}
	}

	/// Whether the caller should send the user back through the login flow.
	pub fn requires_login(&self) -> bool {
		matches!(self, Self::Auth(_) | Self::Config(ConfigError::MissingRefreshToken))
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// No base URL has been configured.
	#[error("API base URL is not configured.")]
	MissingBaseUrl,
	/// The configured base URL cannot be parsed.
	#[error("API base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The endpoint produced an unparsable URL when joined with the base.
	#[error("Endpoint `{endpoint}` does not form a valid URL.")]
	InvalidEndpoint {
		/// Endpoint path supplied by the caller.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A refresh was required but no refresh token is stored.
	#[error("No refresh token is available.")]
	MissingRefreshToken,
}

/// Refresh failure shared by every caller waiting on the same refresh.
#[derive(Clone, Debug, ThisError)]
#[error("Token refresh failed: {message}.")]
pub struct AuthError {
	/// HTTP status of the refresh response, when one was received.
	pub status: Option<u16>,
	/// Human-readable failure summary.
	pub message: String,
	/// Parsed refresh response payload, when one was received.
	pub body: Option<ResponseBody>,
}

/// Non-2xx response surfaced to the caller.
#[derive(Clone, Debug, ThisError)]
#[error("Request failed with status {status}: {message}")]
pub struct HttpError {
	/// HTTP status code.
	pub status: u16,
	/// Best-effort message extracted from the response body.
	pub message: String,
	/// Upstream error label (`error` field) or `HTTPError`.
	pub kind: String,
	/// Parsed response payload.
	pub body: ResponseBody,
}
impl HttpError {
	/// Builds an error from a status code and its parsed body.
	pub fn from_body(status: u16, body: ResponseBody) -> Self {
		let message = body.message().unwrap_or_else(|| fallback_message(status));
		let kind = body.error_label().unwrap_or_else(|| "HTTPError".into());

		Self { status, message, kind, body }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum NetworkError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl NetworkError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for NetworkError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

pub(crate) fn fallback_message(status: u16) -> String {
	format!("Request failed with status {status}.")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn http_error_prefers_message_then_error_then_text() {
		let json = ResponseBody::Json(serde_json::json!({
			"message": "Coupon code already exists",
			"error": "Conflict",
		}));
		let err = HttpError::from_body(409, json);

		assert_eq!(err.message, "Coupon code already exists");
		assert_eq!(err.kind, "Conflict");

		let err = HttpError::from_body(422, ResponseBody::Json(serde_json::json!({ "error": "Bad" })));

		assert_eq!(err.message, "Bad");

		let err = HttpError::from_body(503, ResponseBody::Text("Service Unavailable".into()));

		assert_eq!(err.message, "Service Unavailable");
		assert_eq!(err.kind, "HTTPError");

		let err = HttpError::from_body(500, ResponseBody::Empty);

		assert_eq!(err.message, "Request failed with status 500.");
	}

	#[test]
	fn error_accessors_expose_status_and_kind() {
		let err = Error::from(HttpError::from_body(404, ResponseBody::Empty));

		assert_eq!(err.status_code(), Some(404));
		assert_eq!(err.kind(), "HTTPError");
		assert!(err.body().is_some());
		assert!(!err.requires_login());

		let err = Error::from(AuthError { status: Some(400), message: "nope".into(), body: None });

		assert_eq!(err.status_code(), Some(400));
		assert_eq!(err.kind(), "AuthError");
		assert!(err.requires_login());

		let err = Error::from(ConfigError::MissingBaseUrl);

		assert_eq!(err.status_code(), None);
		assert_eq!(err.kind(), "ConfigError");
	}

	#[test]
	fn network_error_keeps_source() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
		let err = Error::from(NetworkError::network(io));
		let source = StdError::source(&err).expect("Network error should expose its cause.");

		assert_eq!(source.to_string(), "refused");
		assert_eq!(err.kind(), "NetworkError");
	}
}
