//! Raw responses and the parsed body handed back to callers.

// self
use crate::{_prelude::*, http::Headers};

/// Response as returned by an [`HttpTransport`](crate::http::HttpTransport).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: Headers,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates a response from a status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: Headers::default(), body: body.into() }
	}

	/// Whether the status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Parses the body, falling back to text when it is not JSON.
	pub fn parse_body(&self) -> ResponseBody {
		ResponseBody::parse(&self.body)
	}
}

/// Parsed response payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ResponseBody {
	/// Zero-length body.
	#[default]
	Empty,
	/// Body parsed as JSON.
	Json(JsonValue),
	/// Body that was not valid JSON, kept verbatim.
	Text(String),
}
impl ResponseBody {
	/// Parses raw bytes, preserving non-JSON payloads as text.
	pub fn parse(bytes: &[u8]) -> Self {
		if bytes.is_empty() {
			return Self::Empty;
		}

		match serde_json::from_slice(bytes) {
			Ok(value) => Self::Json(value),
			Err(_) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
		}
	}

	/// Returns the JSON value, if the body was JSON.
	pub fn as_json(&self) -> Option<&JsonValue> {
		match self {
			Self::Json(value) => Some(value),
			_ => None,
		}
	}

	/// Converts into a JSON value; text becomes a JSON string and empty becomes `null`.
	pub fn into_json(self) -> JsonValue {
		match self {
			Self::Empty => JsonValue::Null,
			Self::Json(value) => value,
			Self::Text(text) => JsonValue::String(text),
		}
	}

	/// Returns the text, if the body was not JSON.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Whether the body was empty.
	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Empty)
	}

	/// Best-effort human-readable message: `message`, then `error`, then the raw text.
	pub fn message(&self) -> Option<String> {
		match self {
			Self::Json(value) => string_field(value, "message").or_else(|| string_field(value, "error")),
			Self::Text(text) => Some(text.trim()).filter(|t| !t.is_empty()).map(str::to_owned),
			Self::Empty => None,
		}
	}

	/// Upstream error label from the JSON `error` field.
	pub fn error_label(&self) -> Option<String> {
		self.as_json().and_then(|value| string_field(value, "error"))
	}
}

fn string_field(value: &JsonValue, field: &str) -> Option<String> {
	value
		.get(field)
		.and_then(JsonValue::as_str)
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_owned)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parse_falls_back_to_text() {
		assert_eq!(ResponseBody::parse(b""), ResponseBody::Empty);
		assert_eq!(
			ResponseBody::parse(br#"{"items":[],"total":0}"#),
			ResponseBody::Json(serde_json::json!({ "items": [], "total": 0 })),
		);
		assert_eq!(
			ResponseBody::parse(b"Service Unavailable"),
			ResponseBody::Text("Service Unavailable".into()),
		);
	}

	#[test]
	fn message_ignores_non_string_fields() {
		let body = ResponseBody::Json(serde_json::json!({ "message": ["a", "b"], "error": "Bad Request" }));

		assert_eq!(body.message().as_deref(), Some("Bad Request"));
		assert_eq!(ResponseBody::Text("  \n".into()).message(), None);
	}

	#[test]
	fn success_range_is_2xx() {
		assert!(HttpResponse::new(204, Vec::new()).is_success());
		assert!(!HttpResponse::new(301, Vec::new()).is_success());
		assert!(!HttpResponse::new(401, Vec::new()).is_success());
	}
}
