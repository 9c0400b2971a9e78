//! Transport primitives for dashboard API calls.
//!
//! The module exposes [`HttpTransport`] alongside the transport-agnostic
//! [`ApiRequest`]/[`HttpResponse`] pair so tests and embedders can swap the HTTP stack
//! without touching the refresh-and-retry logic in [`client`](crate::client).

mod request;
mod response;

pub use request::*;
pub use response::*;

// self
use crate::{_prelude::*, error::NetworkError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, NetworkError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a fully resolved [`ApiRequest`].
///
/// Implementations return every HTTP response, including non-2xx ones, as `Ok`; only
/// transport failures (DNS, TCP, TLS, body streaming) map to [`NetworkError`]. The
/// returned future must be `Send` so client futures can hop executors.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and buffers the full response.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	fn build(&self, request: ApiRequest) -> Result<reqwest::RequestBuilder, NetworkError> {
		let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
			.map_err(NetworkError::network)?;
		let mut builder = self.0.request(method, request.url);

		for (name, value) in request.headers.iter() {
			builder = builder.header(name, value);
		}

		builder = match request.body {
			RequestBody::Empty => builder,
			RequestBody::Json(value) =>
				builder.body(serde_json::to_vec(&value).map_err(NetworkError::network)?),
			RequestBody::Text(text) => builder.body(text),
			RequestBody::Bytes(bytes) => builder.body(bytes),
			RequestBody::Multipart(form) => builder.multipart(multipart_form(form)?),
		};

		Ok(builder)
	}
}
#[cfg(feature = "reqwest")]
impl std::ops::Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let response = self.build(request)?.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)))
				.collect::<Headers>();
			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn multipart_form(form: MultipartForm) -> Result<reqwest::multipart::Form, NetworkError> {
	let mut out = reqwest::multipart::Form::new();

	for part in form.parts {
		let mut field = reqwest::multipart::Part::bytes(part.data);

		if let Some(file_name) = part.file_name {
			field = field.file_name(file_name);
		}
		if let Some(mime) = part.mime {
			field = field.mime_str(&mime).map_err(NetworkError::network)?;
		}

		out = out.part(part.name, field);
	}

	Ok(out)
}
