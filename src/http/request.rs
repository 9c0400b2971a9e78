//! Transport-agnostic request descriptor.

// self
use crate::_prelude::*;

/// HTTP verbs used by the dashboard's CRUD services.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`.
	#[default]
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
	/// `HEAD`.
	Head,
	/// `OPTIONS`.
	Options,
}
impl Method {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
			Self::Head => "HEAD",
			Self::Options => "OPTIONS",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Method {
	type Err = UnknownMethod;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"GET" => Ok(Self::Get),
			"POST" => Ok(Self::Post),
			"PUT" => Ok(Self::Put),
			"PATCH" => Ok(Self::Patch),
			"DELETE" => Ok(Self::Delete),
			"HEAD" => Ok(Self::Head),
			"OPTIONS" => Ok(Self::Options),
			_ => Err(UnknownMethod(s.to_owned())),
		}
	}
}

/// Returned when parsing an unsupported verb.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unsupported HTTP method `{0}`.")]
pub struct UnknownMethod(pub String);

/// Header map with case-insensitive names (stored lower-cased).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);
impl Headers {
	/// Sets `name` to `value`, replacing any previous value.
	pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
		self.0.insert(name.as_ref().to_ascii_lowercase(), value.into());
	}

	/// Returns the value for `name`.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Removes `name`.
	pub fn remove(&mut self, name: &str) -> Option<String> {
		self.0.remove(&name.to_ascii_lowercase())
	}

	/// Whether `name` is present.
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(&name.to_ascii_lowercase())
	}

	/// Applies every entry of `other` on top of `self`.
	pub fn merge(&mut self, other: &Headers) {
		for (name, value) in &other.0 {
			self.0.insert(name.clone(), value.clone());
		}
	}

	/// Iterates over `(name, value)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
	}

	/// Number of headers.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether no headers are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<K, V> FromIterator<(K, V)> for Headers
where
	K: AsRef<str>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut headers = Self::default();

		for (name, value) in iter {
			headers.insert(name, value);
		}

		headers
	}
}

/// One field of a multipart form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartPart {
	/// Form field name.
	pub name: String,
	/// Raw field content.
	pub data: Vec<u8>,
	/// File name, for upload fields.
	pub file_name: Option<String>,
	/// MIME type of the content.
	pub mime: Option<String>,
}

/// Multipart payload (e.g. product image uploads).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartForm {
	/// Fields in submission order.
	pub parts: Vec<MultipartPart>,
}
impl MultipartForm {
	/// Adds a plain text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.parts.push(MultipartPart {
			name: name.into(),
			data: value.into().into_bytes(),
			file_name: None,
			mime: None,
		});

		self
	}

	/// Adds a file field.
	pub fn file(
		mut self,
		name: impl Into<String>,
		file_name: impl Into<String>,
		mime: impl Into<String>,
		data: impl Into<Vec<u8>>,
	) -> Self {
		self.parts.push(MultipartPart {
			name: name.into(),
			data: data.into(),
			file_name: Some(file_name.into()),
			mime: Some(mime.into()),
		});

		self
	}
}

/// Request payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// JSON document, serialized by the transport.
	Json(JsonValue),
	/// Pre-serialized text sent as-is.
	Text(String),
	/// Raw binary payload; the transport decides the content type.
	Bytes(Vec<u8>),
	/// Multipart form; the transport sets the boundary.
	Multipart(MultipartForm),
}
impl RequestBody {
	/// Whether the default JSON content type must be left off so the transport can set it.
	pub fn sets_own_content_type(&self) -> bool {
		matches!(self, Self::Bytes(_) | Self::Multipart(_))
	}
}

/// Fully resolved outbound request handed to an [`HttpTransport`](crate::http::HttpTransport).
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Final header set.
	pub headers: Headers,
	/// Payload.
	pub body: RequestBody,
}

/// Caller-controlled knobs for [`ApiClient::request`](crate::client::ApiClient::request).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOptions {
	/// HTTP verb; defaults to `GET`.
	pub method: Method,
	/// Headers applied after the client defaults.
	pub headers: Headers,
	/// Payload.
	pub body: RequestBody,
}
impl RequestOptions {
	/// Options for a bare `GET`.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the verb.
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;

		self
	}

	/// Adds or replaces a header.
	pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets a JSON body.
	pub fn json(mut self, value: JsonValue) -> Self {
		self.body = RequestBody::Json(value);

		self
	}

	/// Sets a pre-serialized text body.
	pub fn text(mut self, value: impl Into<String>) -> Self {
		self.body = RequestBody::Text(value.into());

		self
	}

	/// Sets a raw binary body.
	pub fn bytes(mut self, value: impl Into<Vec<u8>>) -> Self {
		self.body = RequestBody::Bytes(value.into());

		self
	}

	/// Sets a multipart body.
	pub fn multipart(mut self, form: MultipartForm) -> Self {
		self.body = RequestBody::Multipart(form);

		self
	}
}
