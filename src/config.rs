//! Client configuration: base URL, auth endpoint paths, and environment loading.
//!
//! The base URL is optional at construction time so a client can be built before the
//! environment is known; [`ClientConfig::endpoint_url`] reports the absence as
//! [`ConfigError::MissingBaseUrl`] on the first request instead.

// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable consulted by [`ClientConfig::from_env`].
pub const BASE_URL_ENV: &str = "API_BASE_URL";
/// Default refresh endpoint path.
pub const DEFAULT_REFRESH_PATH: &str = "/api/v1/auth/refresh";
/// Default logout endpoint path.
pub const DEFAULT_LOGOUT_PATH: &str = "/api/v1/auth/logout";
/// Path fragments that mark an endpoint as an authentication endpoint.
pub const DEFAULT_AUTH_ENDPOINT_MARKERS: [&str; 3] = ["/auth/login", "/auth/refresh", "/auth/logout"];

/// Resolved settings for an [`ApiClient`](crate::client::ApiClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// API origin every endpoint is appended to.
	pub base_url: Option<Url>,
	/// Path of the refresh endpoint.
	pub refresh_path: String,
	/// Path of the logout endpoint.
	pub logout_path: String,
	/// Endpoints containing any of these fragments never carry a bearer token.
	pub auth_endpoint_markers: Vec<String>,
}
impl ClientConfig {
	/// Returns a builder seeded with the default auth endpoint layout.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Loads the base URL from [`BASE_URL_ENV`]; unset or blank leaves it unconfigured.
	pub fn from_env() -> Result<Self, ConfigError> {
		let builder = Self::builder();
		let builder = match std::env::var(BASE_URL_ENV) {
			Ok(value) if !value.trim().is_empty() => builder.base_url(value.trim())?,
			_ => builder,
		};

		Ok(builder.build())
	}

	/// Returns `true` when `endpoint` is a login, refresh, or logout path.
	pub fn is_auth_endpoint(&self, endpoint: &str) -> bool {
		self.auth_endpoint_markers.iter().any(|marker| endpoint.contains(marker.as_str()))
	}

	/// Joins `endpoint` onto the configured base URL.
	pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, ConfigError> {
		let base = self.base_url.as_ref().ok_or(ConfigError::MissingBaseUrl)?;
		let base = base.as_str().trim_end_matches('/');
		let joined = if endpoint.starts_with('/') {
			format!("{base}{endpoint}")
		} else {
			format!("{base}/{endpoint}")
		};

		Url::parse(&joined)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: endpoint.to_owned(), source })
	}

	/// Absolute URL of the refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url, ConfigError> {
		self.endpoint_url(&self.refresh_path)
	}

	/// Absolute URL of the logout endpoint.
	pub fn logout_url(&self) -> Result<Url, ConfigError> {
		self.endpoint_url(&self.logout_path)
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self::builder().build()
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// API origin.
	pub base_url: Option<Url>,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Logout endpoint path.
	pub logout_path: String,
	/// Auth endpoint fragments.
	pub auth_endpoint_markers: Vec<String>,
}
impl ClientConfigBuilder {
	/// Parses and sets the base URL.
	pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self, ConfigError> {
		let url =
			Url::parse(url.as_ref()).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		self.base_url = Some(url);

		Ok(self)
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the logout endpoint path.
	pub fn logout_path(mut self, path: impl Into<String>) -> Self {
		self.logout_path = path.into();

		self
	}

	/// Adds another fragment that marks an endpoint as an auth endpoint.
	pub fn auth_endpoint_marker(mut self, marker: impl Into<String>) -> Self {
		self.auth_endpoint_markers.push(marker.into());

		self
	}

	/// Finalizes the configuration.
	pub fn build(self) -> ClientConfig {
		ClientConfig {
			base_url: self.base_url,
			refresh_path: self.refresh_path,
			logout_path: self.logout_path,
			auth_endpoint_markers: self.auth_endpoint_markers,
		}
	}
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: None,
			refresh_path: DEFAULT_REFRESH_PATH.into(),
			logout_path: DEFAULT_LOGOUT_PATH.into(),
			auth_endpoint_markers: DEFAULT_AUTH_ENDPOINT_MARKERS.iter().map(|m| m.to_string()).collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config(base: &str) -> ClientConfig {
		ClientConfig::builder().base_url(base).expect("Base URL fixture should parse.").build()
	}

	#[test]
	fn endpoint_url_requires_base_url() {
		let err = ClientConfig::default()
			.endpoint_url("/api/v1/products")
			.expect_err("Missing base URL must be a configuration error.");

		assert_eq!(err, ConfigError::MissingBaseUrl);
	}

	#[test]
	fn endpoint_url_joins_without_double_slashes() {
		let with_slash = config("https://shop.example.com/");
		let without_slash = config("https://shop.example.com");

		assert_eq!(
			with_slash.endpoint_url("/api/v1/orders?page=2").map(String::from).ok(),
			Some("https://shop.example.com/api/v1/orders?page=2".into()),
		);
		assert_eq!(
			without_slash.endpoint_url("api/v1/orders").map(String::from).ok(),
			Some("https://shop.example.com/api/v1/orders".into()),
		);
		assert_eq!(
			without_slash.refresh_url().map(String::from).ok(),
			Some("https://shop.example.com/api/v1/auth/refresh".into()),
		);
	}

	#[test]
	fn base_url_must_parse() {
		let err = ClientConfig::builder()
			.base_url("not a url")
			.expect_err("Garbage base URL should be rejected.");

		assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
	}

	#[test]
	fn auth_endpoints_are_detected_by_fragment() {
		let config = ClientConfig::default();

		assert!(config.is_auth_endpoint("/api/v1/auth/login"));
		assert!(config.is_auth_endpoint("/api/v1/auth/refresh"));
		assert!(config.is_auth_endpoint("/api/v2/auth/logout?all=true"));
		assert!(!config.is_auth_endpoint("/api/v1/auth/me"));
		assert!(!config.is_auth_endpoint("/api/v1/products"));

		let config = ClientConfig::builder().auth_endpoint_marker("/auth/register").build();

		assert!(config.is_auth_endpoint("/api/v1/auth/register"));
	}
}
