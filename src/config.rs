//! Admin endpoint configuration and HTTP client construction.

// self
use crate::{
	_prelude::*,
	auth::{AdminCredentials, Secret},
	error::ConfigError,
	http::ReqwestHttpClient,
};

/// Environment variable holding the admin API base URL.
pub const ENV_ADMIN_URL: &str = "HYDRA_ADMIN_URL";
/// Legacy fallback for [`ENV_ADMIN_URL`].
pub const ENV_CLUSTER_URL: &str = "HYDRA_CLUSTER_URL";
/// Environment variable toggling TLS certificate verification.
pub const ENV_SKIP_TLS_VERIFY: &str = "HYDRA_SKIP_TLS_VERIFY";
/// Environment variable holding the admin client identifier.
pub const ENV_CLIENT_ID: &str = "HYDRA_CLIENT_ID";
/// Environment variable holding the admin client secret.
pub const ENV_CLIENT_SECRET: &str = "HYDRA_CLIENT_SECRET";
/// Environment variable holding the token endpoint; defaults to `{admin_url}/oauth2/token`.
pub const ENV_TOKEN_URL: &str = "HYDRA_TOKEN_URL";

/// Validated connection settings for the admin API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminConfig {
	/// Base URL every admin path is joined onto.
	pub admin_url: Url,
	/// Accept invalid TLS certificates (development clusters only).
	pub skip_tls_verify: bool,
	/// Credentials for bearer authentication; requests are sent anonymously when absent.
	pub credentials: Option<AdminCredentials>,
}
impl AdminConfig {
	/// Starts a builder for the given admin base URL.
	pub fn builder(admin_url: Url) -> AdminConfigBuilder {
		AdminConfigBuilder::new(admin_url)
	}

	/// Reads the configuration from process environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads the configuration through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
		let raw_url = non_empty(ENV_ADMIN_URL)
			.or_else(|| non_empty(ENV_CLUSTER_URL))
			.ok_or(ConfigError::MissingEnv { name: ENV_ADMIN_URL })?;
		let admin_url = Url::parse(raw_url.trim())
			.map_err(|source| ConfigError::InvalidUrl { field: "admin", source })?;
		let skip_tls_verify = match non_empty(ENV_SKIP_TLS_VERIFY) {
			Some(raw) => parse_bool(ENV_SKIP_TLS_VERIFY, &raw)?,
			None => false,
		};
		let mut builder = Self::builder(admin_url.clone()).skip_tls_verify(skip_tls_verify);

		match (non_empty(ENV_CLIENT_ID), non_empty(ENV_CLIENT_SECRET)) {
			(Some(client_id), Some(client_secret)) => {
				let token_url = match non_empty(ENV_TOKEN_URL) {
					Some(raw) => Url::parse(raw.trim())
						.map_err(|source| ConfigError::InvalidUrl { field: "token", source })?,
					None => default_token_url(&admin_url)?,
				};

				builder = builder.credentials(AdminCredentials::new(
					client_id,
					Secret::new(client_secret),
					token_url,
				));
			},
			(Some(_), None) =>
				return Err(ConfigError::IncompleteCredentials { missing: ENV_CLIENT_SECRET }),
			(None, Some(_)) =>
				return Err(ConfigError::IncompleteCredentials { missing: ENV_CLIENT_ID }),
			(None, None) => {},
		}

		builder.build()
	}

	/// Builds the reqwest client matching this configuration.
	///
	/// Redirects are never followed; admin endpoints answer directly.
	pub fn http_client(&self) -> Result<ReqwestHttpClient, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.danger_accept_invalid_certs(self.skip_tls_verify)
			.build()?;

		Ok(ReqwestHttpClient::with_client(client))
	}

	/// Checks URL schemes and shapes.
	pub fn validate(&self) -> Result<(), ConfigError> {
		validate_url("admin", &self.admin_url)?;

		if self.admin_url.query().is_some() || self.admin_url.fragment().is_some() {
			return Err(ConfigError::UnsupportedUrl {
				field: "admin",
				url: self.admin_url.to_string(),
				reason: "query strings and fragments are not allowed",
			});
		}
		if let Some(credentials) = &self.credentials {
			validate_url("token", &credentials.token_url)?;

			if credentials.client_id.trim().is_empty() {
				return Err(ConfigError::IncompleteCredentials { missing: "a client id" });
			}
			if credentials.client_secret.is_empty() {
				return Err(ConfigError::IncompleteCredentials { missing: "a client secret" });
			}
		}

		Ok(())
	}
}

/// Builder for [`AdminConfig`] values.
#[derive(Debug)]
pub struct AdminConfigBuilder {
	admin_url: Url,
	skip_tls_verify: bool,
	credentials: Option<AdminCredentials>,
}
impl AdminConfigBuilder {
	/// Creates a builder seeded with the admin base URL.
	pub fn new(admin_url: Url) -> Self {
		Self { admin_url, skip_tls_verify: false, credentials: None }
	}

	/// Toggles TLS certificate verification.
	pub fn skip_tls_verify(mut self, skip: bool) -> Self {
		self.skip_tls_verify = skip;

		self
	}

	/// Enables bearer authentication with the given credentials.
	pub fn credentials(mut self, credentials: AdminCredentials) -> Self {
		self.credentials = Some(credentials);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<AdminConfig, ConfigError> {
		let config = AdminConfig {
			admin_url: self.admin_url,
			skip_tls_verify: self.skip_tls_verify,
			credentials: self.credentials,
		};

		config.validate()?;

		Ok(config)
	}
}

fn validate_url(field: &'static str, url: &Url) -> Result<(), ConfigError> {
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::UnsupportedUrl {
			field,
			url: url.to_string(),
			reason: "only http and https are supported",
		});
	}
	if url.cannot_be_a_base() || url.host_str().is_none() {
		return Err(ConfigError::UnsupportedUrl {
			field,
			url: url.to_string(),
			reason: "a host is required",
		});
	}

	Ok(())
}

fn default_token_url(admin_url: &Url) -> Result<Url, ConfigError> {
	let mut url = admin_url.clone();

	url.path_segments_mut()
		.map_err(|_| ConfigError::UnsupportedUrl {
			field: "admin",
			url: admin_url.to_string(),
			reason: "a host is required",
		})?
		.pop_if_empty()
		.extend(["oauth2", "token"]);

	Ok(url)
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"true" | "1" => Ok(true),
		"false" | "0" => Ok(false),
		_ => Err(ConfigError::InvalidBool { name, value: raw.to_owned() }),
	}
}
