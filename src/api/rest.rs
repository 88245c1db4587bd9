// crates.io
use reqwest::{
	Method, StatusCode,
	header::{ACCEPT, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	api::{AdminApi, ApiFuture, ApiResponse},
	auth::AdminTokenSource,
	coerce,
	config::AdminConfig,
	error::{ConfigError, RemoteError, TransportError},
	http::{self, ReqwestHttpClient},
	model::{OAuth2Client, Policy},
};

const CLIENTS: &str = "clients";
const POLICIES: &str = "policies";
const JSON: &str = "application/json";

/// [`AdminApi`] backed by reqwest against Hydra's admin REST surface.
#[derive(Clone, Debug)]
pub struct ReqwestAdminApi {
	http_client: ReqwestHttpClient,
	base_url: Url,
	token_source: Option<Arc<AdminTokenSource>>,
}
impl ReqwestAdminApi {
	/// Creates an anonymous client rooted at `base_url`.
	pub fn new(http_client: ReqwestHttpClient, base_url: Url) -> Result<Self, ConfigError> {
		if base_url.cannot_be_a_base() {
			return Err(ConfigError::UnsupportedUrl {
				field: "admin",
				url: base_url.to_string(),
				reason: "a host is required",
			});
		}

		Ok(Self { http_client, base_url, token_source: None })
	}

	/// Authenticates every request with a bearer token from `token_source`.
	pub fn with_token_source(mut self, token_source: Arc<AdminTokenSource>) -> Self {
		self.token_source = Some(token_source);

		self
	}

	/// Builds the HTTP client, token source, and API handle described by `config`.
	pub fn from_config(config: &AdminConfig) -> Result<Self, ConfigError> {
		let http_client = config.http_client()?;
		let api = Self::new(http_client.clone(), config.admin_url.clone())?;

		match &config.credentials {
			Some(credentials) => {
				let source = AdminTokenSource::new(credentials, http_client)?;

				Ok(api.with_token_source(Arc::new(source)))
			},
			None => Ok(api),
		}
	}

	/// Base URL all admin paths are joined onto.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn endpoint(&self, collection: &str, id: Option<&str>) -> Url {
		let mut url = self.base_url.clone();

		// `new` rejects cannot-be-a-base URLs, so the segments are always available.
		if let Ok(mut segments) = url.path_segments_mut() {
			segments.pop_if_empty().push(collection);

			if let Some(id) = id {
				segments.push(id);
			}
		}

		url
	}

	async fn execute<B>(
		&self,
		method: Method,
		url: Url,
		payload: Option<&B>,
	) -> Result<(u16, Vec<u8>), RemoteError>
	where
		B: Serialize + ?Sized,
	{
		let mut request = self.http_client.request(method, url).header(ACCEPT, JSON);

		if let Some(payload) = payload {
			let body = serde_json::to_vec(payload).map_err(RemoteError::Encode)?;

			request = request.header(CONTENT_TYPE, JSON).body(body);
		}
		if let Some(source) = &self.token_source {
			let token = source.bearer().await?;

			request = request.bearer_auth(token.expose());
		}

		let response = request.send().await.map_err(TransportError::from)?;
		let rejected = response.status() == StatusCode::UNAUTHORIZED;

		// A rejected bearer must not be served from the cache to the next operation.
		if let Some(source) = self.token_source.as_ref().filter(|_| rejected) {
			source.invalidate();
		}

		let status = response.status().as_u16();
		let bytes = response.bytes().await.map_err(TransportError::from)?;

		#[cfg(feature = "tracing")]
		if !coerce::http_status_ok(status) {
			tracing::debug!(status, "Admin API returned a non-success status.");
		}

		Ok((status, bytes.to_vec()))
	}

	async fn send<B, T>(
		&self,
		method: Method,
		url: Url,
		payload: Option<&B>,
	) -> Result<ApiResponse<T>, RemoteError>
	where
		B: Serialize + ?Sized,
		T: DeserializeOwned,
	{
		let (status, bytes) = self.execute(method, url, payload).await?;

		if !coerce::http_status_ok(status) {
			return Ok(with_preview(ApiResponse::empty(status), &bytes));
		}
		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(ApiResponse::empty(status));
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);
		let body = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| RemoteError::Decode { source, status })?;

		Ok(ApiResponse::with_body(status, body))
	}

	async fn send_discarding(
		&self,
		method: Method,
		url: Url,
	) -> Result<ApiResponse<()>, RemoteError> {
		let (status, bytes) = self.execute::<()>(method, url, None).await?;

		if coerce::http_status_ok(status) {
			Ok(ApiResponse::empty(status))
		} else {
			Ok(with_preview(ApiResponse::empty(status), &bytes))
		}
	}
}
impl AdminApi for ReqwestAdminApi {
	fn create_client<'a>(&'a self, client: &'a OAuth2Client) -> ApiFuture<'a, OAuth2Client> {
		let url = self.endpoint(CLIENTS, None);

		Box::pin(self.send::<_, OAuth2Client>(Method::POST, url, Some(client)))
	}

	fn get_client<'a>(&'a self, id: &'a str) -> ApiFuture<'a, OAuth2Client> {
		let url = self.endpoint(CLIENTS, Some(id));

		Box::pin(self.send::<(), OAuth2Client>(Method::GET, url, None))
	}

	fn update_client<'a>(
		&'a self,
		id: &'a str,
		client: &'a OAuth2Client,
	) -> ApiFuture<'a, OAuth2Client> {
		let url = self.endpoint(CLIENTS, Some(id));

		Box::pin(self.send::<_, OAuth2Client>(Method::PUT, url, Some(client)))
	}

	fn delete_client<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()> {
		Box::pin(self.send_discarding(Method::DELETE, self.endpoint(CLIENTS, Some(id))))
	}

	fn create_policy<'a>(&'a self, policy: &'a Policy) -> ApiFuture<'a, Policy> {
		let url = self.endpoint(POLICIES, None);

		Box::pin(self.send::<_, Policy>(Method::POST, url, Some(policy)))
	}

	fn get_policy<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Policy> {
		let url = self.endpoint(POLICIES, Some(id));

		Box::pin(self.send::<(), Policy>(Method::GET, url, None))
	}

	fn update_policy<'a>(&'a self, policy: &'a Policy) -> ApiFuture<'a, Policy> {
		let url = self.endpoint(POLICIES, Some(policy.id.as_str()));

		Box::pin(self.send::<_, Policy>(Method::PUT, url, Some(policy)))
	}

	fn delete_policy<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()> {
		Box::pin(self.send_discarding(Method::DELETE, self.endpoint(POLICIES, Some(id))))
	}
}

fn with_preview<T>(response: ApiResponse<T>, bytes: &[u8]) -> ApiResponse<T> {
	match http::body_preview(bytes) {
		Some(preview) => response.with_preview(preview),
		None => response,
	}
}
