//! Bearer tokens for admin APIs guarded by an OAuth 2.0 client-credentials grant.
//!
//! [`AdminTokenSource`] caches the issued access token until shortly before it expires.
//! Concurrent callers that find the cache stale wait on one in-flight exchange instead of
//! each hitting the token endpoint.

// std
use std::time::Duration as StdDuration;
// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RequestTokenError,
	Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::{ConfigError, RemoteError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadataSlot},
};

type TokenClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Client credentials used to obtain an admin bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminCredentials {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: Secret,
	/// Token endpoint.
	pub token_url: Url,
	/// Scopes requested with every exchange.
	pub scopes: Vec<String>,
}
impl AdminCredentials {
	/// Creates credentials without extra scopes.
	pub fn new(client_id: impl Into<String>, client_secret: Secret, token_url: Url) -> Self {
		Self { client_id: client_id.into(), client_secret, token_url, scopes: Vec::new() }
	}

	/// Adds a scope to request.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scopes.push(scope.into());

		self
	}
}

#[derive(Clone)]
struct CachedToken {
	secret: Secret,
	expires_at: Option<OffsetDateTime>,
}
impl CachedToken {
	fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
		match self.expires_at {
			Some(expires_at) => now + AdminTokenSource::EXPIRY_MARGIN < expires_at,
			None => true,
		}
	}
}

/// Fetches and caches the admin bearer token.
pub struct AdminTokenSource {
	client: TokenClient,
	scopes: Vec<String>,
	http_client: ReqwestHttpClient,
	cached: Mutex<Option<CachedToken>>,
	exchange_guard: AsyncMutex<()>,
}
impl AdminTokenSource {
	const EXPIRY_MARGIN: Duration = Duration::seconds(30);

	/// Creates a token source for the provided credentials.
	pub fn new(
		credentials: &AdminCredentials,
		http_client: ReqwestHttpClient,
	) -> Result<Self, ConfigError> {
		let token_url = TokenUrl::new(credentials.token_url.to_string())
			.map_err(|source| ConfigError::InvalidUrl { field: "token", source })?;
		let client = BasicClient::new(ClientId::new(credentials.client_id.clone()))
			.set_client_secret(ClientSecret::new(credentials.client_secret.expose().to_owned()))
			.set_token_uri(token_url);

		Ok(Self {
			client,
			scopes: credentials.scopes.clone(),
			http_client,
			cached: Mutex::new(None),
			exchange_guard: AsyncMutex::new(()),
		})
	}

	/// Returns a fresh bearer token, exchanging credentials when the cache is stale.
	pub async fn bearer(&self) -> Result<Secret, RemoteError> {
		if let Some(secret) = self.cached_at(OffsetDateTime::now_utc()) {
			return Ok(secret);
		}

		let _singleflight = self.exchange_guard.lock().await;

		// Another caller may have refreshed while this one waited.
		if let Some(secret) = self.cached_at(OffsetDateTime::now_utc()) {
			return Ok(secret);
		}

		let token = self.exchange().await?;
		let secret = token.secret.clone();

		*self.cached.lock() = Some(token);

		Ok(secret)
	}

	/// Drops the cached token so the next call exchanges again.
	pub fn invalidate(&self) {
		self.cached.lock().take();
	}

	fn cached_at(&self, now: OffsetDateTime) -> Option<Secret> {
		self.cached
			.lock()
			.as_ref()
			.filter(|token| token.is_fresh_at(now))
			.map(|token| token.secret.clone())
	}

	async fn exchange(&self) -> Result<CachedToken, RemoteError> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let mut request = self.client.exchange_client_credentials();

		for scope in &self.scopes {
			request = request.add_scope(Scope::new(scope.clone()));
		}

		let issued_at = OffsetDateTime::now_utc();
		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(err, meta.take().and_then(|m| m.status)))?;
		let expires_at = expiry_after(issued_at, response.expires_in());

		Ok(CachedToken { secret: Secret::new(response.access_token().secret()), expires_at })
	}
}
impl Debug for AdminTokenSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AdminTokenSource")
			.field("scopes", &self.scopes)
			.field("cached", &self.cached.lock().is_some())
			.finish()
	}
}

/// Absolute expiry for a token issued at `issued_at`; lifetimes past the representable range
/// never expire.
fn expiry_after(issued_at: OffsetDateTime, ttl: Option<StdDuration>) -> Option<OffsetDateTime> {
	let secs = i64::try_from(ttl?.as_secs()).ok()?;

	issued_at.checked_add(Duration::seconds(secs))
}

fn map_request_error(
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
	status: Option<u16>,
) -> RemoteError {
	match err {
		RequestTokenError::ServerResponse(response) => {
			let reason = match response.error_description() {
				Some(description) => format!("{} ({description})", response.error().as_ref()),
				None => response.error().as_ref().to_owned(),
			};

			RemoteError::Token { reason }
		},
		RequestTokenError::Request(HttpClientError::Reqwest(inner)) =>
			TransportError::network(*inner).into(),
		RequestTokenError::Request(HttpClientError::Io(inner)) => TransportError::Io(inner).into(),
		RequestTokenError::Request(other) => RemoteError::Token { reason: other.to_string() },
		RequestTokenError::Parse(source, _body) =>
			RemoteError::Decode { source, status: status.unwrap_or_default() },
		RequestTokenError::Other(message) => RemoteError::Token { reason: message },
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn credentials() -> AdminCredentials {
		AdminCredentials::new(
			"admin",
			Secret::new("admin-secret"),
			Url::parse("https://auth.example.com/oauth2/token").expect("Token URL should parse."),
		)
		.with_scope("hydra.clients")
	}

	#[test]
	fn cached_tokens_expire_with_margin() {
		let now = OffsetDateTime::now_utc();
		let token = CachedToken {
			secret: Secret::new("t"),
			expires_at: Some(now + Duration::seconds(20)),
		};

		assert!(!token.is_fresh_at(now), "Tokens inside the margin must be refreshed.");
		assert!(token.is_fresh_at(now - Duration::seconds(60)));
		assert!(CachedToken { secret: Secret::new("t"), expires_at: None }.is_fresh_at(now));
	}

	#[test]
	fn expiry_saturates_for_unrepresentable_lifetimes() {
		let now = OffsetDateTime::now_utc();
		let huge = StdDuration::from_secs(9_000_000_000_000_000_000);

		assert_eq!(
			expiry_after(now, Some(StdDuration::from_secs(3_600))),
			Some(now + Duration::hours(1))
		);
		assert_eq!(expiry_after(now, Some(huge)), None);
		assert_eq!(expiry_after(now, Some(StdDuration::MAX)), None);
		assert_eq!(expiry_after(now, None), None);
	}

	#[test]
	fn source_serves_cached_tokens_until_invalidated() {
		let source = AdminTokenSource::new(&credentials(), ReqwestHttpClient::default())
			.expect("Token source should build.");
		let now = OffsetDateTime::now_utc();

		*source.cached.lock() = Some(CachedToken {
			secret: Secret::new("cached"),
			expires_at: Some(now + Duration::hours(1)),
		});

		assert_eq!(source.cached_at(now).map(|s| s.expose().to_owned()).as_deref(), Some("cached"));

		source.invalidate();

		assert!(source.cached_at(now).is_none());
		assert!(!format!("{source:?}").contains("admin-secret"));
	}
}
