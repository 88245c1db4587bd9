//! Admin API abstraction consumed by the reconcilers.
//!
//! Every call resolves to an [`ApiResponse`] carrying the literal HTTP status, so status
//! interpretation stays with the reconciler. Only transport, encoding, and decoding problems
//! surface as [`RemoteError`]s from the API itself.

mod rest;

pub use rest::*;

// self
use crate::{
	_prelude::*,
	error::{RemoteError, StatusError},
	model::{OAuth2Client, Policy},
};

/// Boxed future returned by [`AdminApi`] methods.
pub type ApiFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<ApiResponse<T>, RemoteError>> + 'a + Send>>;

/// Status and decoded body of an admin API response.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse<T> {
	/// Literal HTTP status code.
	pub status: u16,
	/// Decoded body; present only for 2xx responses that carried one.
	pub body: Option<T>,
	/// Truncated raw body of non-2xx responses, for error messages.
	pub preview: Option<String>,
}
impl<T> ApiResponse<T> {
	/// Response with a decoded body.
	pub fn with_body(status: u16, body: T) -> Self {
		Self { status, body: Some(body), preview: None }
	}

	/// Response without a body.
	pub fn empty(status: u16) -> Self {
		Self { status, body: None, preview: None }
	}

	/// Attaches a raw body preview.
	pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
		self.preview = Some(preview.into());

		self
	}

	/// Fails with a [`StatusError`] unless the status is 2xx.
	pub fn ensure_success(&self) -> Result<(), StatusError> {
		crate::coerce::ensure_status(self.status).map_err(|err| match &self.preview {
			Some(preview) => err.with_body(preview.clone()),
			None => err,
		})
	}

	/// Checks the status and returns the body, failing when a 2xx response had none.
	pub fn into_body(self) -> Result<T, RemoteError> {
		self.ensure_success()?;

		self.body.ok_or(RemoteError::MissingBody { status: self.status })
	}
}

/// Remote operations against the Hydra admin API.
pub trait AdminApi
where
	Self: Send + Sync,
{
	/// `POST /clients`.
	fn create_client<'a>(&'a self, client: &'a OAuth2Client) -> ApiFuture<'a, OAuth2Client>;

	/// `GET /clients/{id}`.
	fn get_client<'a>(&'a self, id: &'a str) -> ApiFuture<'a, OAuth2Client>;

	/// `PUT /clients/{id}`.
	fn update_client<'a>(
		&'a self,
		id: &'a str,
		client: &'a OAuth2Client,
	) -> ApiFuture<'a, OAuth2Client>;

	/// `DELETE /clients/{id}`.
	fn delete_client<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()>;

	/// `POST /policies`.
	fn create_policy<'a>(&'a self, policy: &'a Policy) -> ApiFuture<'a, Policy>;

	/// `GET /policies/{id}`.
	fn get_policy<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Policy>;

	/// `PUT /policies/{id}`; the identifier is taken from `policy.id`.
	fn update_policy<'a>(&'a self, policy: &'a Policy) -> ApiFuture<'a, Policy>;

	/// `DELETE /policies/{id}`.
	fn delete_policy<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()>;
}
