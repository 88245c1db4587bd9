//! Lifecycle entry points invoked by the host framework.
//!
//! Each reconciler validates desired state before any remote call, issues exactly one
//! mutation, and then re-reads the resource so the host state mirrors what the server
//! actually stored. A failed follow-up read is reported, never rolled back.

mod client;
mod policy;

pub use client::*;
pub use policy::*;

// self
use crate::{
	_prelude::*,
	error::{Operation, RemoteError},
	obs::{self, Action, OperationSpan, Outcome, ResourceKind},
	state::ResourceData,
};

/// Boxed future returned by [`Resource`] methods.
pub type ResourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// One managed resource type.
pub trait Resource
where
	Self: Send + Sync,
{
	/// Resource type handled by this reconciler.
	fn kind(&self) -> ResourceKind;

	/// Runs declaration-time checks without contacting the server.
	fn validate(&self, state: &dyn ResourceData) -> Result<()>;

	/// Creates the remote resource and returns its identifier.
	///
	/// The identifier is recorded in `state` as soon as the server accepts the resource, even
	/// when the follow-up read fails afterwards.
	fn create<'a>(&'a self, state: &'a mut dyn ResourceData) -> ResourceFuture<'a, String>;

	/// Overwrites `state` with the server's view of `id`. State is untouched on failure.
	fn read<'a>(
		&'a self,
		id: &'a str,
		state: &'a mut dyn ResourceData,
	) -> ResourceFuture<'a, ()>;

	/// Replaces the remote resource with the full desired state, then re-reads it.
	fn update<'a>(
		&'a self,
		id: &'a str,
		state: &'a mut dyn ResourceData,
	) -> ResourceFuture<'a, ()>;

	/// Deletes the remote resource.
	fn delete<'a>(&'a self, id: &'a str) -> ResourceFuture<'a, ()>;
}

/// Wraps a lifecycle operation with its span and outcome counters.
fn observe<'a, T, Fut>(resource: ResourceKind, action: Action, fut: Fut) -> ResourceFuture<'a, T>
where
	T: 'a,
	Fut: 'a + Send + Future<Output = Result<T>>,
{
	let span = OperationSpan::new(resource, action);

	Box::pin(async move {
		obs::record_operation_outcome(resource, action, Outcome::Attempt);

		let result = span.instrument(fut).await;

		match &result {
			Ok(_) => obs::record_operation_outcome(resource, action, Outcome::Success),
			Err(_) => obs::record_operation_outcome(resource, action, Outcome::Failure),
		}

		result
	})
}

/// Runs the confirmatory read after a successful mutation.
async fn follow_up_read<R>(resource: &R, id: &str, state: &mut dyn ResourceData) -> Result<()>
where
	R: Resource + ?Sized,
{
	let result = resource.read(id, state).await;

	if let Err(e) = &result {
		obs::warn_follow_up_read_failed(resource.kind(), id, e);
	}

	result
}

/// Lifts a remote failure into the crate error with operation context.
fn remote<E>(operation: Operation) -> impl Fn(E) -> Error
where
	E: Into<RemoteError>,
{
	move |source| Error::remote(operation, source)
}
