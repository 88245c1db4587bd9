//! Optional observability helpers for reconciler operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `hydra_reconcile.operation` with the
//!   `resource` and `action` fields, plus a warning when a confirmatory read fails.
//! - Enable `metrics` to increment the `hydra_reconcile_operation_total` counter for every
//!   attempt/success/failure, labeled by `resource` + `action` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Resource types managed by the reconcilers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
	/// OAuth 2.0 client.
	Client,
	/// Access-control policy.
	Policy,
}
impl ResourceKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ResourceKind::Client => "hydra_client",
			ResourceKind::Policy => "hydra_policy",
		}
	}
}
impl Display for ResourceKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Lifecycle entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
	/// Resource creation.
	Create,
	/// State refresh.
	Read,
	/// In-place update.
	Update,
	/// Removal.
	Delete,
}
impl Action {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Action::Create => "create",
			Action::Read => "read",
			Action::Update => "update",
			Action::Delete => "delete",
		}
	}
}
impl Display for Action {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to a lifecycle operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the host.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
