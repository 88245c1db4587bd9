// self
use crate::{
	_prelude::*,
	obs::{Action, ResourceKind},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span wrapping one lifecycle operation.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the resource type and action.
	pub fn new(resource: ResourceKind, action: Action) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"hydra_reconcile.operation",
				resource = resource.as_str(),
				action = action.as_str()
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (resource, action);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Reports that the mutation succeeded but reading the result back failed.
///
/// Nothing is rolled back; the identifier stays recorded in the host state.
pub fn warn_follow_up_read_failed(resource: ResourceKind, id: &str, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			resource = resource.as_str(),
			id,
			error = %error,
			"Resource was written but could not be read back."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (resource, id, error);
	}
}
