// self
use crate::obs::{Action, Outcome, ResourceKind};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_operation_outcome(resource: ResourceKind, action: Action, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"hydra_reconcile_operation_total",
			"resource" => resource.as_str(),
			"action" => action.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (resource, action, outcome);
	}
}
