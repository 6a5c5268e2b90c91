// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"steam_openid_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a callback refused for security reasons, labeled by `cause`.
pub fn record_rejection_total(cause: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("steam_openid_rejection_total", "cause" => cause).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = cause;
	}
}
