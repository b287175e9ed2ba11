// self
use crate::obs::{RecoveryKind, RecoveryOutcome};

/// Records a recovery outcome via the global metrics recorder (when enabled).
pub fn record_recovery_outcome(kind: RecoveryKind, outcome: RecoveryOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"kotoba_client_recovery_total",
			"recovery" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts session writes that failed inside a recovery callback (when enabled).
pub fn record_store_failure(operation: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("kotoba_client_session_store_failures_total", "operation" => operation)
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = operation;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_recovery_outcome_noop_without_metrics() {
		record_recovery_outcome(RecoveryKind::RateLimit, RecoveryOutcome::Failure);
		record_store_failure("apply_grant");
	}
}
