// self
use crate::{_prelude::*, obs::RecoveryKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRecovery<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRecovery<F> = F;

/// A span builder used by recovery paths.
#[derive(Clone, Debug)]
pub struct RecoverySpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RecoverySpan {
	/// Creates a new span tagged with the provided recovery kind + stage.
	pub fn new(kind: RecoveryKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("kotoba_client.recovery", recovery = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRecovery<Fut>
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

/// Emits a debug event describing a retry decision (when tracing is enabled).
pub fn trace_decision(kind: RecoveryKind, status: u16, path: &str, decision: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(recovery = kind.as_str(), status, path, decision, "recovery decision");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, status, path, decision);
	}
}

/// Emits a warning when a recovery callback could not persist its session change.
///
/// The client has already moved on by the time a store write fails, so the event is the only
/// trace the failure leaves.
pub fn trace_store_failure(operation: &'static str, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(operation, error = %error, "session store write failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (operation, error);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn decision_trace_noop_without_tracing() {
		trace_decision(RecoveryKind::RateLimit, 429, "/words", "skip");
	}

	#[test]
	fn store_failure_trace_accepts_store_errors() {
		let error = crate::session::SessionStoreError::Backend { message: "disk full".into() };

		trace_store_failure("clear", &error);
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = RecoverySpan::new(RecoveryKind::AuthRefresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
