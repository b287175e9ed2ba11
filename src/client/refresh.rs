//! Single-flight credential refresh.
//!
//! Every request records the gate's generation before it reads the credential and sends. When
//! that request later sees a 401 it enters [`RefreshGate::run`]: if the generation moved while it
//! was in flight, a refresh already settled for the credential it used and the stored outcome is
//! reused; otherwise it becomes the leader and performs the refresh itself. The leader runs the
//! session callbacks before it publishes the outcome, so joined requests always resend with the
//! updated credential.

// self
use crate::{
	_prelude::*,
	auth::RefreshGrant,
	client::{ApiRequest, SessionClient},
	error::AuthRecoveryError,
	http::HttpTransport,
	obs::{self, RecoveryKind, RecoveryOutcome, RecoverySpan},
};

type RefreshOutcome = Result<RefreshGrant, AuthRecoveryError>;

/// Serializes refreshes and remembers the latest outcome.
#[derive(Debug, Default)]
pub(crate) struct RefreshGate {
	gate: AsyncMutex<()>,
	state: Mutex<GateState>,
}
impl RefreshGate {
	/// Number of refreshes that have settled so far.
	pub(crate) fn generation(&self) -> u64 {
		self.state.lock().generation
	}

	/// Runs `refresh` unless a refresh settled after `observed`, in which case its outcome is
	/// shared.
	pub(crate) async fn run<F, Fut>(&self, observed: u64, refresh: F) -> GateOutcome
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = RefreshOutcome>,
	{
		let _leader = self.gate.lock().await;

		if let Some(settled) = self.settled_since(observed) {
			return GateOutcome::Joined(settled);
		}

		let outcome = refresh().await;
		let mut state = self.state.lock();

		state.generation += 1;
		state.last = Some(outcome.clone());

		GateOutcome::Led(outcome)
	}

	fn settled_since(&self, observed: u64) -> Option<RefreshOutcome> {
		let state = self.state.lock();

		if state.generation == observed { None } else { state.last.clone() }
	}
}

#[derive(Debug, Default)]
struct GateState {
	generation: u64,
	last: Option<RefreshOutcome>,
}

/// How a caller obtained its refresh outcome.
#[derive(Debug)]
pub(crate) enum GateOutcome {
	/// The caller performed the refresh.
	Led(RefreshOutcome),
	/// The caller reused a refresh performed by another request.
	Joined(RefreshOutcome),
}
impl GateOutcome {
	pub(crate) fn into_inner(self) -> RefreshOutcome {
		match self {
			Self::Led(outcome) | Self::Joined(outcome) => outcome,
		}
	}
}

impl<C> SessionClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Refreshes the session explicitly, joining a refresh that is already in flight.
	///
	/// On success the recovery handlers have already received the grant. On failure the
	/// unauthenticated callback has already run once.
	pub async fn refresh_session(&self) -> Result<RefreshGrant> {
		let observed = self.refresh_gate.generation();

		self.refresh_after(observed).await.map_err(Error::from)
	}

	/// Obtains a refresh outcome for a request that was sent while the gate was at `observed`.
	pub(crate) async fn refresh_after(&self, observed: u64) -> RefreshOutcome {
		const KIND: RecoveryKind = RecoveryKind::AuthRefresh;

		let span = RecoverySpan::new(KIND, "refresh_after");
		let outcome = span.instrument(self.refresh_gate.run(observed, || self.lead_refresh())).await;

		if let GateOutcome::Joined(_) = &outcome {
			obs::record_recovery_outcome(KIND, RecoveryOutcome::Joined);
			self.metrics.record_refresh_join();
		}

		outcome.into_inner()
	}

	async fn lead_refresh(&self) -> RefreshOutcome {
		const KIND: RecoveryKind = RecoveryKind::AuthRefresh;

		obs::record_recovery_outcome(KIND, RecoveryOutcome::Attempt);
		self.metrics.record_refresh_attempt();

		match self.send_refresh().await {
			Ok(grant) => {
				obs::record_recovery_outcome(KIND, RecoveryOutcome::Success);
				self.metrics.record_refresh_success();

				if let Some(handlers) = self.handlers() {
					handlers.on_refresh_success(&grant);
				}

				Ok(grant)
			},
			Err(e) => {
				obs::record_recovery_outcome(KIND, RecoveryOutcome::Failure);
				self.metrics.record_refresh_failure();
				self.notify_unauthenticated();

				Err(AuthRecoveryError::from_refresh_error(&e))
			},
		}
	}

	/// Calls the refresh endpoint once, bypassing every recovery path.
	async fn send_refresh(&self) -> Result<RefreshGrant> {
		let response = self.send_once(&ApiRequest::post(&self.refresh_path)).await?;

		if !response.is_success() {
			return Err(response.into_status_error().into());
		}

		response.json()
	}
}
