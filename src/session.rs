//! Session state owned by the hosting application and the stores that keep it.
//!
//! The request client never owns a [`Session`]. It reads the credential through an accessor and
//! mutates the session only through [`AuthRecoveryHandlers`] callbacks; [`attach`] wires both
//! onto a client for any [`SessionStore`].

pub mod file;
pub mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

// self
use crate::{
	_prelude::*,
	auth::{AccessCredential, AuthUser, RefreshGrant},
	client::{AuthRecoveryHandlers, SessionClient},
	http::HttpTransport,
	obs,
};

/// Snapshot of the signed-in state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	/// Bearer credential attached to outbound requests.
	pub access_credential: Option<AccessCredential>,
	/// Signed-in user, if any.
	pub current_user: Option<AuthUser>,
	/// Set once a bootstrap validation finished, whatever its result. Not persisted.
	#[serde(skip)]
	pub auth_checked: bool,
	/// Last time a grant or user update was applied.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
}
impl Session {
	/// Returns `true` when a user is signed in.
	pub fn is_authenticated(&self) -> bool {
		self.current_user.is_some()
	}

	/// Applies a login/refresh grant; a grant without a token keeps the current credential.
	pub fn apply_grant(&mut self, grant: &RefreshGrant, now: OffsetDateTime) {
		if let Some(token) = &grant.access_token {
			self.access_credential = Some(token.clone());
		}

		self.current_user = Some(grant.user.clone());
		self.updated_at = Some(now);
	}

	/// Replaces the user without touching the credential.
	pub fn set_user(&mut self, user: Option<AuthUser>, now: OffsetDateTime) {
		self.current_user = user;
		self.updated_at = Some(now);
	}

	/// Drops every credential and user field.
	pub fn clear(&mut self) {
		*self = Self::default();
	}
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SessionStoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Process-wide owner of the [`Session`].
///
/// Reads are synchronous because the client calls [`credential`](Self::credential) right before
/// every send.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns a copy of the current session.
	fn snapshot(&self) -> Session;

	/// Applies a login/refresh grant.
	fn apply_grant(&self, grant: &RefreshGrant) -> Result<(), SessionStoreError>;

	/// Replaces the signed-in user.
	fn set_user(&self, user: Option<AuthUser>) -> Result<(), SessionStoreError>;

	/// Records that a bootstrap validation has completed.
	fn mark_auth_checked(&self);

	/// Clears the session (logout or irrecoverable auth failure).
	fn clear(&self) -> Result<(), SessionStoreError>;

	/// Returns the current credential.
	fn credential(&self) -> Option<AccessCredential> {
		self.snapshot().access_credential
	}
}

/// Recovery handlers that forward client callbacks into a [`SessionStore`].
#[derive(Debug)]
pub struct StoreRecoveryHandlers<S>(pub Arc<S>)
where
	S: ?Sized + SessionStore;
impl<S> AuthRecoveryHandlers for StoreRecoveryHandlers<S>
where
	S: ?Sized + SessionStore,
{
	fn on_refresh_success(&self, grant: &RefreshGrant) {
		// In-memory state is updated before persistence, so a write failure only loses durability.
		if let Err(e) = self.0.apply_grant(grant) {
			report_store_failure("apply_grant", &e);
		}
	}

	fn on_unauthenticated(&self) {
		if let Err(e) = self.0.clear() {
			report_store_failure("clear", &e);
		}
	}
}

fn report_store_failure(operation: &'static str, error: &SessionStoreError) {
	obs::trace_store_failure(operation, error);
	obs::record_store_failure(operation);
}

/// Installs `store` as the credential source and recovery target of `client`.
pub fn attach<S, C>(store: Arc<S>, client: &SessionClient<C>)
where
	S: 'static + ?Sized + SessionStore,
	C: ?Sized + HttpTransport,
{
	let reader = Arc::clone(&store);

	client.set_credential_accessor(move || reader.credential());
	client.set_auth_recovery_handlers(StoreRecoveryHandlers(store));
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{Role, UserId};

	fn grant(token: Option<&str>) -> RefreshGrant {
		RefreshGrant {
			user: AuthUser {
				id: UserId::new("u-1").expect("User id fixture should be valid."),
				email: "learner@kotoba.jp".into(),
				role: Role::User,
			},
			access_token: token.map(AccessCredential::new),
		}
	}

	#[test]
	fn cookie_only_grant_keeps_existing_credential() {
		let now = OffsetDateTime::now_utc();
		let mut session = Session::default();

		session.apply_grant(&grant(Some("first")), now);
		session.apply_grant(&grant(None), now);

		assert_eq!(session.access_credential.as_ref().map(AccessCredential::expose), Some("first"));
		assert!(session.is_authenticated());

		session.clear();

		assert_eq!(session, Session::default());
	}

	#[derive(Debug, Default)]
	struct ReadOnlyStore(MemorySessionStore);
	impl SessionStore for ReadOnlyStore {
		fn snapshot(&self) -> Session {
			self.0.snapshot()
		}

		fn apply_grant(&self, _: &RefreshGrant) -> Result<(), SessionStoreError> {
			Err(SessionStoreError::Backend { message: "read-only".into() })
		}

		fn set_user(&self, _: Option<AuthUser>) -> Result<(), SessionStoreError> {
			Err(SessionStoreError::Backend { message: "read-only".into() })
		}

		fn mark_auth_checked(&self) {
			self.0.mark_auth_checked();
		}

		fn clear(&self) -> Result<(), SessionStoreError> {
			Err(SessionStoreError::Backend { message: "read-only".into() })
		}
	}

	#[test]
	fn handlers_survive_store_write_failures() {
		let store = Arc::new(ReadOnlyStore::default());
		let handlers = StoreRecoveryHandlers(Arc::clone(&store));

		handlers.on_refresh_success(&grant(Some("fresh")));
		handlers.on_unauthenticated();

		assert_eq!(store.snapshot(), Session::default());
	}

	#[test]
	fn auth_checked_flag_is_not_persisted() {
		let session = Session { auth_checked: true, ..Default::default() };
		let payload = serde_json::to_string(&session).expect("Session should serialize.");
		let restored: Session = serde_json::from_str(&payload).expect("Session should deserialize.");

		assert!(!restored.auth_checked);
	}

	#[test]
	fn store_error_converts_into_client_error_with_source() {
		let store_error = SessionStoreError::Backend { message: "disk full".into() };
		let client_error: Error = store_error.clone().into();

		assert!(matches!(client_error, Error::Storage(_)));
		assert!(client_error.to_string().contains("disk full"));

		let source = StdError::source(&client_error)
			.expect("Client error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
