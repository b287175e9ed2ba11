//! Thread-safe in-memory [`SessionStore`] for tests and short-lived processes.

// self
use crate::{
	_prelude::*,
	auth::{AccessCredential, AuthUser, RefreshGrant},
	session::{Session, SessionStore, SessionStoreError},
};

/// Session store that keeps state in-process only.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore(Arc<RwLock<Session>>);
impl MemorySessionStore {
	/// Creates a store seeded with `session`.
	pub fn with_session(session: Session) -> Self {
		Self(Arc::new(RwLock::new(session)))
	}
}
impl SessionStore for MemorySessionStore {
	fn snapshot(&self) -> Session {
		self.0.read().clone()
	}

	fn apply_grant(&self, grant: &RefreshGrant) -> Result<(), SessionStoreError> {
		self.0.write().apply_grant(grant, OffsetDateTime::now_utc());

		Ok(())
	}

	fn set_user(&self, user: Option<AuthUser>) -> Result<(), SessionStoreError> {
		self.0.write().set_user(user, OffsetDateTime::now_utc());

		Ok(())
	}

	fn mark_auth_checked(&self) {
		self.0.write().auth_checked = true;
	}

	fn clear(&self) -> Result<(), SessionStoreError> {
		self.0.write().clear();

		Ok(())
	}

	fn credential(&self) -> Option<AccessCredential> {
		self.0.read().access_credential.clone()
	}
}
