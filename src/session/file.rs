//! File-backed [`SessionStore`] that survives restarts, like a browser's persisted auth state.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessCredential, AuthUser, RefreshGrant},
	session::{Session, SessionStore, SessionStoreError},
};

/// Persists the session to a JSON file after each mutation.
#[derive(Debug)]
pub struct FileSessionStore {
	path: PathBuf,
	inner: RwLock<Session>,
}
impl FileSessionStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionStoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: RwLock::new(snapshot) })
	}

	/// Location of the JSON snapshot.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Session, SessionStoreError> {
		if !path.exists() {
			return Ok(Session::default());
		}

		let bytes = fs::read(path).map_err(|e| SessionStoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(Session::default());
		}

		serde_json::from_slice(&bytes).map_err(|e| SessionStoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), SessionStoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| SessionStoreError::Backend {
				message: format!("Failed to create session directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, session: &Session) -> Result<(), SessionStoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(session).map_err(|e| SessionStoreError::Serialization {
				message: format!("Failed to serialize session snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| SessionStoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| SessionStoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| SessionStoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| SessionStoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn mutate(&self, f: impl FnOnce(&mut Session)) -> Result<(), SessionStoreError> {
		let mut guard = self.inner.write();

		f(&mut *guard);

		self.persist_locked(&guard)
	}
}
impl SessionStore for FileSessionStore {
	fn snapshot(&self) -> Session {
		self.inner.read().clone()
	}

	fn apply_grant(&self, grant: &RefreshGrant) -> Result<(), SessionStoreError> {
		self.mutate(|session| session.apply_grant(grant, OffsetDateTime::now_utc()))
	}

	fn set_user(&self, user: Option<AuthUser>) -> Result<(), SessionStoreError> {
		self.mutate(|session| session.set_user(user, OffsetDateTime::now_utc()))
	}

	fn mark_auth_checked(&self) {
		self.inner.write().auth_checked = true;
	}

	fn clear(&self) -> Result<(), SessionStoreError> {
		self.mutate(Session::clear)
	}

	fn credential(&self) -> Option<AccessCredential> {
		self.inner.read().access_credential.clone()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;
	use crate::auth::{Role, UserId};

	fn temp_path() -> PathBuf {
		let unique = format!(
			"kotoba_client_session_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn grant() -> RefreshGrant {
		RefreshGrant {
			user: AuthUser {
				id: UserId::new("u-42").expect("User id fixture should be valid."),
				email: "admin@kotoba.jp".into(),
				role: Role::Admin,
			},
			access_token: Some(AccessCredential::new("persisted-token")),
		}
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileSessionStore::open(&path).expect("Failed to open session file.");

		store.apply_grant(&grant()).expect("Failed to persist grant.");
		store.mark_auth_checked();
		drop(store);

		let reopened = FileSessionStore::open(&path).expect("Failed to reopen session file.");
		let session = reopened.snapshot();

		assert_eq!(session.current_user.as_ref().map(|u| u.email.as_str()), Some("admin@kotoba.jp"));
		assert_eq!(reopened.credential().as_ref().map(AccessCredential::expose), Some("persisted-token"));
		assert!(!session.auth_checked);
		assert!(session.updated_at.is_some());

		reopened.clear().expect("Failed to clear session.");

		let cleared = FileSessionStore::open(&path).expect("Failed to reopen cleared session.");

		assert_eq!(cleared.snapshot(), Session::default());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary session file {}: {e}", path.display())
		});
	}

	#[test]
	fn corrupt_snapshot_is_reported() {
		let path = temp_path();

		fs::write(&path, b"{not json").expect("Failed to write corrupt fixture.");

		let err = FileSessionStore::open(&path).expect_err("Corrupt snapshots must not load.");

		assert!(matches!(err, SessionStoreError::Serialization { .. }));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary session file {}: {e}", path.display())
		});
	}
}
