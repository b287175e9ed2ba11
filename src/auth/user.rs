//! Authenticated user profile as returned by the auth endpoints.

// self
use crate::{_prelude::*, auth::UserId};

/// Account role granted by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
	#[default]
	/// Regular learner account.
	User,
	/// Administrator with access to the dashboard.
	Admin,
}
impl Role {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Role::User => "USER",
			Role::Admin => "ADMIN",
		}
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Identity of the signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
	/// Backend user identifier.
	pub id: UserId,
	/// Login email.
	pub email: String,
	/// Account role.
	pub role: Role,
}
impl AuthUser {
	/// Returns `true` for administrator accounts.
	pub fn is_admin(&self) -> bool {
		matches!(self.role, Role::Admin)
	}
}
