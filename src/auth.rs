//! Auth-domain models: user identity, bearer credentials, login/refresh payloads, and account
//! maintenance requests.

pub mod account;
pub mod credential;
pub mod id;
pub mod login;
pub mod user;

pub use account::*;
pub use credential::*;
pub use id::*;
pub use login::*;
pub use user::*;
