pub mod access;
mod auth_state;
mod directory;
mod error;
pub mod roster;
mod session;
mod user;

pub use auth_state::{AuthEvent, AuthSnapshot, SessionStore, Subscription};
pub use directory::UserDirectory;
pub use error::{Error, Result};
pub use session::{SESSION_COOKIE_NAME, SessionInfo};
pub use user::{AuthUser, MIN_PASSWORD_LEN, NewUser, Role, UserChanges, display_time};

#[doc(hidden)]
pub use anyhow::anyhow as internal_anyhow_dont_use;
