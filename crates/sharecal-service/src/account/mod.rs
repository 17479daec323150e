//! User accounts.
//!
//! - [`session`]: registration, password login, logout and token refresh.
//! - [`social`]: provider login and linked accounts.
//! - [`profile`]: the caller's own profile and password.

pub mod profile;
pub mod session;
pub mod social;

pub use profile::ProfileView;
pub use session::{AccessToken, AuthSession};
pub use social::SocialSession;
