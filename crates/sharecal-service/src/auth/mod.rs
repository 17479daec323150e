//! Authentication primitives.
//!
//! ## Module Organization
//!
//! - `authenticate`: Resolve a bearer access token to an active user
//! - `depot`: Store and read the authenticated user on a Salvo `Depot`
//! - `jwt`: Access/refresh token issuing and verification
//! - `password`: Password hashing and verification with Argon2
//! - `token`: Random URL-safe secrets for share links and invitations

pub mod authenticate;
pub mod depot;
pub mod jwt;
pub mod password;
pub mod token;

pub use depot::{DepotUser, get_user_from_depot};
pub use jwt::{TokenIssuer, TokenPair};
