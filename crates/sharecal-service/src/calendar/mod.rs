//! Calendars, membership, tags and the two ways of joining a calendar.
//!
//! ## Module Organization
//!
//! - `access`: Role derivation and capability checks
//! - `service`: Calendar CRUD, statistics and leaving
//! - `member`: Member listing, removal and role changes
//! - `tag`: Tag management and default tag seeding
//! - `share`: Share-link creation, regeneration and redemption
//! - `invitation`: Targeted invitations and their lifecycle
//! - `view`: Response shapes with capability hints

pub mod access;
pub mod invitation;
pub mod member;
pub mod service;
pub mod share;
pub mod tag;
pub mod view;

pub use access::{CalendarAccess, Role, role_of};
