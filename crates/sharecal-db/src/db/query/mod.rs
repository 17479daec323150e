//! Query functions per table.
//!
//! Each module exposes boxed query builders (`all`, `by_id`, ...) plus async
//! functions that execute against an `AsyncPgConnection`, so they work both on a
//! pooled connection and inside a transaction.

pub mod calendar;
pub mod event;
pub mod invitation;
pub mod lock;
pub mod member;
pub mod revoked_token;
pub mod social_account;
pub mod tag;
pub mod user;
