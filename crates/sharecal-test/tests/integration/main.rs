//! End-to-end tests against a real PostgreSQL database.
//!
//! Set `TEST_DATABASE_URL` to a server URL without a database name. Tests
//! return early when no server is reachable.

mod helpers;

mod accounts;
mod calendars;
mod events;
mod invitations;
mod sharing;
