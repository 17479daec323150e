//! Shared configuration, constants and dependency-free helpers for the
//! calendar-sharing backend.

pub mod config;
pub mod constants;
pub mod error;
pub mod util;
