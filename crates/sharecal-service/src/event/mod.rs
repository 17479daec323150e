//! Calendar events.
//!
//! Recurrence rules are stored as labels only; no instances are expanded.

pub mod service;
pub mod view;

pub use view::{EventView, UNTAGGED_EVENT_COLOR};
