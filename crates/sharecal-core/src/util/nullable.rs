//! Partial-update fields that may be explicitly cleared.

use serde::{Deserialize, Deserializer};

/// ## Summary
/// Deserializes a field as `Some(value)` whenever it is present, including
/// `Some(None)` for an explicit `null`. Pair with `#[serde(default)]` so an
/// absent field stays `None`.
///
/// ## Errors
/// Propagates the inner deserializer's error.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
