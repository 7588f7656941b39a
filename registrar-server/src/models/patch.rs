//! Serde helper for nullable fields in partial updates
//!
//! Plain `Option<T>` cannot tell "field omitted" from "field set to null".
//! Fields declared as `Option<Option<T>>` with
//! `#[serde(default, deserialize_with = "double_option")]` decode as:
//!
//! - omitted → `None`
//! - `null` → `Some(None)`
//! - a value → `Some(Some(value))`

use serde::{Deserialize, Deserializer};

pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
