//! Custom deserializers for loosely typed HDHomeRun JSON fields.

use serde::{Deserialize, Deserializer};

/// Raw representation of a flag field.
///
/// Lineups report `"Favorite": 1`, some firmware uses booleans and a few
/// proxies re-encode values as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Deserializes a `0`/`1`, boolean or string flag. `null` is `false`.
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawFlag> = Option::deserialize(deserializer)?;
    Ok(match raw {
        None => false,
        Some(RawFlag::Bool(b)) => b,
        Some(RawFlag::Int(n)) => n != 0,
        Some(RawFlag::Text(s)) => matches!(s.trim(), "1" | "true" | "True" | "TRUE"),
    })
}

/// Deserializes empty or whitespace-only strings as `None`.
pub fn deserialize_empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

/// Deserializes `null` as the type's default (e.g. `"Guide": null` as empty).
pub fn deserialize_null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
