pub mod cannes;
pub mod douban;
pub mod grammy;
pub mod oscars;
pub mod rolling_stone;

use serde_json::Value;

use crate::error::{ScrapeError, ScrapeResult};

/// Walk a dotted path (`a.b.0.c`); numeric segments index arrays.
/// Absent and `null` values both count as missing.
pub(crate) fn json_at<'a>(value: &'a Value, path: &str) -> ScrapeResult<&'a Value> {
    json_lookup(value, path).ok_or_else(|| ScrapeError::MissingField(path.to_string()))
}

fn json_lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match segment.parse::<usize>() {
            Ok(index) => current.get(index)?,
            Err(_) => current.get(segment)?,
        };
    }
    Some(current).filter(|v| !v.is_null())
}

pub(crate) fn json_str<'a>(value: &'a Value, path: &str) -> ScrapeResult<&'a str> {
    json_at(value, path)?
        .as_str()
        .ok_or_else(|| ScrapeError::MissingField(format!("{} (expected a string)", path)))
}

/// `None` when the field is absent or `null`; a non-string value is an error.
pub(crate) fn json_opt_str<'a>(value: &'a Value, path: &str) -> ScrapeResult<Option<&'a str>> {
    match json_lookup(value, path) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ScrapeError::MissingField(format!("{} (expected a string)", path))),
    }
}

pub(crate) fn json_array<'a>(value: &'a Value, path: &str) -> ScrapeResult<&'a Vec<Value>> {
    json_at(value, path)?
        .as_array()
        .ok_or_else(|| ScrapeError::MissingField(format!("{} (expected an array)", path)))
}
