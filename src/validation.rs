use crate::error::AppError;
use crate::models::report::StanzaBlock;
use std::collections::BTreeMap;

pub fn required_str<'a>(fields: &'a BTreeMap<String, String>, key: &str) -> Result<&'a str, AppError> {
    fields
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| AppError::missing_field(key))
}

pub fn required_int(fields: &BTreeMap<String, String>, key: &str) -> Result<i64, AppError> {
    let raw = required_str(fields, key)?;
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("field {} is not an integer: {}", key, raw)))
}

pub fn optional_int(fields: &BTreeMap<String, String>, key: &str) -> Result<Option<i64>, AppError> {
    if fields.contains_key(key) {
        required_int(fields, key).map(Some)
    } else {
        Ok(None)
    }
}

/// Team index carried by a `Q team#<k>` marker, zero-based.
pub fn team_index(team: &StanzaBlock) -> Result<usize, AppError> {
    let marker = required_str(team, "Q")?;
    let index = marker
        .trim()
        .trim_start_matches("team#")
        .parse::<usize>()
        .map_err(|_| AppError::BadRequest(format!("invalid team marker: {}", marker)))?;
    match index {
        1 | 2 => Ok(index - 1),
        _ => Err(AppError::BadRequest(format!("invalid team marker: {}", marker))),
    }
}

pub fn validate_timestamp(timestamp: i64) -> Result<chrono::DateTime<chrono::Utc>, AppError> {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| AppError::BadRequest(format!("invalid match timestamp: {}", timestamp)))
}

pub fn validate_page(page: i64) -> Result<i64, AppError> {
    if page < 0 {
        Err(AppError::BadRequest("page cannot be negative".into()))
    } else {
        Ok(page)
    }
}
