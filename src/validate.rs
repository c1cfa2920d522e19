//! Request parameter validation.
//!
//! Pure functions: no I/O, no queries. Every handler runs these before
//! anything touches storage, so malformed input fails fast and cheap.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::GroupBy;

pub const MAX_PAGE: i64 = 10_000;
pub const MAX_LIMIT: i64 = 100;
pub const MAX_CITY_LEN: usize = 100;
pub const MAX_STATE_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'page' must be greater than or equal to 1")]
    PageTooSmall,
    #[error("'page' cannot be greater than {MAX_PAGE}")]
    PageTooLarge,
    #[error("'limit' must be greater than or equal to 1")]
    LimitTooSmall,
    #[error("'limit' cannot be greater than {MAX_LIMIT}")]
    LimitTooLarge,
    #[error("'city' cannot be longer than {MAX_CITY_LEN} characters")]
    CityTooLong,
    #[error("'state' cannot be longer than {MAX_STATE_LEN} characters")]
    StateTooLong,
    #[error("'{0}' must be a date in YYYY-MM-DD format")]
    InvalidDate(&'static str),
    #[error("'group_by' must be one of: day, city, state")]
    InvalidGroupBy,
}

/// Validated page/limit pair. No query runs without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Normalized optional filters applied to every query shape.
/// Strings are trimmed and never empty-but-present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub city: Option<String>,
    pub state: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn validate_pagination(page: i64, limit: i64) -> Result<PageRequest, ValidationError> {
    if page < 1 {
        return Err(ValidationError::PageTooSmall);
    }
    if page > MAX_PAGE {
        return Err(ValidationError::PageTooLarge);
    }
    if limit < 1 {
        return Err(ValidationError::LimitTooSmall);
    }
    if limit > MAX_LIMIT {
        return Err(ValidationError::LimitTooLarge);
    }
    Ok(PageRequest { page, limit })
}

pub fn validate_filters(
    city: Option<&str>,
    state: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<FilterSet, ValidationError> {
    let city = normalize(city, MAX_CITY_LEN, ValidationError::CityTooLong)?;
    let state = normalize(state, MAX_STATE_LEN, ValidationError::StateTooLong)?;
    let start_date = parse_date(start_date, "start_date")?;
    let end_date = parse_date(end_date, "end_date")?;

    Ok(FilterSet {
        city,
        state,
        start_date,
        end_date,
    })
}

pub fn validate_group_by(value: &str) -> Result<GroupBy, ValidationError> {
    match value {
        "day" => Ok(GroupBy::Day),
        "city" => Ok(GroupBy::City),
        "state" => Ok(GroupBy::State),
        _ => Err(ValidationError::InvalidGroupBy),
    }
}

fn normalize(
    value: Option<&str>,
    max_len: usize,
    too_long: ValidationError,
) -> Result<Option<String>, ValidationError> {
    match value {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else if trimmed.chars().count() > max_len {
                Err(too_long)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
    }
}

fn parse_date(
    value: Option<&str>,
    name: &'static str,
) -> Result<Option<NaiveDate>, ValidationError> {
    match value {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| ValidationError::InvalidDate(name))
        }
    }
}
