//! Rate-limit descriptors built from Trello response headers.
//!
//! Trello reports per-token and per-key windows through
//! `x-rate-limit-api-{token,key}-*` headers; generic proxies in front of it
//! may also send `x-ratelimit-*` and `retry-after`. A header that is present
//! but unparseable is an error rather than silently dropped.

use chrono::{DateTime, TimeDelta, Utc};
use connector_core::{RateLimitDescription, RateLimitStatus};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::error::{TrelloError, TrelloResult};

const LIMIT_HEADERS: [&str; 3] = [
    "x-rate-limit-api-token-max",
    "x-rate-limit-api-key-max",
    "x-ratelimit-limit"
];
const REMAINING_HEADERS: [&str; 3] = [
    "x-rate-limit-api-token-remaining",
    "x-rate-limit-api-key-remaining",
    "x-ratelimit-remaining"
];
const INTERVAL_MS_HEADERS: [&str; 2] = [
    "x-rate-limit-api-token-interval-ms",
    "x-rate-limit-api-key-interval-ms"
];
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Values above this are read as unix timestamps, below as a delay in seconds.
const EPOCH_THRESHOLD: i64 = 1_000_000_000;

pub fn extract_rate_limit(
    status: StatusCode,
    headers: &HeaderMap
) -> TrelloResult<Option<RateLimitDescription>> {
    extract_rate_limit_at(status, headers, Utc::now())
}

pub fn extract_rate_limit_at(
    status: StatusCode,
    headers: &HeaderMap,
    now: DateTime<Utc>
) -> TrelloResult<Option<RateLimitDescription>> {
    let limit = first_number(headers, &LIMIT_HEADERS)?;
    let remaining = first_number(headers, &REMAINING_HEADERS)?;
    let reset_at = reset_at(headers, now)?;
    let throttled = status == StatusCode::TOO_MANY_REQUESTS;

    if !throttled && limit.is_none() && remaining.is_none() && reset_at.is_none() {
        return Ok(None);
    }

    let status = if throttled || remaining == Some(0) {
        RateLimitStatus::Overlimit
    } else {
        RateLimitStatus::Ok
    };

    Ok(Some(RateLimitDescription {
        status,
        limit,
        remaining,
        reset_at
    }))
}

/// Seconds to wait before retrying, rounded up, from a rate-limit descriptor.
pub fn retry_after_seconds(description: &RateLimitDescription, now: DateTime<Utc>) -> Option<u64> {
    let reset_at = description.reset_at?;
    let millis = (reset_at - now).num_milliseconds().max(0) as u64;
    Some(millis.div_ceil(1000))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> TrelloResult<Option<&'a str>> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim()))
            .map_err(|_| parse_error(name, &String::from_utf8_lossy(value.as_bytes())))
    }
}

fn first_number(headers: &HeaderMap, names: &[&str]) -> TrelloResult<Option<u64>> {
    for name in names {
        if let Some(value) = header_str(headers, name)? {
            return value
                .parse::<u64>()
                .map(Some)
                .map_err(|_| parse_error(name, value));
        }
    }
    Ok(None)
}

fn reset_at(headers: &HeaderMap, now: DateTime<Utc>) -> TrelloResult<Option<DateTime<Utc>>> {
    if let Some(value) = header_str(headers, RESET_HEADER)? {
        let raw: i64 = value.parse().map_err(|_| parse_error(RESET_HEADER, value))?;
        return if raw >= EPOCH_THRESHOLD {
            DateTime::from_timestamp(raw, 0)
                .map(Some)
                .ok_or_else(|| parse_error(RESET_HEADER, value))
        } else {
            offset(now, TimeDelta::try_seconds(raw))
                .map(Some)
                .ok_or_else(|| parse_error(RESET_HEADER, value))
        };
    }

    if let Some(value) = header_str(headers, RETRY_AFTER.as_str())? {
        if let Ok(seconds) = value.parse::<i64>() {
            return offset(now, TimeDelta::try_seconds(seconds))
                .map(Some)
                .ok_or_else(|| parse_error(RETRY_AFTER.as_str(), value));
        }
        return DateTime::parse_from_rfc2822(value)
            .map(|date| Some(date.with_timezone(&Utc)))
            .map_err(|_| parse_error(RETRY_AFTER.as_str(), value));
    }

    for name in INTERVAL_MS_HEADERS {
        if let Some(value) = header_str(headers, name)? {
            let interval: i64 = value.parse().map_err(|_| parse_error(name, value))?;
            return offset(now, TimeDelta::try_milliseconds(interval))
                .map(Some)
                .ok_or_else(|| parse_error(name, value));
        }
    }

    Ok(None)
}

/// `None` when the delta or the resulting instant is out of range.
fn offset(now: DateTime<Utc>, delta: Option<TimeDelta>) -> Option<DateTime<Utc>> {
    now.checked_add_signed(delta?)
}

fn parse_error(header: &str, value: &str) -> TrelloError {
    TrelloError::RateLimitParseError {
        header: header.to_string(),
        value: value.to_string()
    }
}
