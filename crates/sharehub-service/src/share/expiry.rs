//! Relative expiration parsing for the admin tool.
//!
//! Grammar: an integer followed by `h` (hours), `d` (days), `w` (weeks),
//! `m` (calendar months) or `y` (calendar years). Empty input or `never`
//! means no expiration.

use chrono::{DateTime, Duration, Months, Utc};

use sharehub_core::error::AppError;
use sharehub_core::result::AppResult;

/// Resolve `input` relative to `now`.
pub fn parse_expiry(input: &str, now: DateTime<Utc>) -> AppResult<Option<DateTime<Utc>>> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("never") {
        return Ok(None);
    }

    let invalid = || {
        AppError::validation(format!(
            "Invalid duration '{input}': expected a number followed by h, d, w, m or y"
        ))
    };

    let Some((split, _)) = input.char_indices().last() else {
        return Err(invalid());
    };
    let (amount, unit) = input.split_at(split);
    let amount: u32 = amount.parse().map_err(|_| invalid())?;
    if amount == 0 {
        return Err(invalid());
    }

    let expires = match unit {
        "h" => now.checked_add_signed(Duration::hours(i64::from(amount))),
        "d" => now.checked_add_signed(Duration::days(i64::from(amount))),
        "w" => now.checked_add_signed(Duration::weeks(i64::from(amount))),
        "m" => now.checked_add_months(Months::new(amount)),
        "y" => amount
            .checked_mul(12)
            .and_then(|months| now.checked_add_months(Months::new(months))),
        _ => return Err(invalid()),
    };

    expires
        .map(Some)
        .ok_or_else(|| AppError::validation(format!("Duration '{input}' is out of range")))
}
