use crate::error::CoreError;
use chrono::format::{Item, Pad, Parsed, StrftimeItems, parse_and_remainder};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::fmt::Write;

pub const DEFAULT_OUTPUT_FORMAT: &str = "%d/%m/%Y";
pub const DEFAULT_INPUT_FORMAT: &str = "%Y-%m-%d";

/// Output format of [`add_day_hour`].
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats accepted by [`add_day_hour`], tried in order.
const DATE_TIME_INPUTS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Re-format `input` from `in_fmt` to `out_fmt` (chrono strftime syntax).
///
/// Parsing is strict: surrounding whitespace, signed numbers, trailing
/// characters, out-of-range fields and dates that do not exist on the
/// calendar all yield `None`, as does an output format that cannot be
/// rendered. Formats without time fields parse at midnight.
pub fn convert_date_format(input: &str, out_fmt: &str, in_fmt: &str) -> Option<String> {
    let parsed = parse_strict(input, in_fmt)?;
    let date = parsed.to_naive_date().ok()?;
    let time = parsed.to_naive_time().unwrap_or(NaiveTime::MIN);
    let value = NaiveDateTime::new(date, time);

    let items: Vec<Item<'_>> = StrftimeItems::new(out_fmt).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", value.format_with_items(items.into_iter())).ok()?;
    Some(out)
}

/// Item-by-item parse. chrono alone skips whitespace and accepts a sign in
/// front of numeric fields; here a numeric field must start with a digit,
/// unless the field is space padded (`%e`).
fn parse_strict(input: &str, fmt: &str) -> Option<Parsed> {
    let mut parsed = Parsed::new();
    let mut rest = input;
    for item in StrftimeItems::new(fmt) {
        if let Item::Numeric(_, pad) = &item {
            let first = rest.chars().next()?;
            let padded = *pad == Pad::Space && first == ' ';
            if !first.is_ascii_digit() && !padded {
                return None;
            }
        }
        rest = parse_and_remainder(&mut parsed, rest, std::iter::once(item)).ok()?;
    }
    rest.is_empty().then_some(parsed)
}

/// `Y-m-d` → `d/m/Y`.
pub fn convert_date(input: &str) -> Option<String> {
    convert_date_format(input, DEFAULT_OUTPUT_FORMAT, DEFAULT_INPUT_FORMAT)
}

/// Unit for [`add_day_hour`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Hours,
    Days,
}

impl TimeUnit {
    /// `"hours"` selects hours; any other label means days.
    pub fn from_label(label: &str) -> Self {
        if label == "hours" {
            TimeUnit::Hours
        } else {
            TimeUnit::Days
        }
    }
}

impl From<&str> for TimeUnit {
    fn from(label: &str) -> Self {
        TimeUnit::from_label(label)
    }
}

/// Shift a timestamp by `amount` hours or days and render it as
/// `Y-m-d H:i:s`.
///
/// Accepts `2024-01-01 00:00:00`, `2024-01-01T00:00:00`, `2024-01-01 00:00`,
/// RFC 3339 (wall-clock time kept, offset dropped) and bare dates.
pub fn add_day_hour(
    date_time: &str,
    amount: i64,
    unit: impl Into<TimeUnit>,
) -> Result<String, CoreError> {
    let start = parse_loose(date_time)
        .ok_or_else(|| CoreError::InvalidDateTime(date_time.to_string()))?;

    let delta = match unit.into() {
        TimeUnit::Hours => TimeDelta::try_hours(amount),
        TimeUnit::Days => TimeDelta::try_days(amount),
    }
    .ok_or_else(|| CoreError::InvalidDateTime(format!("offset {amount} out of range")))?;

    let shifted = start
        .checked_add_signed(delta)
        .ok_or_else(|| CoreError::InvalidDateTime(format!("{date_time} + {amount} out of range")))?;

    Ok(shifted.format(DATE_TIME_FORMAT).to_string())
}

fn parse_loose(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    DATE_TIME_INPUTS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
