//! Safe scalar coercion from spreadsheet cells.
//!
//! Nothing in here returns an error: a malformed cell degrades to the
//! caller's default so one bad value cannot abort a whole import.

use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::sheet::Cell;

/// Text values that mean "no value" in the source sheets.
const BLANK_MARKERS: [&str; 4] = ["", "-", "--", "\u{2013}"];

/// Accepted text date layouts, tried in order.
///
/// `%d/%m/%Y` wins over `%m/%d/%Y` for strings valid under both
/// (e.g. "03/04/2024" is 3 April). Do not reorder without confirming
/// how the sheet authors write dates.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

const SECS_PER_DAY: i64 = 86_400;

pub fn to_decimal(cell: &Cell, default: Option<Decimal>) -> Option<Decimal> {
    match cell {
        Cell::Empty => default,
        Cell::Number(n) => decimal_from_f64(*n).or(default),
        Cell::Bool(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
        Cell::Text(s) => {
            let cleaned = s.trim().replace(',', "");
            if BLANK_MARKERS.contains(&cleaned.as_str()) {
                return default;
            }
            Decimal::from_str(&cleaned)
                .or_else(|_| Decimal::from_scientific(&cleaned))
                .ok()
                .or(default)
        }
        Cell::DateTime { .. } | Cell::Duration { .. } => default,
    }
}

/// Exact decimal for the shortest text form of a float, so 1345.59 stays
/// 1345.59 rather than its nearest binary neighbour.
pub fn decimal_from_f64(n: f64) -> Option<Decimal> {
    if !n.is_finite() {
        return None;
    }
    Decimal::from_str(&n.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(n))
}

/// Integer coercion, truncating toward zero.
pub fn to_int(cell: &Cell, default: Option<i64>) -> Option<i64> {
    match to_decimal(cell, None) {
        Some(d) => d.trunc().to_i64().or(default),
        None => default,
    }
}

pub fn to_iso_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::DateTime { datetime } => Some(datetime.date()),
        Cell::Text(s) => {
            let s = s.trim();
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        }
        _ => None,
    }
}

/// Whole days held. Durations floor like the sheet's own day counts.
pub fn duration_to_days(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Duration { duration_secs } => Some(duration_secs.div_euclid(SECS_PER_DAY)),
        Cell::Number(n) if n.is_finite() => Some(n.trunc() as i64),
        _ => None,
    }
}
