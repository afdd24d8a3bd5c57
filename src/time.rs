//! Calendar phrase recognition.
//!
//! Turns expressions such as "Q3 2024", "March 2023", "2022", "last month",
//! "last quarter" and "ytd" into concrete `[start, end]` date pairs. The
//! reference date for relative phrases is always passed in by the caller.

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Filter field name under which a recognized date range is reported.
pub const DATE_FIELD: &str = "date";

lazy_static! {
    static ref QUARTER_RE: Regex = Regex::new(r"\b(?:q([1-4])|quarter\s+([1-4]))\b").unwrap();
    static ref YEAR_RE: Regex = Regex::new(r"\b(20\d{2})\b").unwrap();
    static ref MONTH_YEAR_RE: Regex = Regex::new(
        r"\b(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)\.?\s+(?:of\s+)?(20\d{2})\b"
    )
    .unwrap();
    static ref LAST_MONTH_RE: Regex = Regex::new(r"\blast\s+month\b").unwrap();
    static ref LAST_QUARTER_RE: Regex = Regex::new(r"\blast\s+quarter\b").unwrap();
    static ref YTD_RE: Regex = Regex::new(r"\b(?:ytd|year[\s-]to[\s-]date)\b").unwrap();
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }

    /// `[start, end]` as ISO `YYYY-MM-DD` strings.
    pub fn to_iso_pair(&self) -> [String; 2] {
        [self.start_iso(), self.end_iso()]
    }
}

// Emitted as a two-element array, the shape the visualization layer consumes.
impl Serialize for DateRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.start_iso())?;
        seq.serialize_element(&self.end_iso())?;
        seq.end()
    }
}

/// Recognize a single date expression in `text`.
///
/// Patterns are tried from most to least specific and the first hit wins:
/// quarter + year, month + year, bare year, last month, last quarter,
/// year to date. Conflicting expressions are not merged.
pub fn parse_date_phrase(text: &str, today: NaiveDate) -> Option<DateRange> {
    let text = text.to_lowercase();

    if let Some(range) = quarter_with_year(&text) {
        return Some(range);
    }

    if let Some(caps) = MONTH_YEAR_RE.captures(&text) {
        let month = month_number(&caps[1])?;
        let year: i32 = caps[2].parse().ok()?;
        return month_span(year, month);
    }

    if let Some(caps) = YEAR_RE.captures(&text) {
        let year: i32 = caps[1].parse().ok()?;
        return Some(DateRange {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        });
    }

    if LAST_MONTH_RE.is_match(&text) {
        let (year, month) = if today.month() == 1 {
            (today.year() - 1, 12)
        } else {
            (today.year(), today.month() - 1)
        };
        return month_span(year, month);
    }

    if LAST_QUARTER_RE.is_match(&text) {
        let current = quarter_of(today.month());
        let (year, quarter) = if current == 1 {
            (today.year() - 1, 4)
        } else {
            (today.year(), current - 1)
        };
        return quarter_span(year, quarter);
    }

    if YTD_RE.is_match(&text) {
        return Some(DateRange {
            start: NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
            end: today,
        });
    }

    None
}

fn quarter_with_year(text: &str) -> Option<DateRange> {
    let caps = QUARTER_RE.captures(text)?;
    let quarter: u32 = caps
        .get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())?;
    let year: i32 = YEAR_RE.captures(text)?[1].parse().ok()?;
    quarter_span(year, quarter)
}

/// Quarter number (1-4) containing `month`.
fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

fn quarter_span(year: i32, quarter: u32) -> Option<DateRange> {
    let first_month = (quarter - 1) * 3 + 1;
    let last_month = first_month + 2;
    Some(DateRange {
        start: NaiveDate::from_ymd_opt(year, first_month, 1)?,
        end: last_day_of_month(year, last_month)?,
    })
}

fn month_span(year: i32, month: u32) -> Option<DateRange> {
    Some(DateRange {
        start: NaiveDate::from_ymd_opt(year, month, 1)?,
        end: last_day_of_month(year, month)?,
    })
}

/// Last calendar day of the month, leap years included.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}
