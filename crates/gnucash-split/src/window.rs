use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::{Result, SplitError};

/// End year used when none is given; far enough out to keep everything. A
/// later start year stretches it to that year.
pub const DEFAULT_END_YEAR: i32 = 2442;

const POSTED_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Where a transaction falls relative to a [`DateWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    Within,
    After,
}

/// Inclusive range from midnight on January 1st of the start year to the last
/// second of December 31st of the end year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start_year: i32,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateWindow {
    pub fn from_years(start_year: i32, end_year: Option<i32>) -> Result<Self> {
        let end_year = end_year.unwrap_or(DEFAULT_END_YEAR.max(start_year));
        if end_year < start_year {
            return Err(SplitError::InvalidWindow(format!(
                "end year {end_year} is before start year {start_year}"
            )));
        }
        let start = NaiveDate::from_ymd_opt(start_year, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(|| SplitError::InvalidWindow(format!("year {start_year} out of range")))?;
        let end = NaiveDate::from_ymd_opt(end_year, 12, 31)
            .and_then(|date| date.and_hms_opt(23, 59, 59))
            .ok_or_else(|| SplitError::InvalidWindow(format!("year {end_year} out of range")))?;
        Ok(DateWindow {
            start_year,
            start,
            end,
        })
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn classify(&self, posted: NaiveDateTime) -> Placement {
        if posted < self.start {
            Placement::Before
        } else if posted > self.end {
            Placement::After
        } else {
            Placement::Within
        }
    }
}

/// A `trn:date-posted` timestamp such as `2020-03-14 10:59:00 +0100`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedDate {
    /// Wall-clock time as written; the offset is not applied.
    pub local: NaiveDateTime,
    /// The offset exactly as written, e.g. `+0100`.
    pub offset: String,
}

impl PostedDate {
    pub fn parse(value: &str) -> Result<Self> {
        let parsed = DateTime::parse_from_str(value.trim(), POSTED_FORMAT).map_err(|source| {
            SplitError::InvalidDate {
                value: value.to_string(),
                source,
            }
        })?;
        let offset = value.split_whitespace().nth(2).unwrap_or_default();
        Ok(PostedDate {
            local: parsed.naive_local(),
            offset: offset.to_string(),
        })
    }
}
