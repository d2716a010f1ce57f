//! Calendar handling: date parsing, calendar features and daily ranges

pub mod window;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::column::{Column, ColumnType};
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::na::NA;

pub use window::{Window, WindowType};

/// Day-first format used by the sales exports (`dd/mm/yyyy`)
pub const DAY_FIRST_FORMAT: &str = "%d/%m/%Y";

/// Names of the derived calendar columns, in the order they are appended
pub const YEAR: &str = "year";
pub const MONTH: &str = "month";
pub const DAY: &str = "day";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const QUARTER: &str = "quarter";
pub const WEEK_OF_YEAR: &str = "week_of_year";
pub const IS_WEEKEND: &str = "is_weekend";

/// Calendar features of a single date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    pub year: i64,
    pub month: i64,
    pub day: i64,
    /// Monday = 0 ... Sunday = 6
    pub day_of_week: i64,
    pub quarter: i64,
    /// ISO-8601 week number
    pub week_of_year: i64,
    pub is_weekend: bool,
}

impl CalendarFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        let weekday = date.weekday();
        CalendarFeatures {
            year: date.year() as i64,
            month: date.month() as i64,
            day: date.day() as i64,
            day_of_week: weekday.num_days_from_monday() as i64,
            quarter: ((date.month() - 1) / 3 + 1) as i64,
            week_of_year: date.iso_week().week() as i64,
            is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
        }
    }
}

/// Parse one date string with the given chrono format
pub fn parse_date(value: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), format).ok()
}

/// Convert a text column into a Date column
///
/// Missing cells stay missing; a present cell that does not parse is an
/// error naming the column and the offending text. A column that is already
/// of Date type is returned as is, and an all-missing numeric column (what
/// CSV inference produces for an empty column) becomes an all-missing Date
/// column.
pub fn parse_date_column(column: &Column, name: &str, format: &str) -> Result<Column> {
    match column {
        Column::Date(_) => Ok(column.clone()),
        Column::String(cells) => {
            let mut dates = Vec::with_capacity(cells.len());
            for cell in cells {
                match cell {
                    NA::Value(text) => {
                        let date = parse_date(text, format).ok_or_else(|| Error::DateParse {
                            column: name.to_string(),
                            value: text.clone(),
                            format: format.to_string(),
                        })?;
                        dates.push(NA::Value(date));
                    }
                    NA::NA => dates.push(NA::NA),
                }
            }
            Ok(Column::Date(dates))
        }
        other if other.null_count() == other.len() => Ok(Column::Date(vec![NA::NA; other.len()])),
        other => Err(Error::ColumnTypeMismatch {
            name: name.to_string(),
            expected: ColumnType::String,
            found: other.column_type(),
        }),
    }
}

/// Return a copy of `frame` with calendar features derived from `date_column`
///
/// Existing feature columns are overwritten in place. Rows with a missing date
/// get missing features.
pub fn with_calendar_features(
    frame: &DataFrame,
    date_column: &str,
    include_weekend: bool,
) -> Result<DataFrame> {
    let features: Vec<Option<CalendarFeatures>> = frame
        .date_values(date_column)?
        .iter()
        .map(|d| d.get().map(CalendarFeatures::from_date))
        .collect();

    let extract = |f: fn(&CalendarFeatures) -> i64| -> Column {
        Column::Int64(features.iter().map(|c| NA::from(c.as_ref().map(f))).collect())
    };

    let mut result = frame.clone();
    result.set_column(YEAR, extract(|c| c.year))?;
    result.set_column(MONTH, extract(|c| c.month))?;
    result.set_column(DAY, extract(|c| c.day))?;
    result.set_column(DAY_OF_WEEK, extract(|c| c.day_of_week))?;
    result.set_column(QUARTER, extract(|c| c.quarter))?;
    result.set_column(WEEK_OF_YEAR, extract(|c| c.week_of_year))?;
    if include_weekend {
        result.set_column(IS_WEEKEND, extract(|c| c.is_weekend as i64))?;
    }
    Ok(result)
}

/// `periods` consecutive days starting the day after `last`
pub fn days_after(last: NaiveDate, periods: usize) -> Vec<NaiveDate> {
    (1..=periods as i64)
        .map(|i| last + Duration::days(i))
        .collect()
}
