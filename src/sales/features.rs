//! Feature table handed to the forecaster

use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::sales::DATE;
use crate::temporal;

/// Model-ready view of a table: `date` plus every numeric column
///
/// When a `date` column is present the calendar features (weekend flag
/// included) are derived from it again, so they always agree with the date.
/// Without one, only the numeric columns are returned. Text columns are
/// dropped either way.
pub fn prepare_features(frame: &DataFrame) -> Result<DataFrame> {
    if !frame.contains_column(DATE) {
        let numeric = frame.numeric_column_names();
        let names: Vec<&str> = numeric.iter().map(String::as_str).collect();
        return frame.select(&names);
    }

    let enriched = temporal::with_calendar_features(frame, DATE, true)?;
    let numeric = enriched.numeric_column_names();
    let names: Vec<&str> = std::iter::once(DATE)
        .chain(numeric.iter().map(String::as_str))
        .collect();
    enriched.select(&names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use chrono::NaiveDate;

    #[test]
    fn test_keeps_date_and_numeric_columns() {
        let mut df = DataFrame::new();
        df.add_column(
            "date",
            Column::from_dates(vec![
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 4).unwrap(),
            ]),
        )
        .unwrap();
        df.add_column("sales", Column::from_f64(vec![100.0, 200.0])).unwrap();
        df.add_column("Category", Column::from_strings(vec!["a", "b"])).unwrap();

        let features = prepare_features(&df).unwrap();
        assert_eq!(features.column_names()[0], "date");
        assert!(!features.contains_column("Category"));
        for name in ["sales", "year", "month", "day", "quarter", "week_of_year", "is_weekend"] {
            assert!(features.contains_column(name), "missing {}", name);
        }
        assert_eq!(features.get_column_numeric_values("is_weekend").unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_without_date_returns_numeric_only() {
        let mut df = DataFrame::new();
        df.add_column("x", Column::from_i64(vec![1, 2])).unwrap();
        df.add_column("label", Column::from_strings(vec!["a", "b"])).unwrap();
        let features = prepare_features(&df).unwrap();
        assert_eq!(features.column_names(), &["x"]);
    }
}
