//! Loading and enriching order exports

use std::path::Path;

use log::{debug, info, warn};

use crate::column::Column;
use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::groupby::GroupByExt;
use crate::io;
use crate::ml::anomaly_detection;
use crate::na::NA;
use crate::sales::{
    features, segmentation, time_series, CustomerSegment, CUSTOMER_ID, CUSTOMER_ORDER_COUNT,
    CUSTOMER_TOTAL_SALES, DATE, ORDER_DATE, ORDER_ID, PROCESSING_TIME, PROFIT, REQUIRED_COLUMNS,
    SALES, SALES_PER_ORDER, SHIP_DATE,
};
use crate::stats;
use crate::temporal::{self, DAY_FIRST_FORMAT};

/// Profit estimated as a fixed share of sales
pub const PROFIT_MARGIN: f64 = 0.2;

/// Placeholder for missing categorical cells
pub const MISSING_CATEGORY: &str = "Unknown";

/// Loads order exports and derives the calendar, business and customer
/// columns the rest of the pipeline works with
#[derive(Debug, Clone)]
pub struct SalesDataProcessor {
    date_format: String,
}

impl Default for SalesDataProcessor {
    fn default() -> Self {
        SalesDataProcessor {
            date_format: DAY_FIRST_FORMAT.to_string(),
        }
    }
}

impl SalesDataProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another chrono format for the order and ship dates
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Read a CSV export and run [`preprocess`](Self::preprocess) on it
    pub fn load_and_preprocess<P: AsRef<Path>>(&self, path: P) -> Result<DataFrame> {
        let path = path.as_ref();
        let raw = io::read_csv(path)?;
        info!(
            "loaded {} rows and {} columns from {}",
            raw.row_count(),
            raw.column_count(),
            path.display()
        );
        self.preprocess(&raw)
    }

    /// Expected export columns absent from `frame`
    pub fn missing_required_columns(&self, frame: &DataFrame) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|c| !frame.contains_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    /// Parse dates, impute gaps and derive feature columns
    ///
    /// Returns a new frame; columns the derivations need but `frame` lacks
    /// simply skip those derivations.
    pub fn preprocess(&self, frame: &DataFrame) -> Result<DataFrame> {
        let mut df = frame.clone();

        let missing = self.missing_required_columns(&df);
        if !missing.is_empty() {
            warn!("input lacks expected columns: {}", missing.join(", "));
        }

        for name in [ORDER_DATE, SHIP_DATE] {
            if let Some(column) = df.column(name) {
                let parsed = temporal::parse_date_column(column, name, &self.date_format)?;
                df.set_column(name, parsed)?;
            }
        }

        impute_missing(&mut df)?;

        if df.contains_column(ORDER_DATE) {
            let order_dates = df.require_column(ORDER_DATE)?.clone();
            df.set_column(DATE, order_dates)?;
            df = temporal::with_calendar_features(&df, DATE, true)?;
        }

        if df.contains_column(SALES) {
            let profit = df
                .numeric_values(SALES)?
                .iter()
                .map(|v| v.map(|s| s * PROFIT_MARGIN))
                .collect();
            df.set_column(PROFIT, Column::Float64(profit))?;

            if is_key_column(&df, ORDER_ID) {
                let per_order = df.groupby_str(ORDER_ID)?.transform_sum(SALES)?;
                df.set_column(SALES_PER_ORDER, Column::Float64(per_order))?;
            }
        }

        if df.contains_column(ORDER_DATE) && df.contains_column(SHIP_DATE) {
            let lead_times = df
                .date_values(ORDER_DATE)?
                .iter()
                .zip(df.date_values(SHIP_DATE)?)
                .map(|(order, ship)| match (order, ship) {
                    (NA::Value(o), NA::Value(s)) => NA::Value((*s - *o).num_days()),
                    _ => NA::NA,
                })
                .collect();
            df.set_column(PROCESSING_TIME, Column::Int64(lead_times))?;
        }

        if is_key_column(&df, CUSTOMER_ID) {
            let (order_counts, totals) = {
                let customers = df.groupby_str(CUSTOMER_ID)?;
                let order_counts = if df.contains_column(ORDER_ID) {
                    Some(customers.transform_nunique(ORDER_ID)?)
                } else {
                    None
                };
                let totals = if df.contains_column(SALES) {
                    Some(customers.transform_sum(SALES)?)
                } else {
                    None
                };
                (order_counts, totals)
            };
            if let Some(counts) = order_counts {
                df.set_column(CUSTOMER_ORDER_COUNT, Column::Int64(counts))?;
            }
            if let Some(totals) = totals {
                df.set_column(CUSTOMER_TOTAL_SALES, Column::Float64(totals))?;
            }
        }

        debug!("preprocessed frame has {} columns", df.column_count());
        Ok(df)
    }

    /// Daily totals of `value_col`, see [`time_series::create_time_series`]
    pub fn create_time_series(
        &self,
        frame: &DataFrame,
        date_col: &str,
        value_col: &str,
    ) -> Result<DataFrame> {
        time_series::create_time_series(frame, date_col, value_col)
    }

    /// Date plus numeric columns, see [`features::prepare_features`]
    pub fn prepare_features(&self, frame: &DataFrame) -> Result<DataFrame> {
        features::prepare_features(frame)
    }

    /// Rows whose `column` value has a z-score above `threshold`
    pub fn detect_outliers(
        &self,
        frame: &DataFrame,
        column: &str,
        threshold: f64,
    ) -> Result<DataFrame> {
        anomaly_detection::detect_outliers(frame, column, threshold)
    }

    /// Customer tiers, see [`segmentation::segment_customers`]
    pub fn segment_customers(
        &self,
        frame: &DataFrame,
        sales_col: &str,
    ) -> Result<Vec<CustomerSegment>> {
        segmentation::segment_customers(frame, sales_col)
    }
}

/// Identifier columns; never imputed as measures
const IDENTIFIER_COLUMNS: [&str; 2] = [ORDER_ID, CUSTOMER_ID];

/// Whether `name` exists and can serve as a grouping key
fn is_key_column(frame: &DataFrame, name: &str) -> bool {
    matches!(
        frame.column(name),
        Some(Column::String(_)) | Some(Column::Int64(_)) | Some(Column::Float64(_))
    )
}

/// Median-fill numeric gaps and fill text gaps with the placeholder
///
/// Integer columns with gaps become Float64, as the median may be fractional.
/// Numeric identifier columns with gaps become text, the gaps taking the
/// placeholder. Columns without any present value are left as they are.
fn impute_missing(df: &mut DataFrame) -> Result<()> {
    let names: Vec<String> = df.column_names().to_vec();
    for name in names {
        let column = df.require_column(&name)?;
        if column.null_count() == 0 || column.null_count() == column.len() {
            continue;
        }

        let filled = match column {
            Column::Int64(_) | Column::Float64(_) if IDENTIFIER_COLUMNS.contains(&name.as_str()) => {
                debug!("filling {} gaps in identifier '{}'", column.null_count(), name);
                Column::String(
                    (0..column.len())
                        .map(|i| {
                            NA::Value(
                                column
                                    .display_value(i)
                                    .unwrap_or_else(|| MISSING_CATEGORY.to_string()),
                            )
                        })
                        .collect(),
                )
            }
            Column::Int64(_) | Column::Float64(_) => {
                let values = column.to_f64().unwrap_or_default();
                let present: Vec<f64> = values.iter().filter_map(|c| c.get()).collect();
                let median = stats::median(&present)?;
                debug!("filling {} gaps in '{}' with median {}", column.null_count(), name, median);
                Column::Float64(
                    values
                        .into_iter()
                        .map(|c| NA::Value(c.get().unwrap_or(median)))
                        .collect(),
                )
            }
            Column::String(values) => Column::String(
                values
                    .iter()
                    .map(|c| match c {
                        NA::Value(s) => NA::Value(s.clone()),
                        NA::NA => NA::Value(MISSING_CATEGORY.to_string()),
                    })
                    .collect(),
            ),
            Column::Date(_) => continue,
        };
        df.set_column(name, filled)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;
    use chrono::NaiveDate;

    fn raw_orders() -> DataFrame {
        let text = "\
Order ID,Order Date,Ship Date,Customer ID,Sales,Category,Quantity
A1,01/01/2020,03/01/2020,C1,100,Furniture,2
A1,01/01/2020,03/01/2020,C1,50,,
A2,04/01/2020,04/01/2020,C2,,Technology,1
A3,05/01/2020,09/01/2020,C1,200,Technology,4
";
        io::read_csv_from_reader(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_dates_and_calendar_features() {
        let df = SalesDataProcessor::new().preprocess(&raw_orders()).unwrap();
        let dates = df.date_values(DATE).unwrap();
        assert_eq!(dates[0], NA::Value(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()));
        // 1 Jan 2020 was a Wednesday, 4 and 5 Jan a weekend
        assert_eq!(df.get_column_numeric_values("day_of_week").unwrap()[0], 2.0);
        assert_eq!(df.get_column_numeric_values("is_weekend").unwrap(), vec![0.0, 0.0, 1.0, 1.0]);
        assert_eq!(
            df.get_column_numeric_values(PROCESSING_TIME).unwrap(),
            vec![2.0, 2.0, 0.0, 4.0]
        );
    }

    #[test]
    fn test_imputation() {
        let df = SalesDataProcessor::new().preprocess(&raw_orders()).unwrap();
        // median of 100, 50, 200
        assert_eq!(df.get_column_numeric_values(SALES).unwrap()[2], 100.0);
        assert_eq!(df.column("Quantity").unwrap().column_type(), ColumnType::Float64);
        assert_eq!(df.get_column_numeric_values("Quantity").unwrap()[1], 2.0);
        assert_eq!(
            df.string_values("Category").unwrap()[1],
            NA::Value(MISSING_CATEGORY.to_string())
        );
    }

    #[test]
    fn test_business_and_customer_features() {
        let df = SalesDataProcessor::new().preprocess(&raw_orders()).unwrap();
        assert_eq!(
            df.get_column_numeric_values(PROFIT).unwrap(),
            vec![20.0, 10.0, 20.0, 40.0]
        );
        assert_eq!(
            df.get_column_numeric_values(SALES_PER_ORDER).unwrap(),
            vec![150.0, 150.0, 100.0, 200.0]
        );
        assert_eq!(
            df.get_column_numeric_values(CUSTOMER_ORDER_COUNT).unwrap(),
            vec![2.0, 2.0, 1.0, 2.0]
        );
        assert_eq!(
            df.get_column_numeric_values(CUSTOMER_TOTAL_SALES).unwrap(),
            vec![350.0, 350.0, 100.0, 350.0]
        );
    }

    #[test]
    fn test_integer_ids_with_gaps_stay_keys() {
        let text = "\
Order ID,Customer ID,Sales
1,10,100
1,10,50
2,,20
,11,30
";
        let raw = io::read_csv_from_reader(text.as_bytes()).unwrap();
        let df = SalesDataProcessor::new().preprocess(&raw).unwrap();

        assert_eq!(
            df.string_values(CUSTOMER_ID).unwrap(),
            &[
                NA::Value("10".to_string()),
                NA::Value("10".to_string()),
                NA::Value(MISSING_CATEGORY.to_string()),
                NA::Value("11".to_string()),
            ]
        );
        assert_eq!(
            df.get_column_numeric_values(SALES_PER_ORDER).unwrap(),
            vec![150.0, 150.0, 20.0, 30.0]
        );
        assert_eq!(
            df.get_column_numeric_values(CUSTOMER_TOTAL_SALES).unwrap(),
            vec![150.0, 150.0, 20.0, 30.0]
        );
        assert_eq!(
            df.get_column_numeric_values(CUSTOMER_ORDER_COUNT).unwrap(),
            vec![1.0, 1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_input_is_not_mutated() {
        let raw = raw_orders();
        let before = raw.clone();
        SalesDataProcessor::new().preprocess(&raw).unwrap();
        assert_eq!(raw, before);
    }

    #[test]
    fn test_missing_required_columns() {
        let processor = SalesDataProcessor::new();
        let missing = processor.missing_required_columns(&raw_orders());
        assert!(missing.contains(&"Region".to_string()));
        assert!(!missing.contains(&"Sales".to_string()));
        assert_eq!(missing.len(), 5);
    }

    #[test]
    fn test_bad_date_is_reported() {
        let text = "Order Date,Sales\n2020-01-01,10\n";
        let raw = io::read_csv_from_reader(text.as_bytes()).unwrap();
        let err = SalesDataProcessor::new().preprocess(&raw).unwrap_err();
        assert!(err.to_string().contains("2020-01-01"));
    }
}
