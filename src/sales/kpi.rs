//! Row filters, headline KPIs and per-dimension breakdowns

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::groupby::GroupByExt;
use crate::sales::{CATEGORY, CUSTOMER_ID, ORDER_DATE, ORDER_ID, PROCESSING_TIME, PROFIT, REGION, SALES, SEGMENT};

/// Row selection by order-date range and dimension values
///
/// Unset fields select everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesFilter {
    /// First order date kept (inclusive)
    pub start: Option<NaiveDate>,
    /// Last order date kept (inclusive)
    pub end: Option<NaiveDate>,
    pub category: Option<String>,
    pub segment: Option<String>,
    pub region: Option<String>,
}

impl SalesFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Rows of `frame` passing every set condition
    ///
    /// Rows with a missing value in a filtered column never pass.
    pub fn apply(&self, frame: &DataFrame) -> Result<DataFrame> {
        let mut keep = vec![true; frame.row_count()];

        if self.start.is_some() || self.end.is_some() {
            for (k, date) in keep.iter_mut().zip(frame.date_values(ORDER_DATE)?) {
                *k &= match date.get() {
                    Some(d) => self.start.map_or(true, |s| d >= s) && self.end.map_or(true, |e| d <= e),
                    None => false,
                };
            }
        }

        for (column, wanted) in [
            (CATEGORY, &self.category),
            (SEGMENT, &self.segment),
            (REGION, &self.region),
        ] {
            if let Some(wanted) = wanted {
                for (k, value) in keep.iter_mut().zip(frame.string_values(column)?) {
                    *k &= value.value() == Some(wanted);
                }
            }
        }

        frame.filter(&keep)
    }
}

/// Headline figures of a (filtered) order table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_sales: f64,
    /// 0 when the table has no profit column
    pub total_profit: f64,
    /// Distinct order ids
    pub total_orders: usize,
    /// Sales per distinct order, 0 without orders
    pub avg_order_value: f64,
    /// Distinct customer ids
    pub unique_customers: usize,
    /// Mean days between order and shipping
    pub avg_processing_time: Option<f64>,
}

impl KpiSummary {
    pub fn compute(frame: &DataFrame) -> Result<Self> {
        let total_sales = column_sum(frame, SALES)?;
        let total_profit = if frame.contains_column(PROFIT) {
            column_sum(frame, PROFIT)?
        } else {
            0.0
        };
        let total_orders = distinct_count(frame, ORDER_ID);
        let avg_order_value = if total_orders == 0 {
            0.0
        } else {
            total_sales / total_orders as f64
        };

        let avg_processing_time = match frame.column(PROCESSING_TIME) {
            Some(_) => {
                let days: Vec<f64> = frame
                    .numeric_values(PROCESSING_TIME)?
                    .iter()
                    .filter_map(|v| v.get())
                    .collect();
                if days.is_empty() {
                    None
                } else {
                    Some(days.iter().sum::<f64>() / days.len() as f64)
                }
            }
            None => None,
        };

        Ok(KpiSummary {
            total_sales,
            total_profit,
            total_orders,
            avg_order_value,
            unique_customers: distinct_count(frame, CUSTOMER_ID),
            avg_processing_time,
        })
    }
}

fn column_sum(frame: &DataFrame, name: &str) -> Result<f64> {
    Ok(frame.numeric_values(name)?.iter().filter_map(|v| v.get()).sum())
}

fn distinct_count(frame: &DataFrame, name: &str) -> usize {
    match frame.column(name) {
        Some(column) => (0..column.len())
            .filter_map(|i| column.display_value(i))
            .collect::<HashSet<_>>()
            .len(),
        None => 0,
    }
}

/// Total of `value_col` per value of `dimension`, largest first
///
/// Ties keep ascending label order.
pub fn sales_breakdown(frame: &DataFrame, dimension: &str, value_col: &str) -> Result<Vec<(String, f64)>> {
    frame.require_columns(&[dimension, value_col])?;
    let mut totals = frame.groupby_str(dimension)?.sum(value_col)?;
    totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(totals)
}

/// First `n` entries of a breakdown
pub fn top_n(mut breakdown: Vec<(String, f64)>, n: usize) -> Vec<(String, f64)> {
    breakdown.truncate(n);
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::error::Error;
    use crate::na::NA;

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn orders() -> DataFrame {
        let mut df = DataFrame::new();
        df.add_column("Order ID", Column::from_strings(vec!["o1", "o1", "o2", "o3"])).unwrap();
        df.add_column("Order Date", Column::from_dates(vec![jan(1), jan(1), jan(5), jan(9)]))
            .unwrap();
        df.add_column("Customer ID", Column::from_strings(vec!["c1", "c1", "c2", "c1"]))
            .unwrap();
        df.add_column("Category", Column::from_strings(vec!["Furniture", "Technology", "Technology", "Office"]))
            .unwrap();
        df.add_column("Segment", Column::from_strings(vec!["Consumer", "Consumer", "Corporate", "Consumer"]))
            .unwrap();
        df.add_column("Region", Column::from_strings(vec!["East", "East", "West", "West"]))
            .unwrap();
        df.add_column("Sales", Column::from_f64(vec![100.0, 300.0, 50.0, 150.0])).unwrap();
        df.add_column("Profit", Column::from_f64(vec![20.0, 60.0, 10.0, 30.0])).unwrap();
        df.add_column(
            "Order Processing Time",
            Column::Int64(vec![NA::Value(2), NA::Value(2), NA::NA, NA::Value(5)]),
        )
        .unwrap();
        df
    }

    #[test]
    fn test_kpis() {
        let kpis = KpiSummary::compute(&orders()).unwrap();
        assert_eq!(kpis.total_sales, 600.0);
        assert_eq!(kpis.total_profit, 120.0);
        assert_eq!(kpis.total_orders, 3);
        assert_eq!(kpis.avg_order_value, 200.0);
        assert_eq!(kpis.unique_customers, 2);
        assert_eq!(kpis.avg_processing_time, Some(3.0));
    }

    #[test]
    fn test_kpis_without_optional_columns() {
        let mut df = DataFrame::new();
        df.add_column("Sales", Column::from_f64(vec![])).unwrap();
        let kpis = KpiSummary::compute(&df).unwrap();
        assert_eq!(kpis.total_profit, 0.0);
        assert_eq!(kpis.total_orders, 0);
        assert_eq!(kpis.avg_order_value, 0.0);
        assert_eq!(kpis.avg_processing_time, None);
    }

    #[test]
    fn test_filter_by_date_and_dimension() {
        let filter = SalesFilter {
            start: Some(jan(2)),
            end: Some(jan(9)),
            ..SalesFilter::default()
        };
        assert_eq!(filter.apply(&orders()).unwrap().row_count(), 2);

        let filter = SalesFilter {
            category: Some("Technology".to_string()),
            region: Some("East".to_string()),
            ..SalesFilter::default()
        };
        let filtered = filter.apply(&orders()).unwrap();
        assert_eq!(filtered.get_column_numeric_values("Sales").unwrap(), vec![300.0]);

        assert_eq!(SalesFilter::new().apply(&orders()).unwrap(), orders());
    }

    #[test]
    fn test_filter_on_missing_column() {
        let mut df = DataFrame::new();
        df.add_column("Sales", Column::from_f64(vec![1.0])).unwrap();
        let filter = SalesFilter {
            segment: Some("Consumer".to_string()),
            ..SalesFilter::default()
        };
        assert!(matches!(filter.apply(&df), Err(Error::ColumnNotFound(_))));
    }

    #[test]
    fn test_breakdown_and_top_n() {
        let breakdown = sales_breakdown(&orders(), "Category", "Sales").unwrap();
        assert_eq!(
            breakdown,
            vec![
                ("Technology".to_string(), 350.0),
                ("Office".to_string(), 150.0),
                ("Furniture".to_string(), 100.0),
            ]
        );
        assert_eq!(top_n(breakdown, 1), vec![("Technology".to_string(), 350.0)]);
    }
}
