//! Quantile-based customer tiers

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::column::Column;
use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::groupby::GroupByExt;
use crate::na::NA;
use crate::sales::CUSTOMER_ID;
use crate::stats;

/// Quantile of customer totals and order counts that marks the top tier
pub const TIER_QUANTILE: f64 = 0.8;

/// Tier assigned to a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CustomerTier {
    #[serde(rename = "VIP")]
    Vip,
    #[serde(rename = "High Value")]
    HighValue,
    Frequent,
    Regular,
}

impl CustomerTier {
    /// Tier for a customer given the two thresholds
    pub fn classify(total_sales: f64, order_count: usize, sales_threshold: f64, count_threshold: f64) -> Self {
        let big_spender = total_sales >= sales_threshold;
        let frequent = order_count as f64 >= count_threshold;
        match (big_spender, frequent) {
            (true, true) => CustomerTier::Vip,
            (true, false) => CustomerTier::HighValue,
            (false, true) => CustomerTier::Frequent,
            (false, false) => CustomerTier::Regular,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerTier::Vip => "VIP",
            CustomerTier::HighValue => "High Value",
            CustomerTier::Frequent => "Frequent",
            CustomerTier::Regular => "Regular",
        }
    }
}

impl fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-customer aggregate with its tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSegment {
    pub customer_id: String,
    pub total_sales: f64,
    /// Rows with a present sales value
    pub order_count: usize,
    /// None when the customer has no present sales value
    pub avg_order_value: Option<f64>,
    pub tier: CustomerTier,
}

/// Aggregate sales per customer and assign tiers
///
/// Customers come out sorted by id; rows without a customer id are skipped.
/// Thresholds are the 0.8 quantiles (linear interpolation) of the totals and
/// of the order counts across customers, so every customer lands in exactly
/// one tier.
pub fn segment_customers(frame: &DataFrame, sales_col: &str) -> Result<Vec<CustomerSegment>> {
    frame.require_columns(&[CUSTOMER_ID, sales_col])?;

    let customers = frame.groupby_str(CUSTOMER_ID)?;
    let totals = customers.sum(sales_col)?;
    let counts = customers.count(sales_col)?;
    let means = customers.mean(sales_col)?;
    if totals.is_empty() {
        return Ok(Vec::new());
    }

    let total_values: Vec<f64> = totals.iter().map(|(_, s)| *s).collect();
    let count_values: Vec<f64> = counts.iter().map(|(_, c)| *c as f64).collect();
    let sales_threshold = stats::quantile(&total_values, TIER_QUANTILE)?;
    let count_threshold = stats::quantile(&count_values, TIER_QUANTILE)?;

    Ok(totals
        .into_iter()
        .zip(counts)
        .zip(means)
        .map(|(((customer_id, total_sales), (_, order_count)), (_, mean))| CustomerSegment {
            tier: CustomerTier::classify(total_sales, order_count, sales_threshold, count_threshold),
            customer_id,
            total_sales,
            order_count,
            avg_order_value: mean.into_option(),
        })
        .collect())
}

/// Segments as a table: `Customer ID`, `Total_Sales`, `Order_Count`,
/// `Avg_Order_Value`, `Segment`
pub fn segments_frame(segments: &[CustomerSegment]) -> Result<DataFrame> {
    let mut df = DataFrame::new();
    df.add_column(
        CUSTOMER_ID,
        Column::from_strings(segments.iter().map(|s| s.customer_id.clone()).collect()),
    )?;
    df.add_column(
        "Total_Sales",
        Column::from_f64(segments.iter().map(|s| s.total_sales).collect()),
    )?;
    df.add_column(
        "Order_Count",
        Column::from_i64(segments.iter().map(|s| s.order_count as i64).collect()),
    )?;
    df.add_column(
        "Avg_Order_Value",
        Column::Float64(segments.iter().map(|s| NA::from(s.avg_order_value)).collect()),
    )?;
    df.add_column(
        "Segment",
        Column::from_strings(segments.iter().map(|s| s.tier.as_str()).collect()),
    )?;
    Ok(df)
}

/// Number of customers per tier label
pub fn tier_counts(segments: &[CustomerSegment]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for segment in segments {
        *counts.entry(segment.tier.to_string()).or_insert(0) += 1;
    }
    counts
}
