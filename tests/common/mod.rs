//! Shared fixtures for integration tests
//!
//! Builds order exports in the day-first CSV layout and writes them to
//! temporary files that are removed on drop.

#![allow(dead_code)]

use std::io::Write;

use chrono::{Duration, NaiveDate};
use tempfile::NamedTempFile;

pub const HEADER: &str = "Order ID,Order Date,Ship Date,Customer ID,Segment,Region,State,Category,Product Name,Sales,Quantity,Discount";

const SEGMENTS: [&str; 3] = ["Consumer", "Corporate", "Home Office"];
const REGIONS: [&str; 4] = ["East", "West", "Central", "South"];
const STATES: [&str; 4] = ["New York", "California", "Texas", "Florida"];
const CATEGORIES: [&str; 3] = ["Furniture", "Office Supplies", "Technology"];

/// One order line
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub ship_days: i64,
    pub customer_id: String,
    pub segment: String,
    pub region: String,
    pub state: String,
    pub category: String,
    pub product: String,
    pub sales: f64,
    pub quantity: i64,
    pub discount: f64,
}

impl OrderRow {
    pub fn to_csv_line(&self) -> String {
        let ship = self.order_date + Duration::days(self.ship_days);
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            self.order_id,
            self.order_date.format("%d/%m/%Y"),
            ship.format("%d/%m/%Y"),
            self.customer_id,
            self.segment,
            self.region,
            self.state,
            self.category,
            self.product,
            self.sales,
            self.quantity,
            self.discount
        )
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Deterministic order lines over `days` consecutive days, `per_day` per day
///
/// Sales follow a weekly pattern plus a slow upward trend so the forecaster
/// has something to learn.
pub fn generate_orders(start: NaiveDate, days: usize, per_day: usize) -> Vec<OrderRow> {
    let mut state: u64 = 42;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (state >> 33) as f64 / (u32::MAX as f64)
    };

    let mut rows = Vec::with_capacity(days * per_day);
    for day in 0..days {
        let order_date = start + Duration::days(day as i64);
        let weekly = 1.0 + 0.3 * ((day % 7) as f64 / 6.0);
        for line in 0..per_day {
            let n = day * per_day + line;
            rows.push(OrderRow {
                order_id: format!("ORD-{:05}", n / 2),
                order_date,
                ship_days: (n % 5) as i64,
                customer_id: format!("CUST-{:03}", n % 25),
                segment: SEGMENTS[n % SEGMENTS.len()].to_string(),
                region: REGIONS[n % REGIONS.len()].to_string(),
                state: STATES[(n / 3) % STATES.len()].to_string(),
                category: CATEGORIES[(n / 2) % CATEGORIES.len()].to_string(),
                product: format!("Product {}", n % 11),
                sales: ((100.0 + day as f64) * weekly * (0.5 + next())).round(),
                quantity: 1 + (n % 4) as i64,
                discount: if n % 3 == 0 { 0.1 } else { 0.0 },
            });
        }
    }
    rows
}

/// Replace the order and customer ids with integers, blanking one of each
pub fn with_integer_ids(rows: &[OrderRow], blank_order: usize, blank_customer: usize) -> Vec<OrderRow> {
    rows.iter()
        .enumerate()
        .map(|(n, row)| {
            let mut row = row.clone();
            row.order_id = if n == blank_order { String::new() } else { (1000 + n / 2).to_string() };
            row.customer_id = if n == blank_customer { String::new() } else { (n % 25).to_string() };
            row
        })
        .collect()
}

/// Write `rows` under the standard header
pub fn write_orders(rows: &[OrderRow]) -> NamedTempFile {
    let lines: Vec<String> = rows.iter().map(OrderRow::to_csv_line).collect();
    write_csv(HEADER, &lines)
}

/// Write a CSV file from a header line and data lines
pub fn write_csv(header: &str, lines: &[String]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("salesrs_test_")
        .suffix(".csv")
        .tempfile()
        .expect("failed to create temporary CSV");
    writeln!(file, "{}", header).expect("failed to write header");
    for line in lines {
        writeln!(file, "{}", line).expect("failed to write row");
    }
    file.flush().expect("failed to flush CSV");
    file
}

/// Write a configuration file with the given extension
pub fn write_config(extension: &str, body: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("salesrs_config_")
        .suffix(extension)
        .tempfile()
        .expect("failed to create temporary config");
    file.write_all(body.as_bytes()).expect("failed to write config");
    file
}
