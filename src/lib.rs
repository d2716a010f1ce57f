//! salesrs: sales analytics over order exports
//!
//! Loads order-level CSV data into a small columnar [`DataFrame`], derives
//! calendar and customer features, aggregates daily sales, trains a
//! regression forecaster and reports KPIs, customer tiers and a forward
//! projection.
//!
//! ```no_run
//! use salesrs::config::PipelineConfig;
//! use salesrs::pipeline::SalesPipeline;
//!
//! let report = SalesPipeline::new(PipelineConfig::default()).run().unwrap();
//! println!("{}", report.to_json().unwrap());
//! ```

pub mod column;
pub mod config;
pub mod dataframe;
pub mod error;
pub mod groupby;
pub mod io;
pub mod ml;
pub mod na;
pub mod pipeline;
pub mod sales;
pub mod stats;
pub mod temporal;

// Re-export commonly used types
pub use column::{Column, ColumnType};
pub use config::PipelineConfig;
pub use dataframe::DataFrame;
pub use error::{Error, Result};
pub use groupby::{GroupBy, GroupByExt};
pub use ml::{ModelType, SalesForecaster};
pub use na::NA;
pub use pipeline::{PipelineReport, SalesPipeline};
pub use sales::SalesDataProcessor;

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
