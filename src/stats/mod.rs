//! Descriptive statistics over plain `f64` slices
//!
//! Callers strip missing cells before calling in; every function here assumes
//! the slice holds only present values.

pub mod descriptive;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Summary statistics of a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    /// Number of observations
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation (ddof = 1, 0 for a single observation)
    pub std: f64,
    pub min: f64,
    /// 25% quantile
    pub q1: f64,
    pub median: f64,
    /// 75% quantile
    pub q3: f64,
    pub max: f64,
}

/// Summarize a sample
///
/// # Example
/// ```rust
/// use salesrs::stats;
///
/// let summary = stats::describe(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// assert_eq!(summary.median, 3.0);
/// ```
pub fn describe<T: AsRef<[f64]>>(data: T) -> Result<DescriptiveStats> {
    descriptive::describe_impl(data.as_ref())
}

/// Arithmetic mean
pub fn mean<T: AsRef<[f64]>>(data: T) -> Result<f64> {
    descriptive::mean_impl(data.as_ref())
}

/// Variance with `ddof` delta degrees of freedom
pub fn variance<T: AsRef<[f64]>>(data: T, ddof: usize) -> Result<f64> {
    descriptive::variance_impl(data.as_ref(), ddof)
}

/// Standard deviation with `ddof` delta degrees of freedom
pub fn std_dev<T: AsRef<[f64]>>(data: T, ddof: usize) -> Result<f64> {
    Ok(variance(data, ddof)?.sqrt())
}

/// Median (mean of the two middle values for even-sized samples)
pub fn median<T: AsRef<[f64]>>(data: T) -> Result<f64> {
    quantile(data, 0.5)
}

/// Quantile `q` in [0, 1] with linear interpolation between order statistics
pub fn quantile<T: AsRef<[f64]>>(data: T, q: f64) -> Result<f64> {
    descriptive::quantile_impl(data.as_ref(), q)
}
