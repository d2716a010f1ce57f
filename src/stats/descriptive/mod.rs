use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::stats::DescriptiveStats;

pub(crate) fn describe_impl(data: &[f64]) -> Result<DescriptiveStats> {
    if data.is_empty() {
        return Err(Error::EmptyData(
            "describe needs at least one observation".into(),
        ));
    }

    let sorted = sorted_copy(data);
    let count = data.len();
    let std = if count > 1 {
        variance_impl(data, 1)?.sqrt()
    } else {
        0.0
    };

    Ok(DescriptiveStats {
        count,
        mean: mean_impl(data)?,
        std,
        min: sorted[0],
        q1: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.5),
        q3: percentile(&sorted, 0.75),
        max: sorted[count - 1],
    })
}

pub(crate) fn mean_impl(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(Error::EmptyData("mean of an empty sample".into()));
    }
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

pub(crate) fn variance_impl(data: &[f64], ddof: usize) -> Result<f64> {
    if data.len() <= ddof {
        return Err(Error::InsufficientData(format!(
            "variance with ddof={} needs more than {} observations, got {}",
            ddof,
            ddof,
            data.len()
        )));
    }
    let mean = mean_impl(data)?;
    let sum_sq: f64 = data.iter().map(|&x| (x - mean).powi(2)).sum();
    Ok(sum_sq / (data.len() - ddof) as f64)
}

pub(crate) fn quantile_impl(data: &[f64], q: f64) -> Result<f64> {
    if data.is_empty() {
        return Err(Error::EmptyData("quantile of an empty sample".into()));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(Error::InvalidInput(format!(
            "quantile must be within [0, 1], got {}",
            q
        )));
    }
    Ok(percentile(&sorted_copy(data), q))
}

fn sorted_copy(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Linear interpolation between the order statistics around `p * (n - 1)`
fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    let idx = p * (n - 1) as f64;
    let idx_floor = idx.floor() as usize;
    let idx_ceil = idx.ceil() as usize;

    if idx_floor == idx_ceil {
        return sorted_data[idx_floor];
    }

    let weight_ceil = idx - idx_floor as f64;
    sorted_data[idx_floor] * (1.0 - weight_ceil) + sorted_data[idx_ceil] * weight_ceil
}
