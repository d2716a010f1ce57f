//! Z-score outlier detection

use log::debug;

use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::stats;

/// Threshold used when the caller has no preference
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Z-score of every cell of `column`
///
/// Uses the mean and sample standard deviation (ddof = 1) of the present
/// cells. Missing cells yield `None`, and so does every cell when the column
/// has fewer than two values or no spread.
pub fn z_scores(frame: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let cells = frame.numeric_values(column)?;
    let present: Vec<f64> = cells.iter().filter_map(|c| c.get()).collect();

    if present.len() < 2 {
        return Ok(vec![None; cells.len()]);
    }
    let mean = stats::mean(&present)?;
    let std = stats::std_dev(&present, 1)?;
    if !std.is_finite() || std == 0.0 {
        return Ok(vec![None; cells.len()]);
    }

    Ok(cells
        .iter()
        .map(|c| c.get().map(|v| (v - mean).abs() / std))
        .collect())
}

/// Rows of `frame` whose value in `column` lies more than `threshold`
/// standard deviations from the column mean
///
/// A degenerate column (constant, or fewer than two values) has no outliers;
/// the result is then an empty frame with the same columns.
pub fn detect_outliers(frame: &DataFrame, column: &str, threshold: f64) -> Result<DataFrame> {
    let mask: Vec<bool> = z_scores(frame, column)?
        .into_iter()
        .map(|z| z.map_or(false, |z| z > threshold))
        .collect();

    let outliers = frame.filter(&mask)?;
    debug!(
        "{} of {} rows in '{}' exceed z = {}",
        outliers.row_count(),
        frame.row_count(),
        column,
        threshold
    );
    Ok(outliers)
}
