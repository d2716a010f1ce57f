//! Rolling window aggregates over an ordered series

use std::fmt;

use crate::error::{Error, Result};
use crate::na::NA;

/// Kind of window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    /// Trailing window of a fixed number of points
    Fixed,
    /// Every point from the start up to the current one
    Expanding,
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WindowType::Fixed => write!(f, "Fixed"),
            WindowType::Expanding => write!(f, "Expanding"),
        }
    }
}

/// Window operations over a borrowed series
///
/// A fixed window of size `W` yields NA for the first `W - 1` points, and the
/// aggregate of the current and `W - 1` preceding points afterwards. A series
/// shorter than the window is allowed and yields only NA. An expanding window
/// also waits for `W` points, then aggregates everything seen so far.
#[derive(Debug)]
pub struct Window<'a> {
    values: &'a [f64],
    window_type: WindowType,
    window_size: usize,
}

impl<'a> Window<'a> {
    pub fn new(values: &'a [f64], window_type: WindowType, window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::InvalidInput(
                "window size must be at least 1".to_string(),
            ));
        }
        Ok(Window {
            values,
            window_type,
            window_size,
        })
    }

    /// Trailing fixed window of `window_size` points
    pub fn fixed(values: &'a [f64], window_size: usize) -> Result<Self> {
        Self::new(values, WindowType::Fixed, window_size)
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Rolling sum
    pub fn sum(&self) -> Vec<NA<f64>> {
        self.aggregate(|w| w.iter().sum())
    }

    /// Rolling mean
    pub fn mean(&self) -> Vec<NA<f64>> {
        self.aggregate(|w| w.iter().sum::<f64>() / w.len() as f64)
    }

    /// Rolling maximum
    pub fn max(&self) -> Vec<NA<f64>> {
        self.aggregate(|w| w.iter().cloned().fold(f64::NEG_INFINITY, f64::max))
    }

    fn aggregate<F>(&self, f: F) -> Vec<NA<f64>>
    where
        F: Fn(&[f64]) -> f64,
    {
        (0..self.values.len())
            .map(|i| {
                if i + 1 < self.window_size {
                    return NA::NA;
                }
                let start = match self.window_type {
                    WindowType::Fixed => i + 1 - self.window_size,
                    WindowType::Expanding => 0,
                };
                NA::Value(f(&self.values[start..=i]))
            })
            .collect()
    }
}
