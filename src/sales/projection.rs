//! Forward projections of a daily series
//!
//! Both projections work from the recent level of the series alone and are
//! independent of the regression forecaster.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::column::Column;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::sales::DATE;
use crate::temporal;

/// Name of the projected value column in [`forecast_frame`]
pub const FORECAST: &str = "forecast";

/// One projected day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub forecast: f64,
}

/// Trailing mean compounded at a fixed daily growth rate
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthProjection {
    /// Trailing points averaged as the base level
    pub window: usize,
    /// Days projected
    pub horizon: usize,
    /// Growth per day
    pub growth_rate: f64,
}

impl Default for GrowthProjection {
    fn default() -> Self {
        GrowthProjection {
            window: 30,
            horizon: 30,
            growth_rate: 0.02,
        }
    }
}

impl GrowthProjection {
    pub fn new(window: usize, horizon: usize, growth_rate: f64) -> Self {
        GrowthProjection {
            window,
            horizon,
            growth_rate,
        }
    }

    /// Project `horizon` days after the last date of `series`
    ///
    /// Point `i` (0-based) is `avg * (1 + growth_rate)^i`, where `avg` is the
    /// mean of the last `min(window, n)` present values.
    pub fn project(&self, series: &DataFrame, date_col: &str, value_col: &str) -> Result<Vec<ForecastPoint>> {
        if self.window == 0 {
            return Err(Error::InvalidInput("projection window must be positive".into()));
        }
        let (last_date, values) = history(series, date_col, value_col)?;

        let recent = &values[values.len().saturating_sub(self.window)..];
        let level = recent.iter().sum::<f64>() / recent.len() as f64;
        debug!(
            "projecting {} days from level {:.2} over {} points",
            self.horizon,
            level,
            recent.len()
        );

        Ok(temporal::days_after(last_date, self.horizon)
            .into_iter()
            .enumerate()
            .map(|(i, date)| ForecastPoint {
                date,
                forecast: level * (1.0 + self.growth_rate).powi(i as i32),
            })
            .collect())
    }
}

/// Flat forecast at the mean of the last `window` observations
#[derive(Debug, Clone)]
pub struct MovingAverageForecaster {
    window: usize,
    /// Last observed date and the present values, once fitted
    history: Option<(NaiveDate, Vec<f64>)>,
}

impl Default for MovingAverageForecaster {
    fn default() -> Self {
        Self::new(7)
    }
}

impl MovingAverageForecaster {
    pub fn new(window: usize) -> Self {
        MovingAverageForecaster {
            window,
            history: None,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn is_fitted(&self) -> bool {
        self.history.is_some()
    }

    /// Store the history of `target`, dated by the `date` column
    pub fn fit(&mut self, series: &DataFrame, target: &str) -> Result<&mut Self> {
        if self.window == 0 {
            return Err(Error::InvalidInput("moving average window must be positive".into()));
        }
        self.history = Some(history(series, DATE, target)?);
        Ok(self)
    }

    /// `steps` days after the last fitted date, all at the trailing mean
    pub fn predict(&self, steps: usize) -> Result<Vec<ForecastPoint>> {
        let (last_date, values) = self
            .history
            .as_ref()
            .ok_or_else(|| Error::NotTrained("call fit before predict".into()))?;

        let recent = &values[values.len().saturating_sub(self.window)..];
        let level = recent.iter().sum::<f64>() / recent.len() as f64;
        Ok(temporal::days_after(*last_date, steps)
            .into_iter()
            .map(|date| ForecastPoint {
                date,
                forecast: level,
            })
            .collect())
    }
}

/// Last present date and the present values of `value_col`
fn history(series: &DataFrame, date_col: &str, value_col: &str) -> Result<(NaiveDate, Vec<f64>)> {
    series.require_columns(&[date_col, value_col])?;
    let last_date = series
        .date_values(date_col)?
        .iter()
        .filter_map(|d| d.get())
        .max()
        .ok_or_else(|| Error::EmptyData("series has no dates to project from".into()))?;
    let values: Vec<f64> = series
        .numeric_values(value_col)?
        .iter()
        .filter_map(|v| v.get())
        .collect();
    if values.is_empty() {
        return Err(Error::EmptyData(format!("'{}' has no values", value_col)));
    }
    Ok((last_date, values))
}

/// Projection as a two-column table: `date`, `forecast`
pub fn forecast_frame(points: &[ForecastPoint]) -> Result<DataFrame> {
    let mut df = DataFrame::new();
    df.add_column(DATE, Column::from_dates(points.iter().map(|p| p.date).collect()))?;
    df.add_column(FORECAST, Column::from_f64(points.iter().map(|p| p.forecast).collect()))?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn series(values: Vec<f64>) -> DataFrame {
        let mut df = DataFrame::new();
        df.add_column(
            "date",
            Column::from_dates(temporal::days_after(
                NaiveDate::from_ymd_opt(2019, 12, 31).unwrap(),
                values.len(),
            )),
        )
        .unwrap();
        df.add_column("sales", Column::from_f64(values)).unwrap();
        df
    }

    #[test]
    fn test_growth_projection() {
        let ts = series(vec![100.0; 40]);
        let points = GrowthProjection::default().project(&ts, "date", "sales").unwrap();
        assert_eq!(points.len(), 30);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2020, 2, 10).unwrap());
        assert!((points[0].forecast - 100.0).abs() < 1e-9);
        assert!((points[1].forecast - 102.0).abs() < 1e-9);
        assert!((points[29].forecast - 100.0 * 1.02f64.powi(29)).abs() < 1e-6);
    }

    #[test]
    fn test_short_series_uses_all_points() {
        let ts = series(vec![10.0, 20.0, 30.0]);
        let points = GrowthProjection::new(30, 2, 0.0).project(&ts, "date", "sales").unwrap();
        assert_eq!(points, vec![
            ForecastPoint { date: jan(4), forecast: 20.0 },
            ForecastPoint { date: jan(5), forecast: 20.0 },
        ]);
    }

    #[test]
    fn test_empty_series() {
        let ts = series(vec![]);
        assert!(matches!(
            GrowthProjection::default().project(&ts, "date", "sales"),
            Err(Error::EmptyData(_))
        ));
    }

    #[test]
    fn test_moving_average_forecaster() {
        let mut model = MovingAverageForecaster::default();
        assert!(matches!(model.predict(3), Err(Error::NotTrained(_))));

        let ts = series((1..=10).map(|v| v as f64).collect());
        model.fit(&ts, "sales").unwrap();
        let points = model.predict(3).unwrap();
        // mean of 4..=10
        assert_eq!(points.iter().map(|p| p.forecast).collect::<Vec<_>>(), vec![7.0; 3]);
        assert_eq!(points[2].date, jan(13));
    }

    #[test]
    fn test_forecast_frame() {
        let points = GrowthProjection::new(3, 5, 0.1).project(&series(vec![1.0, 2.0, 3.0]), "date", "sales").unwrap();
        let df = forecast_frame(&points).unwrap();
        assert_eq!(df.column_names(), &["date", "forecast"]);
        assert_eq!(df.row_count(), 5);
    }
}
