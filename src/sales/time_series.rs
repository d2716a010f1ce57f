//! Daily aggregation of order lines

use log::debug;

use crate::column::Column;
use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::groupby::GroupByExt;
use crate::sales::{DAILY_SALES, DATE, MA_30, MA_7};
use crate::temporal::{self, Window};

/// One row per date present in `frame`, holding the sum of `value_col`
///
/// Output columns: `date`, `sales`, the calendar features (without the
/// weekend flag), then `7_day_MA` and `30_day_MA`, ascending by date. Days
/// without orders are absent, so the moving averages run over days with data.
/// Rows with a missing date are ignored and missing values add nothing.
pub fn create_time_series(frame: &DataFrame, date_col: &str, value_col: &str) -> Result<DataFrame> {
    frame.require_columns(&[date_col, value_col])?;

    let daily = frame.groupby_date(date_col)?.sum(value_col)?;
    let (dates, totals): (Vec<_>, Vec<f64>) = daily.into_iter().unzip();
    debug!("aggregated {} rows into {} days", frame.row_count(), dates.len());

    let mut ts = DataFrame::new();
    ts.add_column(DATE, Column::from_dates(dates))?;
    ts.add_column(DAILY_SALES, Column::from_f64(totals.clone()))?;
    let mut ts = temporal::with_calendar_features(&ts, DATE, false)?;

    ts.add_column(MA_7, Column::Float64(Window::fixed(&totals, 7)?.mean()))?;
    ts.add_column(MA_30, Column::Float64(Window::fixed(&totals, 30)?.mean()))?;
    Ok(ts)
}
