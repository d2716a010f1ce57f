//! Ordinary least squares regression

use crate::error::{Error, Result};
use crate::ml::dataset::FeatureMatrix;
use crate::ml::models::SupervisedModel;

/// Pivots smaller than this fraction of the largest diagonal entry are treated as zero
const RANK_TOLERANCE: f64 = 1e-10;

/// Linear regression fitted by least squares
///
/// The normal equations are solved on centered data, so the intercept is
/// `mean(y) - sum(coef * mean(x))`. Features that are linearly dependent on
/// earlier ones (including constant features) get a zero coefficient instead
/// of failing the fit.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    coefficients: Vec<f64>,
    intercept: f64,
    feature_names: Vec<String>,
    fitted: bool,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coefficient per feature, in feature order
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }
}

impl SupervisedModel for LinearRegression {
    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()> {
        if x.n_samples() != y.len() {
            return Err(Error::DimensionMismatch(format!(
                "{} feature rows but {} targets",
                x.n_samples(),
                y.len()
            )));
        }
        if x.n_samples() == 0 {
            return Err(Error::EmptyData(
                "cannot fit a linear model on zero samples".to_string(),
            ));
        }

        let n = x.n_samples() as f64;
        let p = x.n_features();
        let x_means: Vec<f64> = (0..p).map(|j| x.column(j).iter().sum::<f64>() / n).collect();
        let y_mean = y.iter().sum::<f64>() / n;

        // X'X and X'y on centered data
        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];
        for (row, &target) in x.rows().iter().zip(y) {
            let centered: Vec<f64> = row.iter().zip(&x_means).map(|(v, m)| v - m).collect();
            let yc = target - y_mean;
            for i in 0..p {
                xty[i] += centered[i] * yc;
                for j in i..p {
                    xtx[i][j] += centered[i] * centered[j];
                }
            }
        }
        for i in 0..p {
            for j in 0..i {
                xtx[i][j] = xtx[j][i];
            }
        }

        let coefficients = solve_least_squares(xtx, xty);
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(Error::Computation(
                "least squares produced non-finite coefficients".to_string(),
            ));
        }

        self.intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_means)
                .map(|(c, m)| c * m)
                .sum::<f64>();
        self.coefficients = coefficients;
        self.feature_names = x.feature_names().to_vec();
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(Error::NotTrained("linear model has not been fitted".to_string()));
        }
        if x.n_features() != self.coefficients.len() {
            return Err(Error::DimensionMismatch(format!(
                "model was fitted on {} features, got {}",
                self.coefficients.len(),
                x.n_features()
            )));
        }
        Ok(x.rows()
            .iter()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(v, c)| v * c)
                        .sum::<f64>()
            })
            .collect())
    }
}

/// Solve the symmetric system `a * beta = b` by Gauss-Jordan elimination
///
/// Columns without a usable pivot are free and get a zero coefficient.
fn solve_least_squares(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let n = b.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0, f64::max);
    let tolerance = RANK_TOLERANCE * scale.max(f64::MIN_POSITIVE);

    let mut pivots: Vec<usize> = Vec::with_capacity(n);
    let mut row = 0;
    for col in 0..n {
        if row == n {
            break;
        }

        // Pivot selection
        let (max_row, max_val) = (row..n)
            .map(|r| (r, a[r][col].abs()))
            .fold((row, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if max_val <= tolerance {
            continue;
        }
        a.swap(row, max_row);
        b.swap(row, max_row);

        let pivot = a[row][col];
        for value in a[row].iter_mut() {
            *value /= pivot;
        }
        b[row] /= pivot;

        for r in 0..n {
            if r == row {
                continue;
            }
            let factor = a[r][col];
            if factor == 0.0 {
                continue;
            }
            for c in 0..n {
                a[r][c] -= factor * a[row][c];
            }
            b[r] -= factor * b[row];
        }

        pivots.push(col);
        row += 1;
    }

    let mut beta = vec![0.0; n];
    for (i, &col) in pivots.iter().enumerate() {
        beta[col] = b[i];
    }
    beta
}
