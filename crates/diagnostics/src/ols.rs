//! Ordinary least squares on a dense design matrix.

use crate::error::DiagnosticsError;
use nalgebra::{DMatrix, DVector};

/// Result of regressing `y` on the columns of `X`.
#[derive(Debug, Clone)]
pub(crate) struct OlsFit {
    pub params: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub residuals: Vec<f64>,
    pub ssr: f64,
    pub nobs: usize,
}

impl OlsFit {
    pub fn t_stat(&self, column: usize) -> f64 {
        self.params[column] / self.std_errors[column]
    }

    /// Akaike information criterion up to an additive constant shared by
    /// every fit on the same sample.
    pub fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        n * (self.ssr / n).ln() + 2.0 * self.params.len() as f64
    }
}

/// Fits `y = X b + e`. `rows` holds the regressors of one observation each.
pub(crate) fn fit(
    y: &[f64],
    rows: &[Vec<f64>],
    context: &'static str,
) -> Result<OlsFit, DiagnosticsError> {
    let nobs = y.len();
    let k = rows.first().map_or(0, Vec::len);
    if nobs != rows.len() || k == 0 || nobs <= k {
        return Err(DiagnosticsError::InsufficientData {
            test: context,
            required: k + 1,
            available: nobs,
        });
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    let x = DMatrix::from_row_slice(nobs, k, &flat);
    let y_vec = DVector::from_column_slice(y);

    let xtx_inv = (x.transpose() * &x)
        .try_inverse()
        .ok_or(DiagnosticsError::SingularMatrix(context))?;
    let beta = &xtx_inv * (x.transpose() * &y_vec);

    let residuals = &y_vec - &x * &beta;
    let ssr = residuals.dot(&residuals);
    let sigma2 = ssr / (nobs - k) as f64;

    let std_errors = (0..k)
        .map(|i| (sigma2 * xtx_inv[(i, i)]).sqrt())
        .collect();

    Ok(OlsFit {
        params: beta.iter().copied().collect(),
        std_errors,
        residuals: residuals.iter().copied().collect(),
        ssr,
        nobs,
    })
}
