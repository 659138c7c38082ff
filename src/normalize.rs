//! Column-wise centring and scaling of regressor blocks.
//!
//! `demean_columns_inplace`  — matches `sklearn.preprocessing.scale(x, with_std=False)`:
//!   x[:, j] -= mean(x[:, j])
//!
//! `standardize_columns_inplace` — matches `sklearn.preprocessing.scale(x)`:
//!   x[:, j] = (x[:, j] - μ_j) / σ_j   (σ ddof = 0; σ = 0 leaves the column centred)
//!
//! `fill_leading_nan_inplace` — derivative regressors are undefined at the first
//!   volume; x[0, j] = x[1, j] wherever x[0, j] is NaN.
use ndarray::{Array2, Axis};

/// Subtract each column's mean. Returns the means that were removed.
pub fn demean_columns_inplace(data: &mut Array2<f64>) -> Vec<f64> {
    let Some(means) = data.mean_axis(Axis(0)) else {
        return vec![0.0; data.ncols()];
    };
    for mut row in data.rows_mut() {
        row -= &means;
    }
    means.to_vec()
}

/// Z-score every column (population std).
pub fn standardize_columns_inplace(data: &mut Array2<f64>) {
    let n = data.nrows() as f64;
    if n == 0.0 {
        return;
    }
    for mut col in data.columns_mut() {
        let mean = col.sum() / n;
        let var = col.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let std = var.sqrt();
        if std > 0.0 {
            col.mapv_inplace(|v| (v - mean) / std);
        } else {
            col.mapv_inplace(|v| v - mean);
        }
    }
}

/// Replace NaN in the first row by the second row's value.
pub fn fill_leading_nan_inplace(data: &mut Array2<f64>) {
    if data.nrows() < 2 {
        return;
    }
    for mut col in data.columns_mut() {
        if col[0].is_nan() {
            col[0] = col[1];
        }
    }
}
