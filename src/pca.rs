//! Variance-targeted PCA reduction of a regressor block.
//!
//! Matches `sklearn.decomposition.PCA(n_components=target).fit_transform(scale(x))`
//! for a fractional target:
//!   1. standardise every column (ddof = 0)
//!   2. thin SVD  X = U Σ Vᵀ
//!   3. ratio_i = σ_i² / Σ σ²,  k = min { k : Σ_{i<k} ratio_i ≥ target }
//!   4. scores = X V[:, :k]
//!
//! Each loading vector is sign-normalised so that its largest-magnitude entry
//! is positive, which makes the output reproducible across SVD backends.
use nalgebra::{DMatrix, SVD};
use ndarray::Array2;

use crate::error::{ConfoundError, Result};
use crate::normalize::standardize_columns_inplace;
use crate::table::ColumnBlock;

const RATIO_TOL: f64 = 1e-12;

/// Reduce `block` to the leading components explaining at least `target` of
/// its variance, named `{prefix}_1 … {prefix}_k`.
///
/// `target == 0` returns the block unchanged.
pub fn reduce_variance(block: &ColumnBlock, target: f64, prefix: &str) -> Result<ColumnBlock> {
    if !(0.0..=1.0).contains(&target) {
        return Err(ConfoundError::InvalidConfiguration(format!(
            "variance target must lie in [0, 1], got {target}"
        )));
    }
    if target == 0.0 {
        return Ok(block.clone());
    }

    let (n_t, n_p) = block.data.dim();
    if n_t < 2 || n_p == 0 {
        return Err(ConfoundError::InvalidConfiguration(format!(
            "cannot reduce a {n_t}x{n_p} block to {target} of its variance"
        )));
    }

    let mut x = block.data.clone();
    standardize_columns_inplace(&mut x);
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ConfoundError::InvalidConfiguration(
            "regressor block contains non-finite values".into(),
        ));
    }

    let mat = DMatrix::from_fn(n_t, n_p, |i, j| x[[i, j]]);
    let svd = SVD::new(mat.clone(), false, true);
    let v_t = svd.v_t.ok_or_else(|| {
        ConfoundError::InvalidConfiguration("SVD did not produce right singular vectors".into())
    })?;

    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&a, &b| svd.singular_values[b].total_cmp(&svd.singular_values[a]));

    let power: Vec<f64> = order.iter().map(|&i| svd.singular_values[i].powi(2)).collect();
    let total: f64 = power.iter().sum();
    if total <= 0.0 {
        return Err(ConfoundError::InvalidConfiguration(
            "regressor block has no variance to reduce".into(),
        ));
    }

    let k = n_components_for(&power, total, target);

    let mut data = Array2::<f64>::zeros((n_t, k));
    for (c, &i) in order.iter().take(k).enumerate() {
        let mut v = v_t.row(i).transpose();
        let pivot = v.iter().copied().fold(0.0_f64, |m, x| if x.abs() > m.abs() { x } else { m });
        if pivot < 0.0 {
            v = -v;
        }
        let scores = &mat * &v;
        for t in 0..n_t {
            data[[t, c]] = scores[t];
        }
    }

    Ok(ColumnBlock {
        columns: (1..=k).map(|c| format!("{prefix}_{c}")).collect(),
        data,
    })
}

/// Smallest k whose cumulative explained-variance ratio reaches `target`.
fn n_components_for(power: &[f64], total: f64, target: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, p) in power.iter().enumerate() {
        cumulative += p / total;
        if cumulative + RATIO_TOL >= target {
            return i + 1;
        }
    }
    power.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(n_t: usize, n_p: usize) -> ColumnBlock {
        // Two strong latent signals plus small per-column wiggle.
        let data = Array2::from_shape_fn((n_t, n_p), |(t, j)| {
            let s1 = (t as f64 * 0.11).sin();
            let s2 = (t as f64 * 0.37).cos();
            let w = ((t * 31 + j * 17) % 13) as f64 / 130.0;
            if j % 2 == 0 { s1 * (j + 1) as f64 + w } else { s2 - 0.5 * s1 + w }
        });
        ColumnBlock { columns: (0..n_p).map(|j| format!("c{j}")).collect(), data }
    }

    #[test]
    fn zero_target_is_identity() {
        let b = block(50, 6);
        assert_eq!(reduce_variance(&b, 0.0, "motion_pca").unwrap(), b);
    }

    #[test]
    fn out_of_range_target_rejected() {
        let b = block(50, 6);
        for t in [-0.1, 1.5, 50.0, f64::NAN] {
            assert!(matches!(
                reduce_variance(&b, t, "motion_pca"),
                Err(ConfoundError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn component_count_monotonic_in_target() {
        let b = block(80, 6);
        let lo = reduce_variance(&b, 0.2, "motion_pca").unwrap();
        let hi = reduce_variance(&b, 0.95, "motion_pca").unwrap();
        assert_eq!(lo.n_columns(), 1);
        assert!(lo.n_columns() <= hi.n_columns());
        assert_eq!(lo.columns[0], "motion_pca_1");
    }

    #[test]
    fn scores_are_uncorrelated() {
        let b = block(120, 6);
        let r = reduce_variance(&b, 1.0, "pc").unwrap();
        assert!(r.n_columns() >= 2);
        let c0 = r.data.column(0);
        let c1 = r.data.column(1);
        let dot: f64 = c0.iter().zip(c1.iter()).map(|(a, b)| a * b).sum();
        approx::assert_abs_diff_eq!(dot, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn reduction_is_deterministic() {
        let b = block(64, 6);
        let a = reduce_variance(&b, 0.9, "pc").unwrap();
        let c = reduce_variance(&b, 0.9, "pc").unwrap();
        assert_eq!(a, c);
    }
}
