//! Motion-outlier ("scrubbing") regressors, after Power et al. (2014).
//!
//! 1. Flag volumes with framewise displacement above `fd_thresh` or
//!    standardised DVARS above `std_dvars_thresh`.
//! 2. `full` mode only: absorb every run of unflagged volumes shorter than
//!    `min_segment` into the flagged set, including the runs before the first
//!    and after the last flagged volume. Repeated until nothing changes.
//! 3. One one-hot column per flagged volume, `motion_outlier_<k>` with `k` the
//!    position in the sorted flagged set.
//!
//! NaN statistics (fMRIPrep leaves the first FD / DVARS value empty) never
//! flag a volume.
use std::str::FromStr;

use ndarray::{Array2, ArrayView1};
use serde::Deserialize;

use crate::error::{ConfoundError, Result};
use crate::table::ColumnBlock;

/// Scrubbing flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrubMode {
    /// Flag threshold exceedances only.
    Basic,
    /// Also flag short unflagged segments.
    Full,
}

impl FromStr for ScrubMode {
    type Err = ConfoundError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(ScrubMode::Basic),
            "full" => Ok(ScrubMode::Full),
            other => Err(ConfoundError::InvalidOption { option: "scrub", value: other.into() }),
        }
    }
}

/// Thresholds and mode for one scrub pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubParams {
    pub mode: ScrubMode,
    pub fd_thresh: f64,
    pub std_dvars_thresh: f64,
    pub min_segment: usize,
}

/// Sorted, deduplicated indices where either statistic exceeds its threshold.
pub fn threshold_outliers(
    fd: ArrayView1<'_, f64>,
    std_dvars: ArrayView1<'_, f64>,
    fd_thresh: f64,
    std_dvars_thresh: f64,
) -> Vec<usize> {
    fd.iter()
        .zip(std_dvars.iter())
        .enumerate()
        .filter(|(_, (&f, &d))| f > fd_thresh || d > std_dvars_thresh)
        .map(|(t, _)| t)
        .collect()
}

/// Extend `outliers` so that no unflagged run is shorter than `min_segment`.
///
/// Indices at or beyond `n_scans` are ignored. If no index is left, the
/// result is empty.
pub fn optimize_scrub(outliers: &[usize], n_scans: usize, min_segment: usize) -> Vec<usize> {
    let mut flagged = vec![false; n_scans];
    let mut any = false;
    for &t in outliers.iter().filter(|&&t| t < n_scans) {
        flagged[t] = true;
        any = true;
    }
    if !any {
        return Vec::new();
    }

    loop {
        let mut changed = false;
        let mut t = 0;
        while t < n_scans {
            if flagged[t] {
                t += 1;
                continue;
            }
            let start = t;
            while t < n_scans && !flagged[t] {
                t += 1;
            }
            if t - start < min_segment {
                flagged[start..t].fill(true);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    flagged
        .iter()
        .enumerate()
        .filter_map(|(t, &f)| f.then_some(t))
        .collect()
}

/// Flagged volume indices for the given statistics.
pub fn plan(
    fd: ArrayView1<'_, f64>,
    std_dvars: ArrayView1<'_, f64>,
    params: &ScrubParams,
) -> Vec<usize> {
    let outliers = threshold_outliers(fd, std_dvars, params.fd_thresh, params.std_dvars_thresh);
    match params.mode {
        ScrubMode::Full if !outliers.is_empty() => {
            optimize_scrub(&outliers, fd.len(), params.min_segment)
        }
        _ => outliers,
    }
}

/// One-hot regressors, one column per flagged volume.
pub fn outlier_regressors(flagged: &[usize], n_scans: usize) -> ColumnBlock {
    let mut data = Array2::<f64>::zeros((n_scans, flagged.len()));
    for (k, &t) in flagged.iter().enumerate() {
        data[[t, k]] = 1.0;
    }
    ColumnBlock {
        columns: (0..flagged.len()).map(|k| format!("motion_outlier_{k}")).collect(),
        data,
    }
}
