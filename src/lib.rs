//! # confounds — strategy-driven fMRIPrep confound selection in pure Rust
//!
//! `confounds` turns the wide regressor table written by fMRIPrep
//! (`*_desc-confounds_timeseries.tsv` + JSON sidecar) into a compact nuisance
//! matrix for regression-based denoising. The selection rules follow
//! [`load_confounds`](https://github.com/SIMEXP/load_confounds) and the
//! strategies benchmarked by Ciric et al. (2017).
//!
//! ## Pipeline overview
//!
//! ```text
//! confounds.tsv (+ sidecar.json)
//!   │
//!   ├─ strategy       validated family list, output block order
//!   ├─ motion         6 params × model suffixes, optional PCA (n_motion)
//!   ├─ high_pass      all `cosine*` columns
//!   ├─ wm_csf         csf, white_matter × model suffixes
//!   ├─ global         global_signal × model suffixes
//!   ├─ compcor        sidecar-ranked a/tCompCor columns (count or 50 % variance)
//!   ├─ ica_aroma      `aroma*` noise ICs (basic) or nothing (full)
//!   ├─ scrub          FD / std-DVARS outliers + short-segment absorption → one-hot
//!   ├─ gate           every missing column of every family in one error
//!   └─ assemble       hstack → fill row-0 NaN → demean
//!        │
//!        └─→ LoadResult { confounds: [T, K] f64, columns: Vec<String> }
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use confounds::{Confounds, ConfoundsConfig, Strategy};
//! use confounds::io::read_scan;
//! use std::path::Path;
//!
//! let scan = read_scan(
//!     Path::new("sub-01_task-rest_desc-confounds_timeseries.tsv"),
//!     Some(Path::new("sub-01_task-rest_desc-confounds_timeseries.json")),
//! ).unwrap();
//!
//! let cfg = ConfoundsConfig {
//!     strategy: Strategy::parse(&["motion", "high_pass", "compcor", "scrub"]).unwrap(),
//!     ..ConfoundsConfig::default()
//! };
//! let out = Confounds::new(cfg).load(&scan).unwrap();
//! println!("{} regressors × {} volumes", out.columns.len(), out.confounds.nrows());
//! ```
//!
//! ## Running individual steps
//!
//! ```
//! use confounds::suffix::{add_suffix, Model};
//! use confounds::scrub::{optimize_scrub, outlier_regressors};
//!
//! let cols = add_suffix(&["trans_x"], Model::Derivatives);
//! assert_eq!(cols, ["trans_x", "trans_x_derivative1"]);
//!
//! let flagged = optimize_scrub(&[3, 10], 20, 5);
//! let block = outlier_regressors(&flagged, 20);
//! assert_eq!(block.columns.len(), flagged.len());
//! ```

pub mod compcor;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod io;
pub mod loader;
pub mod normalize;
pub mod pca;
pub mod scrub;
pub mod strategy;
pub mod suffix;
pub mod table;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config
pub use config::{AromaMode, ConfoundsConfig};

// engine
pub use loader::{Confounds, LoadResult, OneOrMany, Scan};

// errors and diagnostics
pub use diagnostics::{Diagnostics, Missing};
pub use error::{ConfoundError, Result};

// building blocks
pub use compcor::{
    find_compcor, CompCorCount, CompCorMode, ComponentInfo, ComponentMetadata, MaskKind,
};
pub use pca::reduce_variance;
pub use scrub::{optimize_scrub, outlier_regressors, ScrubMode, ScrubParams};
pub use strategy::{ConfoundFamily, Strategy, SUPPORTED_FAMILIES};
pub use suffix::{add_suffix, Model};
pub use table::{ColumnBlock, ConfoundTable, Resolution};
