//! Strategy-driven assembly of the confound matrix.
//!
//! For every family of the strategy, in order:
//!
//! ```text
//! family ──▶ loader ──▶ Block(columns)    ──▶ kept for assembly
//!                  └──▶ Missing(names)    ──▶ folded into Diagnostics
//!                  └──▶ Err(config/meta)  ──▶ load aborted
//! ```
//!
//! Once all families have been tried the diagnostics gate either reports
//! every missing item in one [`ConfoundError::UnresolvedConfounds`] or the
//! blocks are concatenated, the leading derivative NaNs filled, and the
//! columns optionally demeaned.
use log::{debug, info};
use ndarray::Array2;
use rayon::prelude::*;

use crate::compcor::{find_compcor, ComponentMetadata};
use crate::config::{AromaMode, ConfoundsConfig};
use crate::diagnostics::{Diagnostics, Missing};
use crate::error::{ConfoundError, Result};
use crate::normalize::{demean_columns_inplace, fill_leading_nan_inplace};
use crate::pca::reduce_variance;
use crate::scrub;
use crate::strategy::ConfoundFamily;
use crate::suffix::add_suffix;
use crate::table::{ColumnBlock, ConfoundTable, Resolution};

/// The six rigid-body motion parameters.
pub const MOTION_BASES: [&str; 6] = ["trans_x", "trans_y", "trans_z", "rot_x", "rot_y", "rot_z"];
/// Tissue-average regressors.
pub const WM_CSF_BASES: [&str; 2] = ["csf", "white_matter"];
pub const GLOBAL_BASES: [&str; 1] = ["global_signal"];
/// Scrubbing inputs.
pub const SCRUB_COLUMNS: [&str; 2] = ["framewise_displacement", "std_dvars"];

/// Everything the engine needs about one scan.
#[derive(Debug, Clone)]
pub struct Scan {
    pub table: ConfoundTable,
    /// Parsed sidecar; only CompCor requires it.
    pub metadata: Option<ComponentMetadata>,
}

impl Scan {
    pub fn new(table: ConfoundTable, metadata: Option<ComponentMetadata>) -> Self {
        Self { table, metadata }
    }
}

/// Selected regressors of one scan: `[T, K]` plus `K` labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub confounds: Array2<f64>,
    pub columns: Vec<String>,
}

/// A single item or an ordered list of them.
///
/// [`Confounds::load_any`] answers a single scan with a single result and a
/// list with a list of the same length and order.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

enum FamilyOutput {
    Block(ColumnBlock),
    Missing(Missing),
}

fn from_resolution(family: ConfoundFamily, resolution: Resolution) -> FamilyOutput {
    match resolution {
        Resolution::Found(block) => FamilyOutput::Block(block),
        Resolution::MissingColumns(names) => FamilyOutput::Missing(Missing::params(family, names)),
        Resolution::MissingKeyword(kw) => FamilyOutput::Missing(Missing::keyword(family, kw)),
    }
}

/// Confound engine holding one validated configuration.
#[derive(Debug, Clone)]
pub struct Confounds {
    config: ConfoundsConfig,
}

impl Default for Confounds {
    fn default() -> Self {
        Self::new(ConfoundsConfig::default())
    }
}

impl Confounds {
    pub fn new(config: ConfoundsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfoundsConfig {
        &self.config
    }

    /// Load the confounds of one scan.
    pub fn load(&self, scan: &Scan) -> Result<LoadResult> {
        let n_t = scan.table.n_scans();
        let mut blocks = Vec::with_capacity(self.config.strategy.families().len());
        let mut diagnostics = Diagnostics::default();

        for &family in self.config.strategy.families() {
            match self.load_family(family, scan)? {
                FamilyOutput::Block(block) => {
                    debug!("{family}: {} columns", block.n_columns());
                    blocks.push(block);
                }
                FamilyOutput::Missing(missing) => {
                    debug!("{family}: missing {:?} {:?}", missing.params, missing.keywords);
                    diagnostics = diagnostics.record(missing);
                }
            }
        }
        diagnostics.into_result()?;

        let ColumnBlock { columns, data: mut confounds } = ColumnBlock::hstack(n_t, blocks)?;
        fill_leading_nan_inplace(&mut confounds);
        if self.config.demean {
            demean_columns_inplace(&mut confounds);
        }
        info!("loaded {} confounds over {n_t} volumes", columns.len());
        Ok(LoadResult { confounds, columns })
    }

    /// Load several independent scans in parallel; results keep input order.
    ///
    /// Fails with the error of the first failing scan in input order.
    pub fn load_batch(&self, scans: &[Scan]) -> Result<Vec<LoadResult>> {
        let results: Vec<Result<LoadResult>> = scans.par_iter().map(|s| self.load(s)).collect();
        results.into_iter().collect()
    }

    /// Single scan in, single result out; list in, list out.
    pub fn load_any(&self, input: &OneOrMany<Scan>) -> Result<OneOrMany<LoadResult>> {
        match input {
            OneOrMany::One(scan) => self.load(scan).map(OneOrMany::One),
            OneOrMany::Many(scans) => self.load_batch(scans).map(OneOrMany::Many),
        }
    }

    fn load_family(&self, family: ConfoundFamily, scan: &Scan) -> Result<FamilyOutput> {
        let table = &scan.table;
        match family {
            ConfoundFamily::Motion => self.load_motion(table),
            ConfoundFamily::HighPass => Ok(from_resolution(family, table.find("cosine"))),
            ConfoundFamily::WmCsf => {
                let names = add_suffix(&WM_CSF_BASES, self.config.wm_csf);
                Ok(from_resolution(family, table.resolve(&names)))
            }
            ConfoundFamily::Global => {
                let names = add_suffix(&GLOBAL_BASES, self.config.global_signal);
                Ok(from_resolution(family, table.resolve(&names)))
            }
            ConfoundFamily::CompCor => self.load_compcor(scan),
            ConfoundFamily::IcaAroma => self.load_ica_aroma(table),
            ConfoundFamily::Scrub => Ok(self.load_scrub(table)),
        }
    }

    fn load_motion(&self, table: &ConfoundTable) -> Result<FamilyOutput> {
        let target = self.config.n_motion;
        if !(0.0..=1.0).contains(&target) {
            return Err(ConfoundError::InvalidConfiguration(format!(
                "n_motion must be 0 or a variance fraction in (0, 1], got {target}"
            )));
        }
        let names = add_suffix(&MOTION_BASES, self.config.motion);
        match table.resolve(&names) {
            Resolution::Found(mut block) if target > 0.0 => {
                fill_leading_nan_inplace(&mut block.data);
                Ok(FamilyOutput::Block(reduce_variance(&block, target, "motion_pca")?))
            }
            other => Ok(from_resolution(ConfoundFamily::Motion, other)),
        }
    }

    fn load_compcor(&self, scan: &Scan) -> Result<FamilyOutput> {
        let meta = scan.metadata.as_ref().ok_or_else(|| {
            ConfoundError::MissingMetadata(
                "compcor requires the confounds JSON sidecar, none was provided".into(),
            )
        })?;
        let names = find_compcor(
            meta,
            self.config.compcor,
            self.config.n_compcor,
            self.config.acompcor_combined,
        )?;
        Ok(from_resolution(ConfoundFamily::CompCor, scan.table.resolve(&names)))
    }

    fn load_ica_aroma(&self, table: &ConfoundTable) -> Result<FamilyOutput> {
        match self.config.ica_aroma {
            None => Err(ConfoundError::InvalidConfiguration(
                "Please select an option when using ICA-AROMA strategy".into(),
            )),
            Some(AromaMode::Full) => Ok(FamilyOutput::Block(ColumnBlock::empty(table.n_scans()))),
            Some(AromaMode::Basic) => Ok(from_resolution(ConfoundFamily::IcaAroma, table.find("aroma"))),
        }
    }

    fn load_scrub(&self, table: &ConfoundTable) -> FamilyOutput {
        let stats = match table.resolve(&SCRUB_COLUMNS) {
            Resolution::Found(block) => block,
            other => return from_resolution(ConfoundFamily::Scrub, other),
        };
        let flagged = scrub::plan(
            stats.data.column(0),
            stats.data.column(1),
            &self.config.scrub_params(),
        );
        debug!("scrub: {} of {} volumes flagged", flagged.len(), table.n_scans());
        FamilyOutput::Block(scrub::outlier_regressors(&flagged, table.n_scans()))
    }
}
