//! Loader configuration.
//!
//! [`ConfoundsConfig`] holds every tunable parameter of the confound engine.
//! All fields have defaults matching the `load_confounds` conventions for
//! fMRIPrep output.

use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

use crate::compcor::{CompCorCount, CompCorMode};
use crate::error::{ConfoundError, Result};
use crate::scrub::{ScrubMode, ScrubParams};
use crate::strategy::Strategy;
use crate::suffix::Model;

/// ICA-AROMA flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AromaMode {
    /// Aggressive: regress the noise ICs (`aroma_motion_*` columns).
    Basic,
    /// Non-aggressive: the denoised image is used, no regressors are added.
    Full,
}

impl FromStr for AromaMode {
    type Err = ConfoundError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(AromaMode::Basic),
            "full" => Ok(AromaMode::Full),
            other => Err(ConfoundError::InvalidOption { option: "ica_aroma", value: other.into() }),
        }
    }
}

/// Configuration for confound selection.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use confounds::{ConfoundsConfig, Strategy, Model};
///
/// let cfg = ConfoundsConfig {
///     strategy: Strategy::parse(&["motion", "scrub"]).unwrap(),
///     motion:   Model::Basic,
///     ..ConfoundsConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfoundsConfig {
    /// Families to load, in output order.
    ///
    /// Default: `[motion, high_pass, wm_csf]`.
    pub strategy: Strategy,

    /// Expansion of the six rigid-body parameters.
    ///
    /// Default: [`Model::Full`] (24 regressors).
    pub motion: Model,

    /// Variance fraction kept by PCA on the motion block.
    ///
    /// `0` disables the reduction; values in `(0, 1]` keep the fewest
    /// components reaching that fraction. Anything else fails at load time.
    ///
    /// Default: `0.0`.
    pub n_motion: f64,

    /// Scrubbing flavour.
    ///
    /// Default: [`ScrubMode::Full`].
    pub scrub: ScrubMode,

    /// Shortest run of unflagged volumes kept by full scrubbing.
    ///
    /// Default: `5` volumes (Power et al. 2014).
    pub scrub_min_segment: usize,

    /// Framewise displacement threshold in mm.
    ///
    /// Default: `0.2`.
    pub fd_thresh: f64,

    /// Standardised DVARS threshold.
    ///
    /// Default: `3.0`.
    pub std_dvars_thresh: f64,

    /// Expansion of the white-matter and CSF averages.
    ///
    /// Default: [`Model::Basic`].
    pub wm_csf: Model,

    /// Expansion of the global signal.
    ///
    /// Default: [`Model::Basic`].
    pub global_signal: Model,

    /// CompCor flavour.
    ///
    /// Default: [`CompCorMode::Anat`].
    pub compcor: CompCorMode,

    /// Components per mask, or `auto` for the 50 % variance prefix.
    ///
    /// Default: [`CompCorCount::Auto`].
    pub n_compcor: CompCorCount,

    /// Use components from the combined WM+CSF mask (`true`) or from each
    /// mask separately (`false`). `None` is only valid for temporal CompCor.
    ///
    /// Default: `Some(true)`.
    pub acompcor_combined: Option<bool>,

    /// ICA-AROMA flavour. Must be set when `ica_aroma` is in the strategy.
    ///
    /// Default: `None`.
    pub ica_aroma: Option<AromaMode>,

    /// Remove each regressor's temporal mean.
    ///
    /// Default: `true`.
    pub demean: bool,
}

impl Default for ConfoundsConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            motion: Model::Full,
            n_motion: 0.0,
            scrub: ScrubMode::Full,
            scrub_min_segment: 5,
            fd_thresh: 0.2,
            std_dvars_thresh: 3.0,
            wm_csf: Model::Basic,
            global_signal: Model::Basic,
            compcor: CompCorMode::Anat,
            n_compcor: CompCorCount::Auto,
            acompcor_combined: Some(true),
            ica_aroma: None,
            demean: true,
        }
    }
}

impl ConfoundsConfig {
    /// Parse a JSON configuration; absent fields keep their defaults.
    ///
    /// Strategy and option errors are reported as the matching
    /// [`ConfoundError`] variant rather than a generic parse failure.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ConfoundError::InvalidConfiguration(format!("config is not JSON: {e}")))?;
        if let Some(strategy) = value.get("strategy") {
            Strategy::from_json(strategy)?;
        }
        check_option::<Model>(&value, "motion")?;
        check_option::<Model>(&value, "wm_csf")?;
        check_option::<Model>(&value, "global_signal")?;
        check_option::<ScrubMode>(&value, "scrub")?;
        check_option::<CompCorMode>(&value, "compcor")?;
        check_option::<AromaMode>(&value, "ica_aroma")?;
        if let Some(count) = value.get("n_compcor") {
            CompCorCount::try_from(count.clone())?;
        }
        serde_json::from_value(value)
            .map_err(|e| ConfoundError::InvalidConfiguration(e.to_string()))
    }

    /// Scrub parameters derived from this configuration.
    pub fn scrub_params(&self) -> ScrubParams {
        ScrubParams {
            mode: self.scrub,
            fd_thresh: self.fd_thresh,
            std_dvars_thresh: self.std_dvars_thresh,
            min_segment: self.scrub_min_segment,
        }
    }
}

/// Parse `value[field]` through `T::from_str`, reporting failures against `field`.
fn check_option<T>(value: &Value, field: &'static str) -> Result<()>
where
    T: FromStr<Err = ConfoundError>,
{
    match value.get(field) {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(s)) => s.parse::<T>().map(|_| ()).map_err(|e| match e {
            ConfoundError::InvalidOption { value, .. } => {
                ConfoundError::InvalidOption { option: field, value }
            }
            other => other,
        }),
        Some(other) => Err(ConfoundError::InvalidOption { option: field, value: other.to_string() }),
    }
}
