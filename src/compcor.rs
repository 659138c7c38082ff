//! CompCor component selection from the confounds sidecar.
//!
//! fMRIPrep describes every CompCor column in the JSON sidecar next to the
//! confounds table:
//!
//! ```json
//! "a_comp_cor_00": {
//!     "CumulativeVarianceExplained": 0.21,
//!     "Mask": "combined",
//!     "Method": "aCompCor",
//!     "Retained": true,
//!     "SingularValue": 25.8,
//!     "VarianceExplained": 0.21
//! }
//! ```
//!
//! [`ComponentMetadata`] keeps only what selection needs: mask, rank within
//! the mask (0 = most variance), cumulative variance at that rank, and whether
//! the pipeline retained the component.
use std::collections::BTreeMap;
use std::str::FromStr;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfoundError, Result};

/// Cumulative variance fraction reached by `n_compcor = auto`.
pub const AUTO_VARIANCE_TARGET: f64 = 0.5;

/// Source mask of a CompCor component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MaskKind {
    /// Union of white-matter and CSF masks.
    Combined,
    WhiteMatter,
    Csf,
    /// tCompCor high-variance voxels.
    Temporal,
}

impl MaskKind {
    pub fn is_anatomical(self) -> bool {
        !matches!(self, MaskKind::Temporal)
    }
}

/// Selection attributes of one candidate column.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInfo {
    pub mask: MaskKind,
    pub rank: usize,
    pub cumulative_variance: f64,
    pub retained: bool,
}

/// Candidate CompCor columns of one scan, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentMetadata {
    components: BTreeMap<String, ComponentInfo>,
}

/// Which CompCor flavour to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompCorMode {
    /// Anatomical (aCompCor).
    Anat,
    /// Temporal (tCompCor).
    Temp,
    /// Anatomical and temporal, each selected independently.
    Full,
}

impl FromStr for CompCorMode {
    type Err = ConfoundError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "anat" => Ok(CompCorMode::Anat),
            "temp" => Ok(CompCorMode::Temp),
            "full" => Ok(CompCorMode::Full),
            other => Err(ConfoundError::InvalidOption { option: "compcor", value: other.into() }),
        }
    }
}

/// Number of components to keep per mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub enum CompCorCount {
    /// Smallest prefix reaching [`AUTO_VARIANCE_TARGET`].
    Auto,
    Count(usize),
}

impl FromStr for CompCorCount {
    type Err = ConfoundError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "auto" {
            return Ok(CompCorCount::Auto);
        }
        s.parse()
            .map(CompCorCount::Count)
            .map_err(|_| ConfoundError::InvalidOption { option: "n_compcor", value: s.into() })
    }
}

impl TryFrom<Value> for CompCorCount {
    type Error = ConfoundError;

    fn try_from(v: Value) -> Result<Self> {
        match &v {
            Value::String(s) => s.parse(),
            Value::Number(n) => n
                .as_u64()
                .map(|n| CompCorCount::Count(n as usize))
                .ok_or_else(|| ConfoundError::InvalidOption {
                    option: "n_compcor",
                    value: n.to_string(),
                }),
            other => Err(ConfoundError::InvalidOption {
                option: "n_compcor",
                value: other.to_string(),
            }),
        }
    }
}

impl ComponentMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, info: ComponentInfo) {
        self.components.insert(column.into(), info);
    }

    pub fn get(&self, column: &str) -> Option<&ComponentInfo> {
        self.components.get(column)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Parse the fMRIPrep confounds sidecar.
    ///
    /// Entries that are not CompCor components (e.g. ICA-AROMA mixing info)
    /// are skipped. Ranks are assigned per mask by descending
    /// `VarianceExplained`, ties broken by column name.
    pub fn from_sidecar(sidecar: &Value) -> Result<Self> {
        let obj = sidecar.as_object().ok_or_else(|| {
            ConfoundError::MissingMetadata("confounds sidecar is not a JSON object".into())
        })?;

        // (mask, name, variance, cumulative, retained)
        let mut rows: Vec<(MaskKind, &str, f64, f64, bool)> = Vec::new();
        for (name, entry) in obj {
            let Some(mask) = component_mask(name, entry)? else {
                continue;
            };
            let cumulative = entry["CumulativeVarianceExplained"].as_f64().unwrap_or(f64::NAN);
            let variance = entry["VarianceExplained"].as_f64().unwrap_or(f64::NEG_INFINITY);
            let retained = entry["Retained"].as_bool().unwrap_or(true);
            rows.push((mask, name.as_str(), variance, cumulative, retained));
        }

        rows.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(b.2.total_cmp(&a.2))
                .then_with(|| a.1.cmp(b.1))
        });

        let mut meta = Self::new();
        let mut rank = 0;
        let mut prev: Option<MaskKind> = None;
        for (mask, name, _, cumulative, retained) in rows {
            if prev != Some(mask) {
                rank = 0;
                prev = Some(mask);
            }
            meta.insert(name, ComponentInfo { mask, rank, cumulative_variance: cumulative, retained });
            rank += 1;
        }
        debug!("compcor sidecar: {} candidate components", meta.len());
        Ok(meta)
    }

    /// Retained columns of one mask, highest variance first.
    fn ranked(&self, mask: MaskKind) -> Vec<(&str, &ComponentInfo)> {
        let mut group: Vec<(&str, &ComponentInfo)> = self
            .components
            .iter()
            .filter(|(_, info)| info.mask == mask && info.retained)
            .map(|(name, info)| (name.as_str(), info))
            .collect();
        group.sort_by_key(|(_, info)| info.rank);
        group
    }
}

fn component_mask(name: &str, entry: &Value) -> Result<Option<MaskKind>> {
    let method = entry["Method"].as_str();
    let is_temporal = name.starts_with("t_comp_cor") || method == Some("tCompCor");
    let is_anat = name.starts_with("a_comp_cor") || method == Some("aCompCor");
    if is_temporal {
        return Ok(Some(MaskKind::Temporal));
    }
    if !is_anat {
        return Ok(None);
    }
    match entry["Mask"].as_str() {
        Some("combined") => Ok(Some(MaskKind::Combined)),
        Some("WM") => Ok(Some(MaskKind::WhiteMatter)),
        Some("CSF") => Ok(Some(MaskKind::Csf)),
        other => Err(ConfoundError::MissingMetadata(format!(
            "{name}: unrecognised compcor mask {other:?}"
        ))),
    }
}

/// Select the CompCor columns for `mode`.
///
/// `combined` is only consulted when anatomical components are requested;
/// `None` there is an [`ConfoundError::InvalidConfiguration`].
pub fn find_compcor(
    meta: &ComponentMetadata,
    mode: CompCorMode,
    count: CompCorCount,
    combined: Option<bool>,
) -> Result<Vec<String>> {
    if count == CompCorCount::Count(0) {
        return Err(ConfoundError::InvalidConfiguration(
            "n_compcor must be a positive integer or \"auto\"".into(),
        ));
    }

    let mut masks = Vec::new();
    if matches!(mode, CompCorMode::Anat | CompCorMode::Full) {
        match combined {
            Some(true) => masks.push(MaskKind::Combined),
            Some(false) => masks.extend([MaskKind::WhiteMatter, MaskKind::Csf]),
            None => {
                return Err(ConfoundError::InvalidConfiguration(
                    "acompcor_combined must be true or false".into(),
                ))
            }
        }
    }
    if matches!(mode, CompCorMode::Temp | CompCorMode::Full) {
        masks.push(MaskKind::Temporal);
    }

    let mut selected = Vec::new();
    for mask in masks {
        let group = meta.ranked(mask);
        let n = match count {
            CompCorCount::Auto => auto_count(&group),
            CompCorCount::Count(n) => {
                if n > group.len() {
                    warn!(
                        "n_compcor = {n} exceeds the {} components available for {mask:?}",
                        group.len()
                    );
                }
                n.min(group.len())
            }
        };
        selected.extend(group[..n].iter().map(|(name, _)| name.to_string()));
    }
    Ok(selected)
}

/// Smallest prefix whose cumulative variance reaches the auto target.
/// Falls back to the whole group if the target is never reached.
fn auto_count(group: &[(&str, &ComponentInfo)]) -> usize {
    group
        .iter()
        .position(|(_, info)| info.cumulative_variance >= AUTO_VARIANCE_TARGET)
        .map_or(group.len(), |i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sidecar() -> Value {
        json!({
            "a_comp_cor_00": {"Mask": "combined", "Method": "aCompCor", "Retained": true,
                              "VarianceExplained": 0.30, "CumulativeVarianceExplained": 0.30},
            "a_comp_cor_01": {"Mask": "combined", "Method": "aCompCor", "Retained": true,
                              "VarianceExplained": 0.25, "CumulativeVarianceExplained": 0.55},
            "a_comp_cor_02": {"Mask": "combined", "Method": "aCompCor", "Retained": true,
                              "VarianceExplained": 0.10, "CumulativeVarianceExplained": 0.65},
            "a_comp_cor_03": {"Mask": "combined", "Method": "aCompCor", "Retained": false,
                              "VarianceExplained": 0.05, "CumulativeVarianceExplained": 0.70},
            "t_comp_cor_00": {"Method": "tCompCor", "Retained": true,
                              "VarianceExplained": 0.60, "CumulativeVarianceExplained": 0.60},
            "t_comp_cor_01": {"Method": "tCompCor", "Retained": true,
                              "VarianceExplained": 0.20, "CumulativeVarianceExplained": 0.80},
            "aroma_motion_01": {"MotionNoise": true}
        })
    }

    #[test]
    fn sidecar_ranks_by_variance() {
        let meta = ComponentMetadata::from_sidecar(&sidecar()).unwrap();
        assert_eq!(meta.len(), 6);
        assert_eq!(meta.get("a_comp_cor_01").unwrap().rank, 1);
        assert_eq!(meta.get("t_comp_cor_00").unwrap().rank, 0);
        assert_eq!(meta.get("t_comp_cor_00").unwrap().mask, MaskKind::Temporal);
        assert!(meta.get("aroma_motion_01").is_none());
    }

    #[test]
    fn auto_reaches_half_variance() {
        let meta = ComponentMetadata::from_sidecar(&sidecar()).unwrap();
        let cols = find_compcor(&meta, CompCorMode::Anat, CompCorCount::Auto, Some(true)).unwrap();
        assert_eq!(cols, ["a_comp_cor_00", "a_comp_cor_01"]);
        let cols = find_compcor(&meta, CompCorMode::Temp, CompCorCount::Auto, Some(true)).unwrap();
        assert_eq!(cols, ["t_comp_cor_00"]);
    }

    #[test]
    fn explicit_count_is_clamped_and_skips_dropped() {
        let meta = ComponentMetadata::from_sidecar(&sidecar()).unwrap();
        let cols = find_compcor(&meta, CompCorMode::Anat, CompCorCount::Count(10), Some(true)).unwrap();
        assert_eq!(cols, ["a_comp_cor_00", "a_comp_cor_01", "a_comp_cor_02"]);
    }

    #[test]
    fn temp_ignores_combined_flag() {
        let meta = ComponentMetadata::from_sidecar(&sidecar()).unwrap();
        assert!(find_compcor(&meta, CompCorMode::Temp, CompCorCount::Auto, None).is_ok());
        assert!(matches!(
            find_compcor(&meta, CompCorMode::Full, CompCorCount::Auto, None),
            Err(ConfoundError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn count_parsing() {
        assert_eq!("auto".parse::<CompCorCount>().unwrap(), CompCorCount::Auto);
        assert_eq!("3".parse::<CompCorCount>().unwrap(), CompCorCount::Count(3));
        assert!("blah".parse::<CompCorMode>().is_err());
        assert_eq!(CompCorCount::try_from(json!(2)).unwrap(), CompCorCount::Count(2));
        assert!(CompCorCount::try_from(json!(1.5)).is_err());
    }
}
