//! Denoising strategy: which confound families to load, in which order.
//!
//! The vocabulary is fixed at compile time in [`SUPPORTED_FAMILIES`]. Family
//! order in a [`Strategy`] is the column-block order of the output matrix.
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConfoundError, Result};

/// One family of nuisance regressors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfoundFamily {
    Motion,
    HighPass,
    WmCsf,
    Global,
    CompCor,
    IcaAroma,
    Scrub,
}

/// Every family the engine knows how to load.
pub const SUPPORTED_FAMILIES: [ConfoundFamily; 7] = [
    ConfoundFamily::Motion,
    ConfoundFamily::HighPass,
    ConfoundFamily::WmCsf,
    ConfoundFamily::Global,
    ConfoundFamily::CompCor,
    ConfoundFamily::IcaAroma,
    ConfoundFamily::Scrub,
];

impl ConfoundFamily {
    /// Tag used in strategies and diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Motion => "motion",
            Self::HighPass => "high_pass",
            Self::WmCsf => "wm_csf",
            Self::Global => "global",
            Self::CompCor => "compcor",
            Self::IcaAroma => "ica_aroma",
            Self::Scrub => "scrub",
        }
    }
}

impl fmt::Display for ConfoundFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfoundFamily {
    type Err = ConfoundError;

    fn from_str(s: &str) -> Result<Self> {
        SUPPORTED_FAMILIES
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                ConfoundError::InvalidStrategy(format!("{s} is not a supported type of confounds"))
            })
    }
}

/// Validated, ordered list of confound families.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct Strategy(Vec<ConfoundFamily>);

impl Strategy {
    /// Build from already-typed families. Duplicates are rejected.
    pub fn new(families: Vec<ConfoundFamily>) -> Result<Self> {
        for (i, f) in families.iter().enumerate() {
            if families[..i].contains(f) {
                return Err(ConfoundError::InvalidStrategy(format!(
                    "{f} is listed more than once"
                )));
            }
        }
        Ok(Self(families))
    }

    /// Parse a list of family tags, order preserved.
    pub fn parse<S: AsRef<str>>(tags: &[S]) -> Result<Self> {
        let families = tags
            .iter()
            .map(|t| t.as_ref().parse())
            .collect::<Result<Vec<_>>>()?;
        Self::new(families)
    }

    /// Validate an untyped value: it must be an array of supported tag strings.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| {
            ConfoundError::InvalidStrategy("strategy needs to be a list of strings".into())
        })?;
        let tags = items
            .iter()
            .map(|v| {
                v.as_str().ok_or_else(|| {
                    ConfoundError::InvalidStrategy(format!("{v} is not a supported type of confounds"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::parse(&tags)
    }

    pub fn families(&self) -> &[ConfoundFamily] {
        &self.0
    }

    pub fn contains(&self, family: ConfoundFamily) -> bool {
        self.0.contains(&family)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Strategy {
    /// `[motion, high_pass, wm_csf]`
    fn default() -> Self {
        Self(vec![
            ConfoundFamily::Motion,
            ConfoundFamily::HighPass,
            ConfoundFamily::WmCsf,
        ])
    }
}

impl TryFrom<serde_json::Value> for Strategy {
    type Error = ConfoundError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Self::from_json(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_tag_round_trips() {
        for f in SUPPORTED_FAMILIES {
            assert_eq!(f.as_str().parse::<ConfoundFamily>().unwrap(), f);
        }
    }

    #[test]
    fn order_is_preserved() {
        let s = Strategy::parse(&["scrub", "motion", "global"]).unwrap();
        assert_eq!(
            s.families(),
            &[ConfoundFamily::Scrub, ConfoundFamily::Motion, ConfoundFamily::Global]
        );
    }

    #[test]
    fn empty_strategy_is_valid() {
        let s = Strategy::parse::<&str>(&[]).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = Strategy::parse(&["motion", "error"]).unwrap_err();
        assert!(matches!(err, ConfoundError::InvalidStrategy(ref m) if m.contains("error")));
    }

    #[test]
    fn rejects_duplicates() {
        assert!(matches!(
            Strategy::parse(&["motion", "motion"]),
            Err(ConfoundError::InvalidStrategy(_))
        ));
    }

    #[test]
    fn json_rejects_non_list_and_non_string() {
        assert!(Strategy::from_json(&json!("string")).is_err());
        assert!(Strategy::from_json(&json!([0])).is_err());
        assert!(Strategy::from_json(&json!(["error"])).is_err());
        let s = Strategy::from_json(&json!(["compcor", "ica_aroma"])).unwrap();
        assert_eq!(s.families().len(), 2);
    }
}
