//! Expansion of base regressor names into derivative / quadratic columns.
//!
//! fMRIPrep writes, for every base regressor `x`:
//!   `x`, `x_derivative1`, `x_power2`, `x_derivative1_power2`
//!
//! Variants of one base stay grouped together in the output.
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConfoundError, Result};

/// Which expansion terms accompany each base regressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    /// `x`
    Basic,
    /// `x`, `x_derivative1`
    Derivatives,
    /// `x`, `x_power2`
    #[serde(alias = "power2")]
    Quadratic,
    /// `x`, `x_derivative1`, `x_power2`, `x_derivative1_power2`
    Full,
}

impl Model {
    fn suffixes(self) -> &'static [&'static str] {
        match self {
            Model::Basic => &[""],
            Model::Derivatives => &["", "_derivative1"],
            Model::Quadratic => &["", "_power2"],
            Model::Full => &["", "_derivative1", "_power2", "_derivative1_power2"],
        }
    }
}

impl FromStr for Model {
    type Err = ConfoundError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(Model::Basic),
            "derivatives" => Ok(Model::Derivatives),
            "quadratic" | "power2" => Ok(Model::Quadratic),
            "full" => Ok(Model::Full),
            other => Err(ConfoundError::InvalidOption {
                option: "model",
                value: other.to_string(),
            }),
        }
    }
}

/// Expand `bases` under `model`, grouped by base name.
pub fn add_suffix<S: AsRef<str>>(bases: &[S], model: Model) -> Vec<String> {
    bases
        .iter()
        .flat_map(|b| {
            model
                .suffixes()
                .iter()
                .map(move |s| format!("{}{s}", b.as_ref()))
        })
        .collect()
}
