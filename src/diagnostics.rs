//! Per-scan record of missing confounds.
//!
//! Loaders report absent columns as a [`Missing`] value. The assembler folds
//! them into a [`Diagnostics`] value, which is consumed once by
//! [`Diagnostics::into_result`] after every family has been tried.
use crate::error::{ConfoundError, Result};
use crate::strategy::ConfoundFamily;

/// What one family could not find in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Missing {
    pub family: ConfoundFamily,
    /// Exact column names that are absent.
    pub params: Vec<String>,
    /// Keywords that matched no column.
    pub keywords: Vec<String>,
}

impl Missing {
    pub fn params(family: ConfoundFamily, params: Vec<String>) -> Self {
        Self { family, params, keywords: Vec::new() }
    }

    pub fn keyword(family: ConfoundFamily, keyword: String) -> Self {
        Self { family, params: Vec::new(), keywords: vec![keyword] }
    }
}

/// Everything missing across the families of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    families: Vec<ConfoundFamily>,
    params: Vec<String>,
    keywords: Vec<String>,
}

impl Diagnostics {
    #[must_use]
    pub fn record(mut self, missing: Missing) -> Self {
        if !self.families.contains(&missing.family) {
            self.families.push(missing.family);
        }
        self.params.extend(missing.params);
        self.keywords.extend(missing.keywords);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn families(&self) -> &[ConfoundFamily] {
        &self.families
    }

    /// `Ok` if nothing is missing, otherwise one combined
    /// [`ConfoundError::UnresolvedConfounds`].
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let families = self
            .families
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(ConfoundError::UnresolvedConfounds {
            families,
            params: self.params,
            keywords: self.keywords,
        })
    }
}
