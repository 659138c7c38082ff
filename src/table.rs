//! Raw confound table and column resolution.
//!
//! A [`ConfoundTable`] is the per-scan regressor table written by the
//! preprocessing pipeline: named `f64` columns, one row per volume, rows in
//! acquisition order. The engine only reads it.
//!
//! Column lookups never fail outright. [`ConfoundTable::resolve`] and
//! [`ConfoundTable::find`] return a [`Resolution`], so the caller decides
//! whether an absent column is fatal or something to accumulate.
use std::collections::HashMap;

use ndarray::{concatenate, Array2, ArrayView1, Axis};

use crate::error::{ConfoundError, Result};

/// Named numeric columns, shape `[T, N]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfoundTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    data: Array2<f64>,
}

/// A set of selected regressors, shape `[T, K]`, with one label per column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBlock {
    pub columns: Vec<String>,
    pub data: Array2<f64>,
}

/// Outcome of looking columns up in a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// All requested columns were present.
    Found(ColumnBlock),
    /// Exact column names that are absent.
    MissingColumns(Vec<String>),
    /// Keyword that matched no column at all.
    MissingKeyword(String),
}

impl ConfoundTable {
    /// Build a table from headers and a `[T, N]` matrix.
    pub fn new(columns: Vec<String>, data: Array2<f64>) -> Result<Self> {
        if columns.len() != data.ncols() {
            return Err(ConfoundError::Shape(format!(
                "{} column names for {} data columns",
                columns.len(),
                data.ncols()
            )));
        }
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(ConfoundError::Shape(format!("duplicate column {name:?}")));
            }
        }
        Ok(Self { columns, index, data })
    }

    /// Build a table from `(name, values)` pairs of equal length.
    pub fn from_columns<S: Into<String>>(cols: Vec<(S, Vec<f64>)>) -> Result<Self> {
        let n_t = cols.first().map_or(0, |(_, v)| v.len());
        let mut names = Vec::with_capacity(cols.len());
        let mut data = Array2::<f64>::zeros((n_t, cols.len()));
        for (j, (name, values)) in cols.into_iter().enumerate() {
            let name = name.into();
            if values.len() != n_t {
                return Err(ConfoundError::Shape(format!(
                    "column {name:?} has {} rows, expected {n_t}",
                    values.len()
                )));
            }
            data.column_mut(j).assign(&ArrayView1::from(&values));
            names.push(name);
        }
        Self::new(names, data)
    }

    /// Number of volumes (rows).
    pub fn n_scans(&self) -> usize {
        self.data.nrows()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.index.get(name).map(|&j| self.data.column(j))
    }

    /// Restrict the table to `names`, in the requested order.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Resolution {
        let missing: Vec<String> = names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| !self.index.contains_key(*n))
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            return Resolution::MissingColumns(missing);
        }
        let idx: Vec<usize> = names.iter().map(|n| self.index[n.as_ref()]).collect();
        Resolution::Found(ColumnBlock {
            columns: names.iter().map(|n| n.as_ref().to_string()).collect(),
            data: self.data.select(Axis(1), &idx),
        })
    }

    /// All columns whose name contains `keyword`, in table order.
    pub fn find(&self, keyword: &str) -> Resolution {
        let names: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| c.contains(keyword))
            .map(String::as_str)
            .collect();
        if names.is_empty() {
            Resolution::MissingKeyword(keyword.to_string())
        } else {
            self.resolve(&names)
        }
    }
}

impl ColumnBlock {
    /// A block with `n_t` rows and no columns.
    pub fn empty(n_t: usize) -> Self {
        Self { columns: Vec::new(), data: Array2::zeros((n_t, 0)) }
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Concatenate blocks column-wise, in order.
    pub fn hstack(n_t: usize, blocks: Vec<ColumnBlock>) -> Result<Self> {
        if blocks.is_empty() {
            return Ok(Self::empty(n_t));
        }
        let views: Vec<_> = blocks.iter().map(|b| b.data.view()).collect();
        let data = concatenate(Axis(1), &views)
            .map_err(|e| ConfoundError::Shape(format!("cannot concatenate blocks: {e}")))?;
        let columns = blocks.into_iter().flat_map(|b| b.columns).collect();
        Ok(Self { columns, data })
    }
}
