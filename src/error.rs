//! Error taxonomy for confound loading.
//!
//! Configuration and option errors abort a load immediately. Missing columns
//! are never raised one family at a time: they are collected in
//! [`crate::diagnostics::Diagnostics`] and surface once as
//! [`ConfoundError::UnresolvedConfounds`].

/// Errors produced by the confound engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfoundError {
    /// Strategy is not a list of strings, or names an unsupported family.
    #[error("invalid strategy: {0}")]
    InvalidStrategy(String),

    /// Unsupported value for a family-specific option.
    #[error("invalid option for {option}: {value:?}")]
    InvalidOption { option: &'static str, value: String },

    /// Option combination that cannot be satisfied.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Sidecar metadata required by a family is absent for this scan.
    #[error("missing metadata: {0}")]
    MissingMetadata(String),

    /// Every missing family, column and keyword of one scan, reported together.
    #[error(
        "The following keys or parameters are missing: {params:?} {keywords:?} \
         (families: {families}). You may want to try a different denoising strategy."
    )]
    UnresolvedConfounds {
        families: String,
        params: Vec<String>,
        keywords: Vec<String>,
    },

    /// Malformed raw table (ragged rows, duplicate headers, ...).
    #[error("malformed confound table: {0}")]
    Shape(String),
}

pub type Result<T> = std::result::Result<T, ConfoundError>;
