//! Error handling for sounding parsing and classification.
//!
//! Fatal conditions abort one file and surface as [`GefError`]. Anomalies
//! that only degrade a single depth sample are collected as
//! [`PipelineWarning`]s inside the returned record instead.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GefError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Malformed header{}: {reason}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    MalformedHeader { reason: String, line: Option<usize> },

    #[error(
        "Row {row} could not be parsed{}: {reason} (raw: '{raw}')",
        .field.as_ref().map(|f| format!(" in column '{f}'")).unwrap_or_default()
    )]
    RowParse {
        row: usize,
        raw: String,
        field: Option<String>,
        reason: String,
    },

    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },
}

impl GefError {
    pub fn malformed_header(reason: impl Into<String>) -> Self {
        GefError::MalformedHeader {
            reason: reason.into(),
            line: None,
        }
    }

    pub fn malformed_header_at(reason: impl Into<String>, line: usize) -> Self {
        GefError::MalformedHeader {
            reason: reason.into(),
            line: Some(line),
        }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        GefError::UnsupportedFormat {
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        GefError::Configuration {
            message: message.into(),
        }
    }

    /// True for errors caused by the content of a single file rather than
    /// the environment; the batch runner keeps going after these.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            GefError::MalformedHeader { .. }
                | GefError::RowParse { .. }
                | GefError::UnsupportedFormat { .. }
                | GefError::Xml(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GefError>;

/// Why a derived ratio has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UndefinedReason {
    /// An input measurement is absent
    MissingInput,
    /// Cone resistance is zero or negative
    NonPositiveConeResistance,
    /// Denominator is zero or too close to it
    ZeroDenominator,
    /// No groundwater level, so effective stress cannot be derived
    NoNormalizationBase,
    /// Effective stress is zero or negative
    NonPositiveEffectiveStress,
    /// The result was not a finite number
    NonFinite,
    /// Chart inputs are zero or negative
    OutOfRange,
}

impl fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UndefinedReason::MissingInput => "missing input",
            UndefinedReason::NonPositiveConeResistance => "cone resistance <= 0",
            UndefinedReason::ZeroDenominator => "zero denominator",
            UndefinedReason::NoNormalizationBase => "no normalization base",
            UndefinedReason::NonPositiveEffectiveStress => "effective stress <= 0",
            UndefinedReason::NonFinite => "non-finite result",
            UndefinedReason::OutOfRange => "outside the classification chart",
        };
        f.write_str(text)
    }
}

/// Non-fatal condition recorded while processing one sounding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PipelineWarning {
    /// A data row was dropped; `row` is the 1-based index in the data block
    RowSkipped { row: usize, reason: String },
    /// A depth equal to the previous one; the first occurrence was kept
    DuplicateDepth { row: usize, depth: f64 },
    /// A depth smaller than the previous one; the row was dropped
    NonMonotonicDepth {
        row: usize,
        depth: f64,
        previous: f64,
    },
    /// The friction ratio of a row could not be derived
    UndefinedRatio { row: usize, reason: UndefinedReason },
    /// A row could not be placed on the classification chart
    UnclassifiedSoil { row: usize },
    /// A borehole soil description that is not in the lookup tables
    UnknownSoilCode { row: usize, code: String },
    /// Two borehole layers overlap
    OverlappingLayers { row: usize, top: f64, previous_bottom: f64 },
    /// A groundwater elevation was configured but the sounding has no
    /// ground level to convert it with; the header level is used instead
    UnknownGroundLevel { groundwater_elevation: f64 },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::RowSkipped { row, reason } => {
                write!(f, "row {row} skipped: {reason}")
            }
            PipelineWarning::DuplicateDepth { row, depth } => {
                write!(f, "row {row} duplicates depth {depth:.3} m, first occurrence kept")
            }
            PipelineWarning::NonMonotonicDepth {
                row,
                depth,
                previous,
            } => write!(
                f,
                "row {row} dropped: depth {depth:.3} m is above previous depth {previous:.3} m"
            ),
            PipelineWarning::UndefinedRatio { row, reason } => {
                write!(f, "row {row}: friction ratio undefined ({reason})")
            }
            PipelineWarning::UnclassifiedSoil { row } => {
                write!(f, "row {row}: soil could not be classified")
            }
            PipelineWarning::UnknownSoilCode { row, code } => {
                write!(f, "row {row}: unknown soil code '{code}'")
            }
            PipelineWarning::OverlappingLayers {
                row,
                top,
                previous_bottom,
            } => write!(
                f,
                "row {row}: layer top {top:.3} m overlaps previous bottom {previous_bottom:.3} m"
            ),
            PipelineWarning::UnknownGroundLevel {
                groundwater_elevation,
            } => write!(
                f,
                "groundwater elevation {groundwater_elevation:.3} m ignored: ground level unknown"
            ),
        }
    }
}
