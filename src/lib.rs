//! GEF Processor Library
//!
//! A Rust library for reading geotechnical soundings from GEF and BRO-XML
//! files and classifying the soil they describe.
//!
//! This library provides tools for:
//! - Parsing GEF and BRO-XML headers for CPTs and boreholes
//! - Reading the data block into rows with void handling
//! - Normalising columns to canonical units and corrected depths
//! - Deriving Robertson ratios with unit weight refinement
//! - Classifying CPT rows and borehole soil codes into soil labels
//! - Assembling classified rows into soil layers
//! - Exporting records as polars DataFrames
//!
//! The pipeline works on in-memory text; file handling lives in [`cli`].

pub mod assembler;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod error;
pub mod header;
pub mod models;
pub mod normalizer;
pub mod processor;
pub mod ratios;
pub mod reader;
pub mod table;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
    pub mod discovery;
    pub mod writer;
}

// Re-export commonly used types
pub use config::{ClassificationMethod, PipelineConfig};
pub use error::{GefError, PipelineWarning, Result};
pub use models::{BoreRecord, CptRecord, Layer, SoilLabel, Sounding};
pub use processor::SoundingProcessor;
pub use table::concat_tables;
