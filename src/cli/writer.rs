//! Table output for the command-line runner.
//!
//! Writes combined sounding tables as Parquet or CSV files into an output
//! directory, one file per table.

use crate::error::{GefError, Result};
use clap::ValueEnum;
use polars::prelude::{CsvWriter, DataFrame, ParquetCompression, ParquetWriter, SerWriter};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TableFormat {
    #[default]
    Parquet,
    Csv,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Parquet => "parquet",
            TableFormat::Csv => "csv",
        }
    }
}

/// Parquet compression choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Compression {
    #[default]
    Snappy,
    Zstd,
    Lz4,
    None,
}

impl Compression {
    pub fn to_polars_compression(self) -> ParquetCompression {
        match self {
            Compression::Snappy => ParquetCompression::Snappy,
            Compression::Zstd => ParquetCompression::Zstd(None),
            Compression::Lz4 => ParquetCompression::Lz4Raw,
            Compression::None => ParquetCompression::Uncompressed,
        }
    }
}

/// Writes named tables into one directory
#[derive(Debug, Clone)]
pub struct TableWriter {
    output_dir: PathBuf,
    format: TableFormat,
    compression: Compression,
}

impl TableWriter {
    pub fn new(output_dir: PathBuf, format: TableFormat) -> Self {
        Self {
            output_dir,
            format,
            compression: Compression::default(),
        }
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path a table named `name` is written to
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", name, self.format.extension()))
    }

    /// Write `df` as table `name`, returning the path and size in bytes.
    /// Empty tables are not written.
    pub fn write(&self, name: &str, mut df: DataFrame) -> Result<Option<(PathBuf, u64)>> {
        if df.height() == 0 {
            debug!("Skipping empty table '{}'", name);
            return Ok(None);
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.table_path(name);
        let file = File::create(&path)?;

        let written = match self.format {
            TableFormat::Parquet => ParquetWriter::new(file)
                .with_compression(self.compression.to_polars_compression())
                .finish(&mut df)
                .map(|_| ()),
            TableFormat::Csv => CsvWriter::new(file).include_header(true).finish(&mut df),
        };
        written.map_err(|e| GefError::ProcessingFailed {
            path: path.clone(),
            reason: format!("Failed to write {} table: {}", name, e),
        })?;

        let size = std::fs::metadata(&path)?.len();
        debug!(
            "Wrote {} rows to {} ({} bytes)",
            df.height(),
            path.display(),
            size
        );
        Ok(Some((path, size)))
    }
}
