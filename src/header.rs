//! Header parsing for GEF and BRO-XML soundings.
//!
//! Splits a sounding file into its header fields and the data block,
//! then resolves the table layout and site metadata from those fields.
//! Everything here is a pure function of the input text.

mod columns;
mod gef;
mod metadata;
mod xml;


pub use columns::{TableLayout, resolve_layout};
pub use metadata::build_metadata;

use crate::error::{GefError, Result};
use crate::models::{Dialect, TestType};
use std::borrow::Cow;
use tracing::debug;

/// One `key = value` entry of a header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeaderField {
    pub key: String,
    pub value: String,
    /// 1-based line in the source text
    pub line: usize,
}

impl RawHeaderField {
    /// Comma separated values with surrounding whitespace removed
    pub fn values(&self) -> Vec<&str> {
        self.value.split(',').map(str::trim).collect()
    }

    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.value
            .split(',')
            .nth(index)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn number_at(&self, index: usize) -> Option<f64> {
        self.value_at(index).and_then(|v| v.parse::<f64>().ok())
    }
}

/// Header fields plus the unparsed data block of one file
#[derive(Debug, Clone)]
pub struct HeaderBlock<'a> {
    pub dialect: Dialect,
    /// Record type named by the header, if any
    pub test_type: Option<TestType>,
    pub fields: Vec<RawHeaderField>,
    pub data: Cow<'a, str>,
    /// 1-based line on which the data block starts
    pub data_line: usize,
}

impl HeaderBlock<'_> {
    /// First field with this key
    pub fn get(&self, key: &str) -> Option<&RawHeaderField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn get_all<'s, 'k>(
        &'s self,
        key: &'k str,
    ) -> impl Iterator<Item = &'s RawHeaderField> + use<'s, 'k> {
        self.fields.iter().filter(move |f| f.key == key)
    }

    /// Trimmed raw value of the first field with this key
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .map(|f| f.value.trim())
            .filter(|v| !v.is_empty())
    }

    /// Value of a numbered GEF variable such as `#MEASUREMENTVAR= 13, 1.5, m`
    pub fn numbered_value(&self, key: &str, number: u32) -> Option<&str> {
        self.get_all(key)
            .find(|f| {
                f.value_at(0)
                    .and_then(|n| n.parse::<u32>().ok())
                    .is_some_and(|n| n == number)
            })
            .and_then(|f| f.value_at(1))
    }

    pub fn measurement_var(&self, number: u32) -> Option<f64> {
        self.numbered_value("MEASUREMENTVAR", number)
            .and_then(|v| v.parse::<f64>().ok())
    }
}

/// Detect the dialect of `text` and split it into header fields and data
pub fn parse_header(text: &str) -> Result<HeaderBlock<'_>> {
    let body = text.trim_start_matches('\u{feff}');
    let first = body.trim_start().chars().next();

    let header = match first {
        Some('#') => gef::parse_gef_header(body)?,
        Some('<') => xml::parse_bro_header(body)?,
        Some(other) => {
            return Err(GefError::unsupported(format!(
                "unrecognised file start '{}'; expected a GEF '#' header or an XML document",
                other
            )));
        }
        None => return Err(GefError::unsupported("empty input")),
    };

    debug!(
        "Parsed {} header: {} fields, test type {:?}",
        header.dialect,
        header.fields.len(),
        header.test_type
    );

    Ok(header)
}
