//! Data block reader.
//!
//! Splits the data block into records and tokens according to a
//! [`TableLayout`] and parses every token by the declared quantity type of
//! its column. No-data sentinels become [`Value::Missing`]; records made up
//! only of missing values are dropped.

mod tokenizer;

#[cfg(test)]
mod tests;

pub use tokenizer::{Token, split_records, tokenize};

use crate::config::RowErrorPolicy;
use crate::error::{GefError, PipelineWarning, Result};
use crate::header::TableLayout;
use crate::models::{ColumnSpec, QuantityType, Value};
use chrono::NaiveDate;
use tracing::debug;

/// One parsed data record
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based index among the non-empty records of the data block
    pub row: usize,
    /// One value per declared column; disabled columns are always missing
    pub values: Vec<Value>,
    /// Non-empty text tokens after the declared columns (borehole codes)
    pub text: Vec<String>,
}

impl RawRow {
    pub fn number(&self, spec: &ColumnSpec) -> Option<f64> {
        self.values.get(spec.index).and_then(Value::as_f64)
    }
}

/// All records of a data block in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
    pub warnings: Vec<PipelineWarning>,
    /// Records dropped because every value was missing
    pub void_rows: usize,
}

/// Read the data block `data` laid out as `layout`
pub fn read_table(layout: &TableLayout, data: &str, policy: RowErrorPolicy) -> Result<RawTable> {
    let mut table = RawTable::default();

    for (index, record) in split_records(data, layout.record_separator)
        .into_iter()
        .enumerate()
    {
        let row = index + 1;
        match parse_record(layout, record, row) {
            Ok(Some(parsed)) => table.rows.push(parsed),
            Ok(None) => table.void_rows += 1,
            Err(error) => match policy {
                RowErrorPolicy::Fatal => return Err(error),
                RowErrorPolicy::SkipWithWarning => {
                    debug!("Skipping data row {}: {}", row, error);
                    table.warnings.push(PipelineWarning::RowSkipped {
                        row,
                        reason: error.to_string(),
                    });
                }
            },
        }
    }

    debug!(
        "Read {} rows ({} all-void, {} skipped)",
        table.rows.len(),
        table.void_rows,
        table.warnings.len()
    );

    Ok(table)
}

/// Parse one record; `Ok(None)` when every value is missing
fn parse_record(layout: &TableLayout, record: &str, row: usize) -> Result<Option<RawRow>> {
    let row_error = |field: Option<&ColumnSpec>, reason: String| GefError::RowParse {
        row,
        raw: record.to_string(),
        field: field.map(|spec| spec.column.name().to_string()),
        reason,
    };

    let mut tokens =
        tokenize(record, layout.column_separator).map_err(|reason| row_error(None, reason))?;

    let expected = layout.column_count();
    // a separator closing the record leaves empty tokens behind
    while tokens.len() > expected && tokens.last().is_some_and(|t| t.is_empty() && !t.quoted) {
        tokens.pop();
    }

    let text_tokens = if tokens.len() > expected && layout.trailing_text {
        tokens.split_off(expected)
    } else {
        Vec::new()
    };

    if tokens.len() != expected {
        return Err(row_error(
            None,
            format!("expected {} values, found {}", expected, tokens.len()),
        ));
    }

    let mut values = Vec::with_capacity(expected);
    for (spec, token) in layout.columns.iter().zip(&tokens) {
        let value = if spec.enabled {
            parse_value(spec, token, layout.decimal_separator)
                .map_err(|reason| row_error(Some(spec), reason))?
        } else {
            Value::Missing
        };
        values.push(value);
    }

    let text: Vec<String> = text_tokens
        .into_iter()
        .map(|t| t.text.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if text.is_empty() && values.iter().all(Value::is_missing) {
        return Ok(None);
    }

    Ok(Some(RawRow { row, values, text }))
}

fn parse_value(
    spec: &ColumnSpec,
    token: &Token,
    decimal_separator: char,
) -> std::result::Result<Value, String> {
    let text = token.text.trim();
    if text.is_empty() {
        return Ok(Value::Missing);
    }

    match spec.quantity_type {
        QuantityType::Text => Ok(Value::Text(text.to_string())),
        QuantityType::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| format!("'{}' is not a date", text)),
        QuantityType::Numeric => {
            let number = if decimal_separator == '.' {
                text.parse::<f64>()
            } else {
                text.replace(decimal_separator, ".").parse::<f64>()
            }
            .map_err(|_| format!("'{}' is not a number", text))?;

            if !number.is_finite() || spec.void.is_some_and(|void| is_void(number, void)) {
                Ok(Value::Missing)
            } else {
                Ok(Value::Number(number))
            }
        }
    }
}

/// Voids are compared with a relative tolerance so `9.999e3` matches `9999`
pub fn is_void(value: f64, void: f64) -> bool {
    (value - void).abs() <= 1e-9 * void.abs().max(1.0)
}
