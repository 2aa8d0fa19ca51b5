//! Column layout resolution.
//!
//! Turns the column declarations of a header into [`ColumnSpec`]s and the
//! separators the data block is written with. Missing or contradictory
//! declarations are rejected here, before any data row is read.

use super::HeaderBlock;
use crate::config::PipelineConfig;
use crate::constants::{
    BRO_DEFAULT_VOID, GEF_DEFAULT_VOID, bro_parameter, bro_parameter_unit, gef_bore_quantity,
    gef_cpt_quantity,
};
use crate::error::{GefError, Result};
use crate::models::{ColumnSpec, Dialect, QuantityType, SemanticColumn, TestType, Unit};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// How the data block of one file is laid out
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub test_type: TestType,
    pub columns: Vec<ColumnSpec>,
    /// `None` means tokens are separated by runs of whitespace
    pub column_separator: Option<char>,
    /// `None` means one record per line
    pub record_separator: Option<char>,
    pub decimal_separator: char,
    /// Rows may carry quoted text tokens after the declared columns
    pub trailing_text: bool,
}

impl TableLayout {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn find(&self, column: &SemanticColumn) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|spec| spec.enabled && &spec.column == column)
    }

    pub fn has(&self, column: &SemanticColumn) -> bool {
        self.find(column).is_some()
    }
}

/// Build the table layout of `header` for a record of type `test_type`
pub fn resolve_layout(
    header: &HeaderBlock,
    test_type: TestType,
    config: &PipelineConfig,
) -> Result<TableLayout> {
    let layout = match (header.dialect, test_type) {
        (Dialect::Gef, _) => gef_layout(header, test_type, config)?,
        (Dialect::BroXml, TestType::Cpt) => bro_cpt_layout(header, config)?,
        (Dialect::BroXml, TestType::Bore) => bro_bore_layout(config),
    };

    check_required_columns(&layout)?;

    debug!(
        "Resolved {} columns ({} enabled), column separator {:?}, record separator {:?}",
        layout.columns.len(),
        layout.columns.iter().filter(|c| c.enabled).count(),
        layout.column_separator,
        layout.record_separator
    );

    Ok(layout)
}

fn gef_layout(
    header: &HeaderBlock,
    test_type: TestType,
    config: &PipelineConfig,
) -> Result<TableLayout> {
    let column_field = header
        .get("COLUMN")
        .ok_or_else(|| GefError::malformed_header("missing #COLUMN declaration"))?;
    let count = column_field
        .value_at(0)
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .ok_or_else(|| {
            GefError::malformed_header_at(
                format!("invalid column count '{}'", column_field.value.trim()),
                column_field.line,
            )
        })?;

    let mut infos: BTreeMap<usize, (String, String, Option<u32>)> = BTreeMap::new();
    for field in header.get_all("COLUMNINFO") {
        let index = field
            .value_at(0)
            .and_then(|v| v.parse::<usize>().ok())
            .ok_or_else(|| {
                GefError::malformed_header_at("#COLUMNINFO without a column number", field.line)
            })?;
        let unit = field.value_at(1).unwrap_or("-").to_string();
        let description = field.value_at(2).unwrap_or_default().to_string();
        let quantity = field.value_at(3).and_then(|v| v.parse::<u32>().ok());

        if infos.insert(index, (unit, description, quantity)).is_some() {
            return Err(GefError::malformed_header_at(
                format!("column {} is declared twice", index),
                field.line,
            ));
        }
    }

    if infos.is_empty() {
        return Err(GefError::malformed_header(
            "missing #COLUMNINFO declarations",
        ));
    }
    if infos.len() != count || infos.keys().copied().ne(1..=count) {
        return Err(GefError::malformed_header_at(
            format!(
                "#COLUMN declares {} columns but #COLUMNINFO describes columns {:?}",
                count,
                infos.keys().collect::<Vec<_>>()
            ),
            column_field.line,
        ));
    }

    let mut voids: BTreeMap<usize, f64> = BTreeMap::new();
    for field in header.get_all("COLUMNVOID") {
        match (
            field.value_at(0).and_then(|v| v.parse::<usize>().ok()),
            field.number_at(1),
        ) {
            (Some(index), Some(void)) => {
                voids.insert(index, void);
            }
            _ => {
                return Err(GefError::malformed_header_at(
                    format!("invalid #COLUMNVOID '{}'", field.value.trim()),
                    field.line,
                ));
            }
        }
    }

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(count);
    for (index, (raw_unit, description, quantity)) in infos {
        let known = quantity.and_then(|q| match test_type {
            TestType::Cpt => gef_cpt_quantity(q),
            TestType::Bore => gef_bore_quantity(q),
        });
        let column = match known {
            Some(column) if seen.insert(column.clone()) => column,
            _ => {
                let mut name = extra_name(&description, index);
                if columns.iter().any(|c: &ColumnSpec| c.column.name() == name) {
                    name = format!("{}_{}", name, index);
                }
                SemanticColumn::Extra(name)
            }
        };

        columns.push(ColumnSpec {
            index: index - 1,
            unit: unit_for(&column, &raw_unit, config),
            quantity_type: quantity_type(&raw_unit),
            void: Some(
                config
                    .missing_value
                    .unwrap_or_else(|| voids.get(&index).copied().unwrap_or(GEF_DEFAULT_VOID)),
            ),
            enabled: true,
            raw_unit,
            column,
        });
    }

    Ok(TableLayout {
        test_type,
        columns,
        column_separator: separator(header.get("COLUMNSEPARATOR").map(|f| f.value.as_str())),
        record_separator: separator(header.get("RECORDSEPARATOR").map(|f| f.value.as_str())),
        decimal_separator: '.',
        trailing_text: test_type == TestType::Bore,
    })
}

fn bro_cpt_layout(header: &HeaderBlock, config: &PipelineConfig) -> Result<TableLayout> {
    let mut columns = Vec::new();
    for field in header
        .fields
        .iter()
        .filter(|f| f.key.starts_with("parameters/"))
    {
        let name = &field.key["parameters/".len()..];
        let column =
            bro_parameter(name).unwrap_or_else(|| SemanticColumn::Extra(name.to_string()));
        let raw_unit = bro_parameter_unit(&column).to_string();
        let enabled = matches!(
            field.value.trim().to_ascii_lowercase().as_str(),
            "ja" | "true"
        );

        columns.push(ColumnSpec {
            index: columns.len(),
            unit: unit_for(&column, &raw_unit, config),
            quantity_type: QuantityType::Numeric,
            void: Some(config.missing_value.unwrap_or(BRO_DEFAULT_VOID)),
            enabled,
            raw_unit,
            column,
        });
    }

    if columns.is_empty() {
        return Err(GefError::malformed_header(
            "CPT document declares no parameters",
        ));
    }
    if !columns.iter().any(|c| c.enabled) {
        return Err(GefError::malformed_header(
            "CPT document selects none of its parameters",
        ));
    }

    let token = header
        .get("tokenSeparator")
        .ok_or_else(|| GefError::malformed_header("missing TextEncoding tokenSeparator"))?;
    let block = header
        .get("blockSeparator")
        .ok_or_else(|| GefError::malformed_header("missing TextEncoding blockSeparator"))?;
    let decimal_separator = header
        .get("decimalSeparator")
        .and_then(|f| f.value.chars().next())
        .unwrap_or('.');

    Ok(TableLayout {
        test_type: TestType::Cpt,
        columns,
        column_separator: token.value.chars().next(),
        record_separator: block.value.chars().next(),
        decimal_separator,
        trailing_text: false,
    })
}

/// Fixed layout of the rows synthesised from BHR-GT layers
fn bro_bore_layout(config: &PipelineConfig) -> TableLayout {
    let columns = [SemanticColumn::DepthTop, SemanticColumn::DepthBottom]
        .into_iter()
        .enumerate()
        .map(|(index, column)| ColumnSpec {
            index,
            unit: unit_for(&column, "m", config),
            raw_unit: "m".to_string(),
            quantity_type: QuantityType::Numeric,
            void: Some(config.missing_value.unwrap_or(BRO_DEFAULT_VOID)),
            enabled: true,
            column,
        })
        .collect();

    TableLayout {
        test_type: TestType::Bore,
        columns,
        column_separator: Some(';'),
        record_separator: None,
        decimal_separator: '.',
        trailing_text: true,
    }
}

fn check_required_columns(layout: &TableLayout) -> Result<()> {
    match layout.test_type {
        TestType::Cpt => {
            if !layout.has(&SemanticColumn::PenetrationLength)
                && !layout.has(&SemanticColumn::CorrectedDepth)
            {
                return Err(GefError::malformed_header(
                    "no penetration length or depth column declared",
                ));
            }
        }
        TestType::Bore => {
            if !layout.has(&SemanticColumn::DepthTop) || !layout.has(&SemanticColumn::DepthBottom)
            {
                return Err(GefError::malformed_header(
                    "borehole layers need both an upper and a lower boundary column",
                ));
            }
        }
    }
    Ok(())
}

fn unit_for(column: &SemanticColumn, raw_unit: &str, config: &PipelineConfig) -> Unit {
    config
        .unit_overrides
        .get(column)
        .cloned()
        .unwrap_or_else(|| Unit::parse(raw_unit))
}

fn quantity_type(raw_unit: &str) -> QuantityType {
    match raw_unit.trim().to_ascii_lowercase().as_str() {
        "date" | "yyyy-mm-dd" => QuantityType::Date,
        "text" | "string" => QuantityType::Text,
        _ => QuantityType::Numeric,
    }
}

fn extra_name(description: &str, index: usize) -> String {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        format!("column{}", index)
    } else {
        trimmed.to_string()
    }
}

/// First non-blank character of a separator declaration
fn separator(raw: Option<&str>) -> Option<char> {
    raw.and_then(|value| value.trim().chars().next())
}
