//! Borehole layer rows.

use super::unit_factor;
use crate::error::PipelineWarning;
use crate::header::TableLayout;
use crate::models::{QuantityType, SemanticColumn, Value};
use crate::reader::RawTable;
use tracing::debug;

/// One borehole layer in canonical units
#[derive(Debug, Clone, PartialEq)]
pub struct BoreRow {
    pub row: usize,
    pub top: f64,
    pub bottom: f64,
    /// Values aligned with `NormalizedBore::property_columns`
    pub properties: Vec<Value>,
    /// Soil code followed by remarks
    pub text: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBore {
    pub rows: Vec<BoreRow>,
    pub property_columns: Vec<SemanticColumn>,
    pub warnings: Vec<PipelineWarning>,
}

/// Validate layer boundaries and convert properties to canonical units.
///
/// Layers need both boundaries with the top above the bottom, and tops
/// must not decrease. Overlapping layers are kept with a warning.
pub fn normalize_bore(layout: &TableLayout, table: &RawTable) -> NormalizedBore {
    let mut warnings = table.warnings.clone();

    let (Some(top_spec), Some(bottom_spec)) = (
        layout.find(&SemanticColumn::DepthTop),
        layout.find(&SemanticColumn::DepthBottom),
    ) else {
        return NormalizedBore {
            rows: Vec::new(),
            property_columns: Vec::new(),
            warnings,
        };
    };
    let top_factor = unit_factor(top_spec);
    let bottom_factor = unit_factor(bottom_spec);

    let properties: Vec<_> = layout
        .columns
        .iter()
        .filter(|spec| {
            spec.enabled
                && spec.column != SemanticColumn::DepthTop
                && spec.column != SemanticColumn::DepthBottom
        })
        .map(|spec| {
            let factor = match spec.quantity_type {
                QuantityType::Numeric => unit_factor(spec),
                _ => 1.0,
            };
            (spec, factor)
        })
        .collect();

    let mut rows: Vec<BoreRow> = Vec::with_capacity(table.rows.len());
    for raw in &table.rows {
        let top = raw.number(top_spec).map(|v| v * top_factor);
        let bottom = raw.number(bottom_spec).map(|v| v * bottom_factor);

        let (Some(top), Some(bottom)) = (top, bottom) else {
            warnings.push(PipelineWarning::RowSkipped {
                row: raw.row,
                reason: "layer boundary missing".to_string(),
            });
            continue;
        };
        if bottom < top {
            warnings.push(PipelineWarning::RowSkipped {
                row: raw.row,
                reason: format!("lower boundary {} above upper boundary {}", bottom, top),
            });
            continue;
        }

        if let Some(previous) = rows.last() {
            if top < previous.top {
                warnings.push(PipelineWarning::NonMonotonicDepth {
                    row: raw.row,
                    depth: top,
                    previous: previous.top,
                });
                continue;
            }
            if top < previous.bottom - 1e-9 {
                warnings.push(PipelineWarning::OverlappingLayers {
                    row: raw.row,
                    top,
                    previous_bottom: previous.bottom,
                });
            }
        }

        let values = properties
            .iter()
            .map(|(spec, factor)| match raw.values.get(spec.index) {
                Some(Value::Number(v)) => Value::Number(v * factor),
                Some(other) => other.clone(),
                None => Value::Missing,
            })
            .collect();

        rows.push(BoreRow {
            row: raw.row,
            top,
            bottom,
            properties: values,
            text: raw.text.clone(),
        });
    }

    debug!("Normalised {} borehole layers", rows.len());

    NormalizedBore {
        rows,
        property_columns: properties.iter().map(|(spec, _)| spec.column.clone()).collect(),
        warnings,
    }
}
