//! Column normalisation.
//!
//! Resolves the semantic columns of a raw table once, converts values to
//! canonical units, applies the missing value policy and pre-excavation,
//! derives depth and elevation and enforces non-decreasing depth.

mod bore;
mod depth;
mod missing;
mod units;


pub use bore::{BoreRow, NormalizedBore, normalize_bore};
pub use depth::{depth_from_inclination, monotonic_rows, resultant_inclination};
pub use missing::interpolate_gaps;
pub use units::conversion_factor;

use crate::config::{MissingValuePolicy, PipelineConfig};
use crate::error::PipelineWarning;
use crate::header::TableLayout;
use crate::models::{
    ColumnSpec, Measurement, QuantityType, SemanticColumn, SiteMetadata, Unit, Value,
};
use crate::reader::RawTable;
use std::collections::HashMap;
use tracing::{debug, warn};

/// CPT measurements in depth order
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCpt {
    pub measurements: Vec<Measurement>,
    /// Columns stored in `Measurement::extras`
    pub extra_columns: Vec<SemanticColumn>,
    pub warnings: Vec<PipelineWarning>,
}

/// Enabled columns as value vectors in canonical units
struct ColumnData {
    rows: Vec<usize>,
    numeric: HashMap<SemanticColumn, Vec<Option<f64>>>,
    other: HashMap<SemanticColumn, Vec<Value>>,
}

impl ColumnData {
    fn numbers(&self, column: &SemanticColumn) -> Option<&[Option<f64>]> {
        self.numeric.get(column).map(Vec::as_slice)
    }

    fn value_at(&self, column: &SemanticColumn, index: usize) -> Option<f64> {
        self.numeric
            .get(column)
            .and_then(|values| values.get(index).copied().flatten())
    }

    fn retain(&mut self, keep: &[bool]) {
        fn filter<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut flags = keep.iter();
            values.retain(|_| flags.next().copied().unwrap_or(false));
        }
        filter(&mut self.rows, keep);
        for values in self.numeric.values_mut() {
            filter(values, keep);
        }
        for values in self.other.values_mut() {
            filter(values, keep);
        }
    }
}

/// Turn a raw CPT table into normalised measurements
pub fn normalize_cpt(
    layout: &TableLayout,
    table: &RawTable,
    metadata: &SiteMetadata,
    config: &PipelineConfig,
) -> NormalizedCpt {
    let mut warnings = table.warnings.clone();
    let mut data = collect_columns(layout, table);

    if config.missing_value_policy == MissingValuePolicy::Interpolate {
        let mut filled = 0;
        for values in data.numeric.values_mut() {
            filled += interpolate_gaps(values);
        }
        debug!("Interpolated {} missing values", filled);
    }

    if config.apply_pre_excavation {
        apply_pre_excavation(&mut data, metadata);
    }

    let inclination = inclination_series(&data, metadata);
    let depths = derive_depths(&data, &inclination);

    let (keep, depth_warnings) = monotonic_rows(&depths, &data.rows);
    warnings.extend(depth_warnings);

    let extra_columns: Vec<SemanticColumn> = layout
        .columns
        .iter()
        .filter(|spec| spec.enabled && !Measurement::has_field(&spec.column))
        .map(|spec| spec.column.clone())
        .collect();

    let mut measurements = Vec::with_capacity(data.rows.len());
    for (index, &row) in data.rows.iter().enumerate() {
        let (true, Some(depth)) = (keep[index], depths[index]) else {
            continue;
        };
        let field = |column: SemanticColumn| data.value_at(&column, index);

        let extras = extra_columns
            .iter()
            .map(|column| match data.other.get(column) {
                Some(values) => values[index].clone(),
                None => data
                    .value_at(column, index)
                    .map(Value::Number)
                    .unwrap_or(Value::Missing),
            })
            .collect();

        measurements.push(Measurement {
            row,
            depth,
            penetration_length: field(SemanticColumn::PenetrationLength),
            elevation: metadata.ground_level.map(|level| level - depth),
            cone_resistance: field(SemanticColumn::ConeResistance),
            local_friction: field(SemanticColumn::LocalFriction),
            friction_ratio: field(SemanticColumn::FrictionRatio),
            pore_pressure_u1: field(SemanticColumn::PorePressureU1),
            pore_pressure_u2: field(SemanticColumn::PorePressureU2),
            pore_pressure_u3: field(SemanticColumn::PorePressureU3),
            corrected_cone_resistance: field(SemanticColumn::CorrectedConeResistance),
            inclination: inclination.get(index).copied().flatten(),
            elapsed_time: field(SemanticColumn::ElapsedTime),
            extras,
        });
    }

    debug!(
        "Normalised {} of {} rows, {} warnings",
        measurements.len(),
        data.rows.len(),
        warnings.len()
    );

    NormalizedCpt {
        measurements,
        extra_columns,
        warnings,
    }
}

/// Gather enabled columns by semantic name, converted to canonical units
fn collect_columns(layout: &TableLayout, table: &RawTable) -> ColumnData {
    let mut data = ColumnData {
        rows: table.rows.iter().map(|r| r.row).collect(),
        numeric: HashMap::new(),
        other: HashMap::new(),
    };

    for spec in layout.columns.iter().filter(|spec| spec.enabled) {
        if spec.quantity_type != QuantityType::Numeric {
            let values = table
                .rows
                .iter()
                .map(|r| r.values.get(spec.index).cloned().unwrap_or(Value::Missing))
                .collect();
            data.other.insert(spec.column.clone(), values);
            continue;
        }

        let factor = unit_factor(spec);
        let values = table
            .rows
            .iter()
            .map(|r| r.number(spec).map(|v| v * factor))
            .collect();
        data.numeric.insert(spec.column.clone(), values);
    }

    data
}

/// Factor to the canonical unit; unconvertible units are left as read
pub(crate) fn unit_factor(spec: &ColumnSpec) -> f64 {
    let canonical = spec.column.canonical_unit();
    if canonical == Unit::Unitless {
        return 1.0;
    }
    match conversion_factor(&spec.unit, &canonical) {
        Some(factor) => factor,
        None => {
            warn!(
                "Cannot convert column '{}' from '{}' to {:?}; values are kept as read",
                spec.column, spec.raw_unit, canonical
            );
            1.0
        }
    }
}

/// Drop samples shallower than the pre-excavated depth
fn apply_pre_excavation(data: &mut ColumnData, metadata: &SiteMetadata) {
    let Some(limit) = metadata.pre_excavated_depth.filter(|d| *d > 0.0) else {
        return;
    };
    let Some(penetration) = data.numbers(&SemanticColumn::PenetrationLength) else {
        return;
    };

    let keep: Vec<bool> = penetration
        .iter()
        .map(|length| length.is_none_or(|l| l.abs() >= limit))
        .collect();
    let removed = keep.iter().filter(|k| !**k).count();
    if removed > 0 {
        debug!(
            "Removed {} rows above the pre-excavated depth of {} m",
            removed, limit
        );
        data.retain(&keep);
    }
}

/// Resultant inclination per row, if the cone measured any
fn inclination_series(data: &ColumnData, metadata: &SiteMetadata) -> Vec<Option<f64>> {
    if metadata.inclination_present == Some(false) {
        return vec![None; data.rows.len()];
    }
    if let Some(resultant) = data.numbers(&SemanticColumn::Inclination) {
        return resultant.to_vec();
    }

    let pairs = [
        (SemanticColumn::InclinationNs, SemanticColumn::InclinationEw),
        (SemanticColumn::InclinationX, SemanticColumn::InclinationY),
    ];
    for (first, second) in pairs {
        let a = data.numbers(&first);
        let b = data.numbers(&second);
        if a.is_some() || b.is_some() {
            return (0..data.rows.len())
                .map(|i| {
                    resultant_inclination(
                        a.and_then(|v| v[i]),
                        b.and_then(|v| v[i]),
                    )
                })
                .collect();
        }
    }

    vec![None; data.rows.len()]
}

fn derive_depths(data: &ColumnData, inclination: &[Option<f64>]) -> Vec<Option<f64>> {
    if let Some(corrected) = data.numbers(&SemanticColumn::CorrectedDepth) {
        return corrected.iter().map(|d| d.map(f64::abs)).collect();
    }
    match data.numbers(&SemanticColumn::PenetrationLength) {
        Some(penetration) if inclination.iter().any(Option::is_some) => {
            depth_from_inclination(penetration, inclination)
        }
        Some(penetration) => penetration.iter().map(|l| l.map(f64::abs)).collect(),
        None => vec![None; data.rows.len()],
    }
}
