//! Record assembly: classified rows into soil layers.
//!
//! Every row covers the interval from its own depth to the next row's
//! depth; the last row covers one more step of the previous spacing. Runs
//! of rows with the same label become one [`Layer`], and layers thinner
//! than the configured minimum are merged into their most similar
//! neighbour. The result covers the full depth range without gaps.

use crate::models::{CptRow, Layer, SoilFractions, SoilLabel};
use tracing::debug;

/// Label distance used when one side is unclassified
const UNCLASSIFIED_DISTANCE: u8 = 100;

/// `[top, bottom)` interval of every sample depth
pub fn sample_intervals(depths: &[f64]) -> Vec<(f64, f64)> {
    let mut intervals = Vec::with_capacity(depths.len());
    for (index, &top) in depths.iter().enumerate() {
        let bottom = match depths.get(index + 1) {
            Some(&next) => next,
            None if index > 0 => top + (top - depths[index - 1]),
            None => top,
        };
        intervals.push((top, bottom));
    }
    intervals
}

/// Distance between two labels on the grain size scale
pub fn label_distance(a: SoilLabel, b: SoilLabel) -> u8 {
    match (a.ordinal(), b.ordinal()) {
        (Some(x), Some(y)) => x.abs_diff(y),
        (None, None) => 0,
        _ => UNCLASSIFIED_DISTANCE,
    }
}

/// Thickness-weighted mean of the compositions that are present
fn blend(parts: &[(f64, Option<SoilFractions>)]) -> Option<SoilFractions> {
    let present: Vec<(f64, SoilFractions)> = parts
        .iter()
        .filter_map(|(weight, fractions)| fractions.map(|f| (*weight, f)))
        .collect();
    if present.is_empty() {
        return None;
    }

    let total: f64 = present.iter().map(|(w, _)| w).sum();
    let combined = if total > 0.0 {
        present
            .iter()
            .fold(SoilFractions::default(), |acc, (w, f)| acc.add(&f.scaled(*w)))
    } else {
        // zero-thickness samples count equally
        present
            .iter()
            .fold(SoilFractions::default(), |acc, (_, f)| acc.add(f))
    };
    combined.normalized()
}

/// Group classified rows into layers and merge thin layers
pub fn assemble_layers(rows: &[CptRow], min_thickness: f64) -> Vec<Layer> {
    let depths: Vec<f64> = rows.iter().map(|row| row.measurement.depth).collect();
    let intervals = sample_intervals(&depths);

    let mut layers: Vec<Layer> = Vec::new();
    let mut parts: Vec<(f64, Option<SoilFractions>)> = Vec::new();

    for (row, &(top, bottom)) in rows.iter().zip(&intervals) {
        let label = row.classification.label;
        let fractions = row.classification.fractions;

        match layers.last_mut() {
            Some(layer) if layer.label == label => {
                layer.depth_bottom = bottom;
                parts.push((bottom - top, fractions));
            }
            _ => {
                if let Some(layer) = layers.last_mut() {
                    layer.fractions = blend(&parts);
                }
                parts.clear();
                parts.push((bottom - top, fractions));
                layers.push(Layer {
                    depth_top: top,
                    depth_bottom: bottom,
                    label,
                    fractions: None,
                    soil_code: None,
                    remarks: Vec::new(),
                });
            }
        }
    }
    if let Some(layer) = layers.last_mut() {
        layer.fractions = blend(&parts);
    }

    let runs = layers.len();
    let layers = merge_thin_layers(layers, min_thickness);
    debug!(
        "Assembled {} rows into {} runs, {} layers after merging",
        rows.len(),
        runs,
        layers.len()
    );
    layers
}

/// Merge layers thinner than `min_thickness` into a neighbour.
///
/// The thinnest layer is resolved first, the uppermost one on ties. It is
/// absorbed by the neighbour with the nearest label, the one above on ties.
/// Neighbours that end up with the same label are coalesced after every
/// merge.
pub fn merge_thin_layers(mut layers: Vec<Layer>, min_thickness: f64) -> Vec<Layer> {
    coalesce(&mut layers);

    while layers.len() > 1 {
        let mut thinnest: Option<(usize, f64)> = None;
        for (index, layer) in layers.iter().enumerate() {
            let thickness = layer.thickness();
            if thickness < min_thickness && thinnest.is_none_or(|(_, t)| thickness < t) {
                thinnest = Some((index, thickness));
            }
        }
        let Some((index, _)) = thinnest else {
            break;
        };

        let label = layers[index].label;
        let above = index
            .checked_sub(1)
            .map(|i| (i, label_distance(label, layers[i].label)));
        let below = layers
            .get(index + 1)
            .map(|layer| (index + 1, label_distance(label, layer.label)));

        let target = match (above, below) {
            (Some((a, da)), Some((b, db))) => {
                if db < da {
                    b
                } else {
                    a
                }
            }
            (Some((a, _)), None) => a,
            (None, Some((b, _))) => b,
            (None, None) => break,
        };

        let thin = layers.remove(index);
        let target = if target > index { target - 1 } else { target };
        absorb(&mut layers[target], thin);
        coalesce(&mut layers);
    }

    layers
}

/// Extend `target` over `other`, keeping the label of `target`
fn absorb(target: &mut Layer, other: Layer) {
    target.fractions = blend(&[
        (target.thickness(), target.fractions),
        (other.thickness(), other.fractions),
    ]);
    target.depth_top = target.depth_top.min(other.depth_top);
    target.depth_bottom = target.depth_bottom.max(other.depth_bottom);
    target.remarks.extend(other.remarks);
}

/// Join adjacent layers with equal labels
fn coalesce(layers: &mut Vec<Layer>) {
    let mut index = 1;
    while index < layers.len() {
        if layers[index].label == layers[index - 1].label {
            let next = layers.remove(index);
            absorb(&mut layers[index - 1], next);
        } else {
            index += 1;
        }
    }
}
