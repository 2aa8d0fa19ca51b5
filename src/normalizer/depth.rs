//! Depth derivation and monotonicity.

use crate::error::PipelineWarning;

/// Depths closer than this are treated as equal
const DEPTH_TOLERANCE: f64 = 1e-9;

/// Resultant inclination from the north-south and east-west components,
/// all in degrees. A missing component counts as zero.
pub fn resultant_inclination(ns: Option<f64>, ew: Option<f64>) -> Option<f64> {
    if ns.is_none() && ew.is_none() {
        return None;
    }
    let tan_ns = ns.unwrap_or(0.0).to_radians().tan();
    let tan_ew = ew.unwrap_or(0.0).to_radians().tan();
    Some(tan_ns.hypot(tan_ew).atan().to_degrees())
}

/// Depth below the surface for every row.
///
/// The first depth equals the first penetration length; each following
/// depth adds the penetration increment projected on the vertical by the
/// inclination of that row. Missing inclinations count as vertical.
/// Rows without a penetration length get no depth and do not advance the
/// accumulation. Every other row does, including rows that
/// [`monotonic_rows`] later drops, so a cone that moves back before going
/// on ends at the projection of its net penetration.
pub fn depth_from_inclination(
    penetration: &[Option<f64>],
    inclination: &[Option<f64>],
) -> Vec<Option<f64>> {
    let mut depths = Vec::with_capacity(penetration.len());
    let mut last: Option<(f64, f64)> = None;

    for (index, length) in penetration.iter().enumerate() {
        let Some(length) = length.map(f64::abs) else {
            depths.push(None);
            continue;
        };
        let depth = match last {
            None => length,
            Some((previous_length, previous_depth)) => {
                let angle = inclination
                    .get(index)
                    .copied()
                    .flatten()
                    .unwrap_or(0.0)
                    .to_radians();
                previous_depth + angle.cos() * (length - previous_length)
            }
        };
        last = Some((length, depth));
        depths.push(Some(depth));
    }

    depths
}

/// Which rows survive the non-decreasing depth check.
///
/// A depth equal to the last kept depth is a duplicate and dropped, keeping
/// the first occurrence; a smaller depth is dropped as non-monotonic; a row
/// without depth is skipped. Every dropped row yields a warning.
pub fn monotonic_rows(depths: &[Option<f64>], rows: &[usize]) -> (Vec<bool>, Vec<PipelineWarning>) {
    let mut keep = Vec::with_capacity(depths.len());
    let mut warnings = Vec::new();
    let mut previous: Option<f64> = None;

    for (depth, &row) in depths.iter().zip(rows) {
        let Some(depth) = *depth else {
            warnings.push(PipelineWarning::RowSkipped {
                row,
                reason: "no penetration length or depth".to_string(),
            });
            keep.push(false);
            continue;
        };

        match previous {
            Some(last) if (depth - last).abs() <= DEPTH_TOLERANCE => {
                warnings.push(PipelineWarning::DuplicateDepth { row, depth });
                keep.push(false);
            }
            Some(last) if depth < last => {
                warnings.push(PipelineWarning::NonMonotonicDepth {
                    row,
                    depth,
                    previous: last,
                });
                keep.push(false);
            }
            _ => {
                previous = Some(depth);
                keep.push(true);
            }
        }
    }

    (keep, warnings)
}
