//! Missing value filling.

/// Fill interior gaps linearly between the nearest present neighbours.
/// Leading and trailing gaps stay missing.
pub fn interpolate_gaps(values: &mut [Option<f64>]) -> usize {
    let mut filled = 0;
    let mut previous: Option<usize> = None;

    for index in 0..values.len() {
        let Some(current) = values[index] else {
            continue;
        };
        if let Some(start) = previous {
            let gap = index - start;
            if gap > 1 {
                let Some(first) = values[start] else {
                    continue;
                };
                let step = (current - first) / gap as f64;
                for offset in 1..gap {
                    values[start + offset] = Some(first + step * offset as f64);
                    filled += 1;
                }
            }
        }
        previous = Some(index);
    }

    filled
}
