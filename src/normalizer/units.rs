//! Unit conversion to the canonical units of the pipeline.
//!
//! Stresses are carried in MPa, lengths in m, angles in degrees and
//! time in seconds.

use crate::models::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Stress,
    Length,
    Angle,
    Time,
    Ratio,
}

/// Dimension and the factor to that dimension's canonical unit
fn scale(unit: &Unit) -> Option<(Dimension, f64)> {
    let scale = match unit {
        Unit::Megapascal => (Dimension::Stress, 1.0),
        Unit::Kilopascal => (Dimension::Stress, 1e-3),
        Unit::Pascal => (Dimension::Stress, 1e-6),
        Unit::Metre => (Dimension::Length, 1.0),
        Unit::Centimetre => (Dimension::Length, 1e-2),
        Unit::Millimetre => (Dimension::Length, 1e-3),
        Unit::Degree => (Dimension::Angle, 1.0),
        Unit::Radian => (Dimension::Angle, 180.0 / std::f64::consts::PI),
        Unit::Second => (Dimension::Time, 1.0),
        Unit::Minute => (Dimension::Time, 60.0),
        Unit::Percent => (Dimension::Ratio, 1.0),
        Unit::Unitless | Unit::Other(_) => return None,
    };
    Some(scale)
}

/// Multiplier converting values in `from` to `to`; `None` when the units
/// measure different quantities or either is unknown
pub fn conversion_factor(from: &Unit, to: &Unit) -> Option<f64> {
    if from == to {
        return Some(1.0);
    }
    let (from_dimension, from_scale) = scale(from)?;
    let (to_dimension, to_scale) = scale(to)?;
    (from_dimension == to_dimension).then(|| from_scale / to_scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stress_conversion() {
        assert_eq!(
            conversion_factor(&Unit::Kilopascal, &Unit::Megapascal),
            Some(1e-3)
        );
        assert_eq!(conversion_factor(&Unit::Megapascal, &Unit::Megapascal), Some(1.0));
    }

    #[test]
    fn test_length_and_angle_conversion() {
        assert_eq!(conversion_factor(&Unit::Centimetre, &Unit::Metre), Some(0.01));
        let factor = conversion_factor(&Unit::Radian, &Unit::Degree).unwrap();
        assert!((factor * std::f64::consts::FRAC_PI_2 - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_incompatible_units() {
        assert_eq!(conversion_factor(&Unit::Metre, &Unit::Megapascal), None);
        assert_eq!(
            conversion_factor(&Unit::Other("S/m".into()), &Unit::Megapascal),
            None
        );
    }
}
