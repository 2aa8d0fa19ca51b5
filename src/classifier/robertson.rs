//! Robertson soil behaviour type chart.

use crate::constants::{fraction_anchor, ic_boundary, unit_weight as gamma};
use crate::error::UndefinedReason;
use crate::models::{Ratio, SoilFractions, SoilLabel};

/// Soil behaviour type index
/// Ic = sqrt((3.47 - log10 Q)^2 + (log10 F + 1.22)^2)
pub fn behaviour_index(q: f64, f: f64) -> Ratio {
    if !q.is_finite() || !f.is_finite() {
        return Ratio::Undefined(UndefinedReason::NonFinite);
    }
    if q <= 0.0 || f <= 0.0 {
        return Ratio::Undefined(UndefinedReason::OutOfRange);
    }
    let a = 3.47 - q.log10();
    let b = f.log10() + 1.22;
    Ratio::finite(a.hypot(b))
}

/// Robertson zone of an Ic value; a value on a boundary takes the lower zone
pub fn zone(ic: f64) -> u8 {
    if ic >= ic_boundary::ORGANIC {
        2
    } else if ic >= ic_boundary::CLAY {
        3
    } else if ic >= ic_boundary::SILT_MIXTURE {
        4
    } else if ic >= ic_boundary::SAND_MIXTURE {
        5
    } else if ic >= ic_boundary::SAND {
        6
    } else {
        7
    }
}

pub fn zone_label(zone: u8) -> SoilLabel {
    match zone {
        2 => SoilLabel::Peat,
        3 => SoilLabel::Clay,
        4 => SoilLabel::ClayeySilt,
        5 => SoilLabel::SiltySand,
        6 => SoilLabel::Sand,
        7 => SoilLabel::Gravel,
        _ => SoilLabel::Unclassified,
    }
}

/// Soil fractions interpolated between the two pure soils whose anchors
/// enclose `ic`. Values beyond the outer anchors are pure gravel or peat.
pub fn fractions_from_ic(ic: f64) -> SoilFractions {
    let anchors = [
        (fraction_anchor::GRAVEL, SoilLabel::Gravel),
        (fraction_anchor::SAND, SoilLabel::Sand),
        (fraction_anchor::SILT, SoilLabel::Silt),
        (fraction_anchor::CLAY, SoilLabel::Clay),
        (fraction_anchor::PEAT, SoilLabel::Peat),
    ];

    let mut fractions = SoilFractions::default();
    if ic <= anchors[0].0 {
        set(&mut fractions, anchors[0].1, 1.0);
        return fractions;
    }
    for pair in anchors.windows(2) {
        let ((lower, coarse), (upper, fine)) = (pair[0], pair[1]);
        if ic <= upper {
            let share = (ic - lower) / (upper - lower);
            set(&mut fractions, coarse, 1.0 - share);
            set(&mut fractions, fine, share);
            return fractions;
        }
    }
    set(&mut fractions, SoilLabel::Peat, 1.0);
    fractions
}

fn set(fractions: &mut SoilFractions, label: SoilLabel, share: f64) {
    match label {
        SoilLabel::Gravel => fractions.gravel = share,
        SoilLabel::Sand => fractions.sand = share,
        SoilLabel::Silt => fractions.silt = share,
        SoilLabel::Clay => fractions.clay = share,
        SoilLabel::Peat => fractions.peat = share,
        _ => {}
    }
}

/// Unit weight in kN/m3 estimated from Ic and the position of the sample
/// relative to the water table
pub fn unit_weight(ic: f64, below_water: bool) -> f64 {
    if ic > gamma::IC_ORGANIC {
        gamma::ORGANIC
    } else if ic > gamma::IC_CLAY {
        gamma::CLAY
    } else if !below_water {
        gamma::DRY_GRANULAR
    } else if ic <= gamma::IC_GRAVEL {
        gamma::WET_GRAVEL
    } else if ic <= gamma::IC_SAND {
        gamma::WET_SAND
    } else {
        gamma::WET_SILTY_SAND
    }
}

/// Stress exponent n = 0.381 Ic + 0.05 sigma'_v0 / pa - 0.15, within [0, 1]
pub fn stress_exponent(ic: f64, effective_stress: f64, atmospheric_pressure: f64) -> f64 {
    (0.381 * ic + 0.05 * effective_stress / atmospheric_pressure - 0.15).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behaviour_index() {
        // log10 Q = 3.47 and log10 F = -1.22 put the point on the chart origin
        let ic = behaviour_index(10f64.powf(3.47), 10f64.powf(-1.22)).value().unwrap();
        assert!(ic.abs() < 1e-9);

        let ic = behaviour_index(10.0, 1.0).value().unwrap();
        let expected = (2.47f64.powi(2) + 1.22f64.powi(2)).sqrt();
        assert!((ic - expected).abs() < 1e-12);
    }

    #[test]
    fn test_behaviour_index_rejects_chart_inputs_outside_domain() {
        assert_eq!(
            behaviour_index(0.0, 1.0),
            Ratio::Undefined(UndefinedReason::OutOfRange)
        );
        assert_eq!(
            behaviour_index(10.0, -0.5),
            Ratio::Undefined(UndefinedReason::OutOfRange)
        );
        assert_eq!(
            behaviour_index(f64::NAN, 1.0),
            Ratio::Undefined(UndefinedReason::NonFinite)
        );
    }

    #[test]
    fn test_zone_boundaries_belong_to_lower_zone() {
        assert_eq!(zone(3.60), 2);
        assert_eq!(zone(3.59), 3);
        assert_eq!(zone(2.95), 3);
        assert_eq!(zone(2.60), 4);
        assert_eq!(zone(2.05), 5);
        assert_eq!(zone(1.31), 6);
        assert_eq!(zone(1.30), 7);
        assert_eq!(zone_label(zone(3.0)), SoilLabel::Clay);
        assert_eq!(zone_label(1), SoilLabel::Unclassified);
    }

    #[test]
    fn test_fractions_blend_between_anchors() {
        let pure_sand = fractions_from_ic(fraction_anchor::SAND);
        assert!((pure_sand.sand - 1.0).abs() < 1e-12);

        let mixed = fractions_from_ic((fraction_anchor::SILT + fraction_anchor::CLAY) / 2.0);
        assert!((mixed.silt - 0.5).abs() < 1e-9);
        assert!((mixed.clay - 0.5).abs() < 1e-9);
        assert!(mixed.is_normalized());

        assert_eq!(fractions_from_ic(0.5).gravel, 1.0);
        assert_eq!(fractions_from_ic(4.5).peat, 1.0);
    }

    #[test]
    fn test_unit_weight_bands() {
        assert_eq!(unit_weight(3.5, true), 11.0);
        assert_eq!(unit_weight(3.0, false), 16.0);
        assert_eq!(unit_weight(2.0, false), 18.0);
        assert_eq!(unit_weight(1.5, true), 20.0);
        assert_eq!(unit_weight(2.2, true), 19.0);
        assert_eq!(unit_weight(2.6, true), 18.0);
    }

    #[test]
    fn test_stress_exponent_is_clamped() {
        assert_eq!(stress_exponent(4.0, 0.2, 0.1), 1.0);
        assert_eq!(stress_exponent(0.1, 0.0, 0.1), 0.0);
        let n = stress_exponent(2.0, 0.1, 0.1);
        assert!((n - (0.762 + 0.05 - 0.15)).abs() < 1e-12);
    }
}
