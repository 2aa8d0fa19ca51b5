//! Been & Jefferies soil type chart.
//!
//! Uses the same normalised cone resistance and friction ratio as the 1990
//! Robertson chart, with the pore pressure ratio Bq folded into Q.

use crate::constants::bj_boundary;
use crate::error::UndefinedReason;
use crate::models::Ratio;

/// Soil type index
/// Ic = sqrt((3 - log10(Q (1 - Bq) + 1))^2 + (1.5 + 1.3 log10 F)^2)
pub fn bj_behaviour_index(q: f64, f: f64, bq: f64) -> Ratio {
    if !q.is_finite() || !f.is_finite() || !bq.is_finite() {
        return Ratio::Undefined(UndefinedReason::NonFinite);
    }
    let shifted = q * (1.0 - bq) + 1.0;
    if shifted <= 0.0 || f <= 0.0 {
        return Ratio::Undefined(UndefinedReason::OutOfRange);
    }
    let a = 3.0 - shifted.log10();
    let b = 1.5 + 1.3 * f.log10();
    Ratio::finite(a.hypot(b))
}

/// Zone of a Been & Jefferies index, numbered like the Robertson zones so
/// both charts share [`zone_label`](super::zone_label)
pub fn bj_zone(ic: f64) -> u8 {
    if ic >= bj_boundary::ORGANIC {
        2
    } else if ic >= bj_boundary::CLAY {
        3
    } else if ic >= bj_boundary::SILT_MIXTURE {
        4
    } else if ic >= bj_boundary::SAND_MIXTURE {
        5
    } else if ic >= bj_boundary::SAND {
        6
    } else {
        7
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::zone_label;
    use crate::models::SoilLabel;

    #[test]
    fn test_index_of_known_points() {
        let cases = [
            (28.982146, 0.5, 2.1224830270720094),
            (24.709059, 1.0, 2.4006807734341495),
            (22.507572, 4.0, 2.977470281698126),
        ];
        for (q, f, expected) in cases {
            let ic = bj_behaviour_index(q, f, 0.5).value().unwrap();
            assert!((ic - expected).abs() < 1e-6, "{q} {f}: {ic}");
        }
    }

    #[test]
    fn test_index_outside_domain() {
        // Q (1 - Bq) + 1 <= 0
        assert_eq!(
            bj_behaviour_index(1.0, 1.0, 3.0),
            Ratio::Undefined(UndefinedReason::OutOfRange)
        );
        assert_eq!(
            bj_behaviour_index(10.0, 0.0, 0.1),
            Ratio::Undefined(UndefinedReason::OutOfRange)
        );
        assert_eq!(
            bj_behaviour_index(10.0, 1.0, f64::INFINITY),
            Ratio::Undefined(UndefinedReason::NonFinite)
        );
    }

    #[test]
    fn test_zone_boundaries_belong_to_lower_zone() {
        assert_eq!(bj_zone(3.22), 2);
        assert_eq!(bj_zone(3.21), 3);
        assert_eq!(bj_zone(2.76), 3);
        assert_eq!(bj_zone(2.75), 4);
        assert_eq!(bj_zone(2.40), 4);
        assert_eq!(bj_zone(1.80), 5);
        assert_eq!(bj_zone(1.25), 6);
        assert_eq!(bj_zone(1.24), 7);

        assert_eq!(zone_label(bj_zone(3.5)), SoilLabel::Peat);
        assert_eq!(zone_label(bj_zone(2.5)), SoilLabel::ClayeySilt);
        assert_eq!(zone_label(bj_zone(2.0)), SoilLabel::SiltySand);
        assert_eq!(zone_label(bj_zone(1.0)), SoilLabel::Gravel);
    }
}
