//! Derived ratios and stresses.
//!
//! Computes the friction ratio, the corrected cone resistance, the vertical
//! stress profile and the normalised ratios of the Robertson chart for every
//! measurement. A ratio whose inputs are missing, whose denominator vanishes
//! or whose result is not finite is returned as [`Ratio::Undefined`].

use crate::config::{ClassificationConfig, ClassificationMethod};
use crate::constants::RATIO_EPSILON;
use crate::error::UndefinedReason;
use crate::models::{DerivedRatios, Measurement, Ratio, SiteMetadata};

/// Friction ratio fs / qc in percent
pub fn friction_ratio(cone_resistance: Option<f64>, local_friction: Option<f64>) -> Ratio {
    let qc = match cone_resistance {
        None => return Ratio::Undefined(UndefinedReason::MissingInput),
        Some(qc) if qc <= 0.0 => return Ratio::Undefined(UndefinedReason::NonPositiveConeResistance),
        Some(qc) => qc,
    };
    match local_friction {
        Some(fs) => Ratio::finite(fs / qc * 100.0),
        None => Ratio::Undefined(UndefinedReason::MissingInput),
    }
}

/// Sleeve friction of a row, derived from the reported friction ratio
/// (fs = Rf qc / 100) when the file has no sleeve friction column
pub fn local_friction(measurement: &Measurement) -> Option<f64> {
    measurement.local_friction.or_else(|| {
        let rf = measurement.friction_ratio?;
        let qc = measurement.cone_resistance?;
        Some(rf * qc / 100.0)
    })
}

/// Cone resistance corrected for the pore pressure behind the cone:
/// qt = qc + u2 (1 - a). A measured corrected value takes precedence.
pub fn corrected_cone_resistance(measurement: &Measurement, area_quotient: Option<f64>) -> Ratio {
    let qc = match measurement.cone_resistance {
        None => return Ratio::Undefined(UndefinedReason::MissingInput),
        Some(qc) if qc <= 0.0 => return Ratio::Undefined(UndefinedReason::NonPositiveConeResistance),
        Some(qc) => qc,
    };
    if let Some(qt) = measurement.corrected_cone_resistance.filter(|qt| *qt > 0.0) {
        return Ratio::finite(qt);
    }
    match (measurement.pore_pressure_u2, area_quotient) {
        (Some(u2), Some(a)) => Ratio::finite(qc + u2 * (1.0 - a)),
        _ => Ratio::finite(qc),
    }
}

/// Total vertical stress in MPa at every depth, from unit weights in kN/m3.
///
/// The first sample carries the soil column from the surface down to its
/// depth; every following sample adds its own depth step.
pub fn vertical_stress(depths: &[f64], unit_weights: &[f64]) -> Vec<f64> {
    let mut previous_depth = 0.0;
    let mut stress = 0.0;
    depths
        .iter()
        .zip(unit_weights)
        .map(|(&depth, &gamma)| {
            stress += gamma * (depth - previous_depth) / 1000.0;
            previous_depth = depth;
            stress
        })
        .collect()
}

/// Hydrostatic pore pressure in MPa below a groundwater level
pub fn hydrostatic_pressure(depth: f64, groundwater_depth: f64, water_unit_weight: f64) -> f64 {
    (depth - groundwater_depth).max(0.0) * water_unit_weight / 1000.0
}

/// `numerator / denominator`, undefined for a vanishing denominator
fn divide(numerator: f64, denominator: f64, reason: UndefinedReason) -> Ratio {
    if denominator.abs() <= RATIO_EPSILON || !denominator.is_finite() {
        Ratio::Undefined(reason)
    } else {
        Ratio::finite(numerator / denominator)
    }
}

/// Per-sounding calculator of [`DerivedRatios`]
#[derive(Debug, Clone)]
pub struct RatioCalculator<'a> {
    config: &'a ClassificationConfig,
    area_quotient: Option<f64>,
    groundwater_depth: Option<f64>,
}

impl<'a> RatioCalculator<'a> {
    /// The configured groundwater depth overrides the one in the header
    pub fn new(config: &'a ClassificationConfig, metadata: &SiteMetadata) -> Self {
        Self {
            config,
            area_quotient: metadata.cone_area_quotient,
            groundwater_depth: config.groundwater_depth.or(metadata.groundwater_level),
        }
    }

    /// Replace the groundwater depth used as the normalisation base
    pub fn with_groundwater_depth(mut self, depth: Option<f64>) -> Self {
        self.groundwater_depth = depth;
        self
    }

    /// Groundwater depth used as the normalisation base, if any
    pub fn groundwater_depth(&self) -> Option<f64> {
        self.groundwater_depth
    }

    /// Ratios for every measurement.
    ///
    /// `unit_weights` and `stress_exponents` are aligned with
    /// `measurements`; the exponents are only used by the 2016 method.
    pub fn calculate(
        &self,
        measurements: &[Measurement],
        unit_weights: &[f64],
        stress_exponents: &[f64],
    ) -> Vec<DerivedRatios> {
        let depths: Vec<f64> = measurements.iter().map(|m| m.depth).collect();
        let total_stress = vertical_stress(&depths, unit_weights);

        measurements
            .iter()
            .enumerate()
            .map(|(index, measurement)| {
                let exponent = stress_exponents.get(index).copied().unwrap_or(1.0);
                self.row(
                    measurement,
                    total_stress[index],
                    unit_weights[index],
                    exponent,
                )
            })
            .collect()
    }

    fn row(
        &self,
        measurement: &Measurement,
        total_stress: f64,
        unit_weight: f64,
        exponent: f64,
    ) -> DerivedRatios {
        let fs = local_friction(measurement);
        let mut ratios = DerivedRatios {
            friction_ratio: friction_ratio(measurement.cone_resistance, fs),
            corrected_cone_resistance: corrected_cone_resistance(measurement, self.area_quotient),
            total_stress: Ratio::finite(total_stress),
            unit_weight,
            ..Default::default()
        };

        let Some(groundwater) = self.groundwater_depth else {
            let undefined = Ratio::Undefined(UndefinedReason::NoNormalizationBase);
            ratios.hydrostatic_pressure = undefined;
            ratios.effective_stress = undefined;
            ratios.normalized_cone_resistance = undefined;
            ratios.normalized_friction_ratio = undefined;
            ratios.stress_exponent = undefined;
            ratios.pore_pressure_ratio = undefined;
            return ratios;
        };

        let u0 = hydrostatic_pressure(measurement.depth, groundwater, self.config.water_unit_weight);
        let effective = total_stress - u0;
        ratios.hydrostatic_pressure = Ratio::finite(u0);
        ratios.effective_stress = Ratio::finite(effective);

        let qt = match ratios.corrected_cone_resistance {
            Ratio::Defined(qt) => qt,
            Ratio::Undefined(reason) => {
                let undefined = Ratio::Undefined(reason);
                ratios.normalized_cone_resistance = undefined;
                ratios.normalized_friction_ratio = undefined;
                ratios.stress_exponent = undefined;
                ratios.pore_pressure_ratio = undefined;
                return ratios;
            }
        };
        let net = qt - total_stress;

        ratios.normalized_friction_ratio = match fs {
            Some(fs) => divide(fs * 100.0, net, UndefinedReason::ZeroDenominator),
            None => Ratio::Undefined(UndefinedReason::MissingInput),
        };
        ratios.pore_pressure_ratio = match measurement.pore_pressure_u2 {
            Some(u2) => divide(u2 - u0, net, UndefinedReason::ZeroDenominator),
            None => Ratio::Undefined(UndefinedReason::MissingInput),
        };

        let pa = self.config.atmospheric_pressure;
        let (normalized, exponent) = if net <= RATIO_EPSILON {
            (Ratio::Undefined(UndefinedReason::ZeroDenominator), exponent)
        } else if effective <= RATIO_EPSILON {
            (
                Ratio::Undefined(UndefinedReason::NonPositiveEffectiveStress),
                exponent,
            )
        } else {
            match self.config.method {
                ClassificationMethod::Robertson1990 | ClassificationMethod::BeenJefferies => {
                    (Ratio::finite(net / effective), 1.0)
                }
                ClassificationMethod::Robertson2016 => (
                    Ratio::finite((net / pa) * (pa / effective).powf(exponent)),
                    exponent,
                ),
            }
        };
        ratios.normalized_cone_resistance = normalized;
        ratios.stress_exponent = match self.config.method {
            ClassificationMethod::Robertson1990 | ClassificationMethod::BeenJefferies => {
                Ratio::Defined(1.0)
            }
            ClassificationMethod::Robertson2016 => Ratio::finite(exponent),
        };

        ratios
    }
}
