//! Soil classification.
//!
//! CPT rows are placed on the Robertson soil behaviour type chart or the
//! Been & Jefferies chart; borehole layers are classified from their soil
//! description codes. Neither ever fails: rows that cannot be placed get
//! [`SoilLabel::Unclassified`].

mod been_jefferies;
mod robertson;
mod soil_codes;

pub use been_jefferies::{bj_behaviour_index, bj_zone};
pub use robertson::{
    behaviour_index, fractions_from_ic, stress_exponent, unit_weight, zone, zone_label,
};
pub use soil_codes::{
    SoilDescription, classify_bro_name, classify_gef_code, dominant_fraction,
    label_from_fractions,
};

use crate::config::{ClassificationConfig, ClassificationMethod};
use crate::error::UndefinedReason;
use crate::models::{Classification, DerivedRatios, Dialect, Ratio, SoilLabel};

/// Chart classifier for CPT rows
#[derive(Debug, Clone, Copy)]
pub struct SoilClassifier<'a> {
    config: &'a ClassificationConfig,
}

impl<'a> SoilClassifier<'a> {
    pub fn new(config: &'a ClassificationConfig) -> Self {
        Self { config }
    }

    /// Chart coordinates (Q, F) of a row.
    ///
    /// The normalised pair is used when both ratios are defined; otherwise
    /// the non-normalised chart with qt / pa and the friction ratio.
    pub fn chart_point(&self, ratios: &DerivedRatios) -> Result<(f64, f64), UndefinedReason> {
        if let (Ratio::Defined(q), Ratio::Defined(f)) = (
            ratios.normalized_cone_resistance,
            ratios.normalized_friction_ratio,
        ) {
            return Ok((q, f));
        }
        match (ratios.corrected_cone_resistance, ratios.friction_ratio) {
            (Ratio::Defined(qt), Ratio::Defined(rf)) => {
                Ok((qt / self.config.atmospheric_pressure, rf))
            }
            (Ratio::Undefined(reason), _) | (_, Ratio::Undefined(reason)) => Err(reason),
        }
    }

    /// Classify one row from its derived ratios
    pub fn classify(&self, ratios: &DerivedRatios) -> Classification {
        if self.config.method == ClassificationMethod::BeenJefferies {
            return self.classify_been_jefferies(ratios);
        }

        let (q, f) = match self.chart_point(ratios) {
            Ok(point) => point,
            Err(reason) => return Classification::unclassified(reason),
        };
        let ic = match behaviour_index(q, f) {
            Ratio::Defined(ic) => ic,
            Ratio::Undefined(reason) => return Classification::unclassified(reason),
        };

        let zone = zone(ic);
        Classification {
            zone: Some(zone),
            ic: Ratio::Defined(ic),
            label: zone_label(zone),
            fractions: self.config.soil_fractions.then(|| fractions_from_ic(ic)),
        }
    }

    /// The Been & Jefferies chart needs Q, F and Bq; there is no
    /// non-normalised fallback. Fractions are anchored on the Robertson
    /// index and are left out.
    fn classify_been_jefferies(&self, ratios: &DerivedRatios) -> Classification {
        let inputs = (
            ratios.normalized_cone_resistance,
            ratios.normalized_friction_ratio,
            ratios.pore_pressure_ratio,
        );
        let ic = match inputs {
            (Ratio::Defined(q), Ratio::Defined(f), Ratio::Defined(bq)) => {
                bj_behaviour_index(q, f, bq)
            }
            (Ratio::Undefined(reason), _, _)
            | (_, Ratio::Undefined(reason), _)
            | (_, _, Ratio::Undefined(reason)) => Ratio::Undefined(reason),
        };
        let ic = match ic {
            Ratio::Defined(ic) => ic,
            Ratio::Undefined(reason) => return Classification::unclassified(reason),
        };

        let zone = bj_zone(ic);
        Classification {
            zone: Some(zone),
            ic: Ratio::Defined(ic),
            label: zone_label(zone),
            fractions: None,
        }
    }
}

/// Look up a borehole soil description written in `dialect`
pub fn describe_soil(code: &str, dialect: Dialect) -> SoilDescription {
    match dialect {
        Dialect::Gef => classify_gef_code(code),
        Dialect::BroXml => classify_bro_name(code),
    }
}

/// Label and fractions of a borehole layer; unclassified when the
/// description has no soil fractions
pub fn classify_description(description: SoilDescription) -> Classification {
    match description {
        SoilDescription::Classified { label, fractions } => Classification {
            zone: None,
            ic: Ratio::Undefined(UndefinedReason::MissingInput),
            label,
            fractions: Some(fractions),
        },
        SoilDescription::NotClassifiable | SoilDescription::Unknown => Classification {
            zone: None,
            ic: Ratio::Undefined(UndefinedReason::MissingInput),
            label: SoilLabel::Unclassified,
            fractions: None,
        },
    }
}
