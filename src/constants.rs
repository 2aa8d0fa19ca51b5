//! Application constants for the GEF processor
//!
//! Quantity numbers of the GEF standards, BRO parameter names, default
//! sentinels and the empirical constants of the Robertson classification.

use crate::models::SemanticColumn;

// =============================================================================
// File Markers and Defaults
// =============================================================================

/// Header key that terminates a GEF header block
pub const GEF_END_OF_HEADER: &str = "EOH";

/// Default no-data value of GEF files when `#COLUMNVOID` is absent
pub const GEF_DEFAULT_VOID: f64 = -9999.0;

/// No-data value used in BRO-XML value blocks
pub const BRO_DEFAULT_VOID: f64 = -999_999.0;

/// Height system code for NAP (Normaal Amsterdams Peil)
pub const NAP_HEIGHT_SYSTEM: i64 = 31000;

/// File extensions picked up when scanning directories
pub const SOUNDING_EXTENSIONS: &[&str] = &["gef", "xml"];

// =============================================================================
// GEF MEASUREMENTVAR numbers
// =============================================================================

pub mod measurement_var {
    /// Nominal net area quotient of the cone (a)
    pub const CONE_AREA_QUOTIENT: u32 = 3;
    /// Whether the cone carries an inclination sensor (0 = no)
    pub const INCLINATION_PRESENT: u32 = 10;
    /// Depth of a pre-excavated hole before the sounding started
    pub const PRE_EXCAVATED_DEPTH: u32 = 13;
    /// Groundwater level relative to the surface, in metres
    pub const GROUNDWATER_LEVEL: u32 = 14;
    /// Final penetration length
    pub const END_DEPTH: u32 = 16;
}

/// MEASUREMENTTEXT number holding the cone identification
pub const MEASUREMENTTEXT_CONE_ID: u32 = 4;

// =============================================================================
// Column Mappings
// =============================================================================

/// Map a GEF-CPT quantity number to its semantic column
pub fn gef_cpt_quantity(quantity: u32) -> Option<SemanticColumn> {
    let column = match quantity {
        1 => SemanticColumn::PenetrationLength,
        2 => SemanticColumn::ConeResistance,
        3 => SemanticColumn::LocalFriction,
        4 => SemanticColumn::FrictionRatio,
        5 => SemanticColumn::PorePressureU1,
        6 => SemanticColumn::PorePressureU2,
        7 => SemanticColumn::PorePressureU3,
        8 => SemanticColumn::Inclination,
        9 => SemanticColumn::InclinationNs,
        10 => SemanticColumn::InclinationEw,
        11 => SemanticColumn::CorrectedDepth,
        12 => SemanticColumn::ElapsedTime,
        13 => SemanticColumn::CorrectedConeResistance,
        14 => SemanticColumn::NetConeResistance,
        15 => SemanticColumn::PoreRatio,
        21 => SemanticColumn::InclinationX,
        22 => SemanticColumn::InclinationY,
        23 => SemanticColumn::ElectricalConductivity,
        39 => SemanticColumn::Temperature,
        _ => return None,
    };
    Some(column)
}

/// Map a GEF-BORE quantity number to its semantic column
pub fn gef_bore_quantity(quantity: u32) -> Option<SemanticColumn> {
    let column = match quantity {
        1 => SemanticColumn::DepthTop,
        2 => SemanticColumn::DepthBottom,
        3 => SemanticColumn::LutumPercentage,
        4 => SemanticColumn::SiltPercentage,
        5 => SemanticColumn::SandPercentage,
        6 => SemanticColumn::GravelPercentage,
        7 => SemanticColumn::OrganicMatterPercentage,
        8 => SemanticColumn::SandMedian,
        9 => SemanticColumn::GravelMedian,
        _ => return None,
    };
    Some(column)
}

/// Map a BRO `parameters` element name to its semantic column
pub fn bro_parameter(name: &str) -> Option<SemanticColumn> {
    let column = match name {
        "penetrationLength" => SemanticColumn::PenetrationLength,
        "depth" => SemanticColumn::CorrectedDepth,
        "elapsedTime" => SemanticColumn::ElapsedTime,
        "coneResistance" => SemanticColumn::ConeResistance,
        "correctedConeResistance" => SemanticColumn::CorrectedConeResistance,
        "netConeResistance" => SemanticColumn::NetConeResistance,
        "electricalConductivity" => SemanticColumn::ElectricalConductivity,
        "inclinationEW" => SemanticColumn::InclinationEw,
        "inclinationNS" => SemanticColumn::InclinationNs,
        "inclinationX" => SemanticColumn::InclinationX,
        "inclinationY" => SemanticColumn::InclinationY,
        "inclinationResultant" => SemanticColumn::Inclination,
        "localFriction" => SemanticColumn::LocalFriction,
        "poreRatio" => SemanticColumn::PoreRatio,
        "temperature" => SemanticColumn::Temperature,
        "porePressureU1" => SemanticColumn::PorePressureU1,
        "porePressureU2" => SemanticColumn::PorePressureU2,
        "porePressureU3" => SemanticColumn::PorePressureU3,
        "frictionRatio" => SemanticColumn::FrictionRatio,
        _ => return None,
    };
    Some(column)
}

/// Units of BRO CPT parameters, which the XML does not declare per column
pub fn bro_parameter_unit(column: &SemanticColumn) -> &'static str {
    match column {
        SemanticColumn::PenetrationLength | SemanticColumn::CorrectedDepth => "m",
        SemanticColumn::ElapsedTime => "s",
        SemanticColumn::ConeResistance
        | SemanticColumn::CorrectedConeResistance
        | SemanticColumn::NetConeResistance
        | SemanticColumn::LocalFriction
        | SemanticColumn::PorePressureU1
        | SemanticColumn::PorePressureU2
        | SemanticColumn::PorePressureU3 => "MPa",
        SemanticColumn::Inclination
        | SemanticColumn::InclinationNs
        | SemanticColumn::InclinationEw
        | SemanticColumn::InclinationX
        | SemanticColumn::InclinationY => "deg",
        SemanticColumn::FrictionRatio => "%",
        SemanticColumn::ElectricalConductivity => "S/m",
        SemanticColumn::Temperature => "C",
        _ => "-",
    }
}

// =============================================================================
// Robertson Classification
// =============================================================================

/// Atmospheric pressure used as the normalisation base, in MPa
pub const DEFAULT_ATMOSPHERIC_PRESSURE: f64 = 0.1;

/// Unit weight of water in kN/m3
pub const DEFAULT_WATER_UNIT_WEIGHT: f64 = 9.81;

/// Unit weight assumed before the first classification pass, in kN/m3
pub const DEFAULT_INITIAL_UNIT_WEIGHT: f64 = 18.0;

/// Maximum number of unit weight refinement passes
pub const DEFAULT_MAX_ITERATIONS: usize = 4;

/// Default minimum layer thickness for the record assembler, in metres
pub const DEFAULT_MIN_LAYER_THICKNESS: f64 = 0.2;

/// Denominators at or below this magnitude are treated as zero
pub const RATIO_EPSILON: f64 = 1e-12;

/// Convergence tolerance of the unit weight and stress exponent refinement
pub const REFINEMENT_TOLERANCE: f64 = 1e-6;

/// Ic zone limits; a value equal to a limit belongs to the lower zone index
pub mod ic_boundary {
    pub const ORGANIC: f64 = 3.60;
    pub const CLAY: f64 = 2.95;
    pub const SILT_MIXTURE: f64 = 2.60;
    pub const SAND_MIXTURE: f64 = 2.05;
    pub const SAND: f64 = 1.31;
}

/// Been & Jefferies state parameter chart limits, with the same tie-break
pub mod bj_boundary {
    pub const ORGANIC: f64 = 3.22;
    pub const CLAY: f64 = 2.76;
    pub const SILT_MIXTURE: f64 = 2.40;
    pub const SAND_MIXTURE: f64 = 1.80;
    pub const SAND: f64 = 1.25;
}

/// Unit weights estimated from Ic, in kN/m3
pub mod unit_weight {
    pub const ORGANIC: f64 = 11.0;
    pub const CLAY: f64 = 16.0;
    pub const DRY_GRANULAR: f64 = 18.0;
    pub const WET_SILTY_SAND: f64 = 18.0;
    pub const WET_SAND: f64 = 19.0;
    pub const WET_GRAVEL: f64 = 20.0;

    /// Above this Ic the soil is treated as organic
    pub const IC_ORGANIC: f64 = 3.22;
    /// Above this Ic the soil is treated as cohesive
    pub const IC_CLAY: f64 = 2.76;
    /// Saturated granular soil with Ic at most this value is gravelly
    pub const IC_GRAVEL: f64 = 1.80;
    /// Saturated granular soil with Ic at most this value is clean sand
    pub const IC_SAND: f64 = 2.40;
}

/// Positions of the pure soils on the Ic axis used for fraction blending
pub mod fraction_anchor {
    pub const GRAVEL: f64 = 1.00;
    pub const SAND: f64 = 1.68;
    pub const SILT: f64 = 2.60;
    pub const CLAY: f64 = 3.275;
    pub const PEAT: f64 = 3.90;
}

// =============================================================================
// GEF Soil Codes (NEN 5104)
// =============================================================================

/// Share of an addition with intensity 1 to 4; intensity 0 is absent
pub const SOIL_CODE_INTENSITY: [f64; 5] = [0.05, 0.05, 0.10, 0.15, 0.20];

/// Codes that describe material which cannot be split into soil fractions
pub const UNCLASSIFIED_SOIL_CODES: &[&str] = &["GM", "NBE", "W"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gef_quantity_mapping() {
        assert_eq!(gef_cpt_quantity(1), Some(SemanticColumn::PenetrationLength));
        assert_eq!(gef_cpt_quantity(2), Some(SemanticColumn::ConeResistance));
        assert_eq!(gef_cpt_quantity(11), Some(SemanticColumn::CorrectedDepth));
        assert_eq!(gef_cpt_quantity(99), None);
        assert_eq!(gef_bore_quantity(2), Some(SemanticColumn::DepthBottom));
    }

    #[test]
    fn test_bro_parameter_mapping() {
        assert_eq!(
            bro_parameter("localFriction"),
            Some(SemanticColumn::LocalFriction)
        );
        assert_eq!(bro_parameter("magneticFieldStrengthX"), None);
        assert_eq!(bro_parameter_unit(&SemanticColumn::LocalFriction), "MPa");
    }

    #[test]
    fn test_ic_boundaries_are_ordered() {
        assert!(ic_boundary::ORGANIC > ic_boundary::CLAY);
        assert!(ic_boundary::CLAY > ic_boundary::SILT_MIXTURE);
        assert!(ic_boundary::SILT_MIXTURE > ic_boundary::SAND_MIXTURE);
        assert!(ic_boundary::SAND_MIXTURE > ic_boundary::SAND);

        assert!(bj_boundary::ORGANIC > bj_boundary::CLAY);
        assert!(bj_boundary::CLAY > bj_boundary::SILT_MIXTURE);
        assert!(bj_boundary::SILT_MIXTURE > bj_boundary::SAND_MIXTURE);
        assert!(bj_boundary::SAND_MIXTURE > bj_boundary::SAND);
    }
}
