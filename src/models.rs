//! Core data structures for sounding processing.
//!
//! Defines the semantic column set, typed measurements, derived ratios,
//! soil labels and the CPT and borehole records returned to callers.

use crate::error::{PipelineWarning, UndefinedReason};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interchange dialect a sounding was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    Gef,
    BroXml,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Gef => f.write_str("GEF"),
            Dialect::BroXml => f.write_str("BRO-XML"),
        }
    }
}

/// Kind of field test stored in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestType {
    Cpt,
    Bore,
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestType::Cpt => f.write_str("cpt"),
            TestType::Bore => f.write_str("bore"),
        }
    }
}

/// Horizontal position of a sounding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Spatial reference system, e.g. `EPSG:28992` or GEF code `31000`
    pub srs_name: String,
    pub x: f64,
    pub y: f64,
}

/// Site metadata shared by CPT and borehole records
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SiteMetadata {
    pub test_id: Option<String>,
    pub project_id: Option<String>,
    pub dialect: Option<Dialect>,
    pub test_type: Option<TestType>,
    /// Location as delivered in the file
    pub location: Option<Location>,
    /// Location in the standardized reference system (BRO only)
    pub standardized_location: Option<Location>,
    /// Surface level relative to the vertical datum, in metres
    pub ground_level: Option<f64>,
    pub vertical_datum: Option<String>,
    pub date: Option<NaiveDate>,
    /// Net area quotient of the cone tip (a)
    pub cone_area_quotient: Option<f64>,
    pub cone_id: Option<String>,
    pub pre_excavated_depth: Option<f64>,
    /// Groundwater level below the surface, in metres
    pub groundwater_level: Option<f64>,
    pub final_depth: Option<f64>,
    /// `Some(false)` when the header states the cone has no inclinometer
    pub inclination_present: Option<bool>,
}

/// Closed set of column meanings, resolved once from the header
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SemanticColumn {
    PenetrationLength,
    CorrectedDepth,
    ConeResistance,
    LocalFriction,
    FrictionRatio,
    PorePressureU1,
    PorePressureU2,
    PorePressureU3,
    Inclination,
    InclinationNs,
    InclinationEw,
    InclinationX,
    InclinationY,
    ElapsedTime,
    CorrectedConeResistance,
    NetConeResistance,
    PoreRatio,
    ElectricalConductivity,
    Temperature,
    DepthTop,
    DepthBottom,
    LutumPercentage,
    SiltPercentage,
    SandPercentage,
    GravelPercentage,
    OrganicMatterPercentage,
    SandMedian,
    GravelMedian,
    /// Column without a known meaning, kept under its declared name
    Extra(String),
}

impl SemanticColumn {
    /// Stable name used in tables and exports
    pub fn name(&self) -> &str {
        match self {
            SemanticColumn::PenetrationLength => "penetrationLength",
            SemanticColumn::CorrectedDepth => "correctedDepth",
            SemanticColumn::ConeResistance => "coneResistance",
            SemanticColumn::LocalFriction => "localFriction",
            SemanticColumn::FrictionRatio => "frictionRatio",
            SemanticColumn::PorePressureU1 => "porePressureU1",
            SemanticColumn::PorePressureU2 => "porePressureU2",
            SemanticColumn::PorePressureU3 => "porePressureU3",
            SemanticColumn::Inclination => "inclinationResultant",
            SemanticColumn::InclinationNs => "inclinationNS",
            SemanticColumn::InclinationEw => "inclinationEW",
            SemanticColumn::InclinationX => "inclinationX",
            SemanticColumn::InclinationY => "inclinationY",
            SemanticColumn::ElapsedTime => "elapsedTime",
            SemanticColumn::CorrectedConeResistance => "correctedConeResistance",
            SemanticColumn::NetConeResistance => "netConeResistance",
            SemanticColumn::PoreRatio => "poreRatio",
            SemanticColumn::ElectricalConductivity => "electricalConductivity",
            SemanticColumn::Temperature => "temperature",
            SemanticColumn::DepthTop => "upperBoundary",
            SemanticColumn::DepthBottom => "lowerBoundary",
            SemanticColumn::LutumPercentage => "lutumPercentage",
            SemanticColumn::SiltPercentage => "siltPercentage",
            SemanticColumn::SandPercentage => "sandPercentage",
            SemanticColumn::GravelPercentage => "gravelPercentage",
            SemanticColumn::OrganicMatterPercentage => "organicMatterPercentage",
            SemanticColumn::SandMedian => "sandMedianClass",
            SemanticColumn::GravelMedian => "gravelMedianClass",
            SemanticColumn::Extra(name) => name,
        }
    }

    /// Canonical unit values of this column are converted to
    pub fn canonical_unit(&self) -> Unit {
        match self {
            SemanticColumn::PenetrationLength
            | SemanticColumn::CorrectedDepth
            | SemanticColumn::DepthTop
            | SemanticColumn::DepthBottom => Unit::Metre,
            SemanticColumn::ConeResistance
            | SemanticColumn::LocalFriction
            | SemanticColumn::PorePressureU1
            | SemanticColumn::PorePressureU2
            | SemanticColumn::PorePressureU3
            | SemanticColumn::CorrectedConeResistance
            | SemanticColumn::NetConeResistance => Unit::Megapascal,
            SemanticColumn::Inclination
            | SemanticColumn::InclinationNs
            | SemanticColumn::InclinationEw
            | SemanticColumn::InclinationX
            | SemanticColumn::InclinationY => Unit::Degree,
            SemanticColumn::ElapsedTime => Unit::Second,
            SemanticColumn::FrictionRatio
            | SemanticColumn::LutumPercentage
            | SemanticColumn::SiltPercentage
            | SemanticColumn::SandPercentage
            | SemanticColumn::GravelPercentage
            | SemanticColumn::OrganicMatterPercentage => Unit::Percent,
            SemanticColumn::SandMedian | SemanticColumn::GravelMedian => Unit::Millimetre,
            _ => Unit::Unitless,
        }
    }
}

impl fmt::Display for SemanticColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical unit of a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Megapascal,
    Kilopascal,
    Pascal,
    Metre,
    Centimetre,
    Millimetre,
    Degree,
    Radian,
    Second,
    Minute,
    Percent,
    Unitless,
    /// Unit text that is not recognised; values are left unconverted
    Other(String),
}

impl Unit {
    /// Interpret a unit as written in a header, e.g. `MPa`, `kPa`, `m`
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "mpa" | "mn/m2" => Unit::Megapascal,
            "kpa" | "kn/m2" => Unit::Kilopascal,
            "pa" => Unit::Pascal,
            "m" => Unit::Metre,
            "cm" => Unit::Centimetre,
            "mm" => Unit::Millimetre,
            "deg" | "degree" | "degrees" | "graden" | "°" => Unit::Degree,
            "rad" => Unit::Radian,
            "s" | "sec" => Unit::Second,
            "min" => Unit::Minute,
            "%" => Unit::Percent,
            "-" | "" => Unit::Unitless,
            _ => Unit::Other(trimmed.to_string()),
        }
    }
}

/// Declared type of the values in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityType {
    Numeric,
    Text,
    Date,
}

/// Column position and meaning, built from the header declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Zero-based position within a data row
    pub index: usize,
    pub column: SemanticColumn,
    /// Unit text as declared in the file
    pub raw_unit: String,
    /// Unit the values are expressed in before normalisation
    pub unit: Unit,
    pub quantity_type: QuantityType,
    /// No-data sentinel of this column
    pub void: Option<f64>,
    /// Disabled columns are present in the rows but not read (BRO `nee`)
    pub enabled: bool,
}

/// One parsed data cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Missing,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

/// One normalised depth sample of a CPT.
///
/// Every physical value is optional; depth is always defined because rows
/// without a resolvable depth are dropped during normalisation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Measurement {
    /// 1-based index of the source row in the data block
    pub row: usize,
    pub depth: f64,
    pub penetration_length: Option<f64>,
    pub elevation: Option<f64>,
    pub cone_resistance: Option<f64>,
    pub local_friction: Option<f64>,
    /// Friction ratio as reported in the file, in percent
    pub friction_ratio: Option<f64>,
    pub pore_pressure_u1: Option<f64>,
    pub pore_pressure_u2: Option<f64>,
    pub pore_pressure_u3: Option<f64>,
    pub corrected_cone_resistance: Option<f64>,
    /// Resultant inclination from vertical, in degrees
    pub inclination: Option<f64>,
    pub elapsed_time: Option<f64>,
    /// Remaining columns, aligned with `CptRecord::extra_columns`
    pub extras: Vec<Value>,
}

impl Measurement {
    /// Value of a column that has a dedicated field
    pub fn value(&self, column: &SemanticColumn) -> Option<f64> {
        match column {
            SemanticColumn::PenetrationLength => self.penetration_length,
            SemanticColumn::CorrectedDepth => Some(self.depth),
            SemanticColumn::ConeResistance => self.cone_resistance,
            SemanticColumn::LocalFriction => self.local_friction,
            SemanticColumn::FrictionRatio => self.friction_ratio,
            SemanticColumn::PorePressureU1 => self.pore_pressure_u1,
            SemanticColumn::PorePressureU2 => self.pore_pressure_u2,
            SemanticColumn::PorePressureU3 => self.pore_pressure_u3,
            SemanticColumn::CorrectedConeResistance => self.corrected_cone_resistance,
            SemanticColumn::Inclination => self.inclination,
            SemanticColumn::ElapsedTime => self.elapsed_time,
            _ => None,
        }
    }

    /// Columns that map onto a dedicated field of [`Measurement`]
    pub fn has_field(column: &SemanticColumn) -> bool {
        matches!(
            column,
            SemanticColumn::PenetrationLength
                | SemanticColumn::CorrectedDepth
                | SemanticColumn::ConeResistance
                | SemanticColumn::LocalFriction
                | SemanticColumn::FrictionRatio
                | SemanticColumn::PorePressureU1
                | SemanticColumn::PorePressureU2
                | SemanticColumn::PorePressureU3
                | SemanticColumn::CorrectedConeResistance
                | SemanticColumn::Inclination
                | SemanticColumn::ElapsedTime
        )
    }
}

/// A derived quantity that is either a finite number or explicitly undefined
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Ratio {
    Defined(f64),
    Undefined(UndefinedReason),
}

impl Ratio {
    /// Wrap a computed value, rejecting NaN and infinities
    pub fn finite(value: f64) -> Self {
        if value.is_finite() {
            Ratio::Defined(value)
        } else {
            Ratio::Undefined(UndefinedReason::NonFinite)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Ratio::Defined(v) => Some(*v),
            Ratio::Undefined(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Ratio::Defined(_))
    }

    pub fn undefined_reason(&self) -> Option<UndefinedReason> {
        match self {
            Ratio::Defined(_) => None,
            Ratio::Undefined(reason) => Some(*reason),
        }
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Ratio::Undefined(UndefinedReason::MissingInput)
    }
}

/// Ratios and stresses derived for one measurement; stresses in MPa
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DerivedRatios {
    /// fs / qc * 100
    pub friction_ratio: Ratio,
    /// Cone resistance corrected for pore pressure on the shoulder (qt)
    pub corrected_cone_resistance: Ratio,
    pub total_stress: Ratio,
    pub hydrostatic_pressure: Ratio,
    pub effective_stress: Ratio,
    /// Qt (1990) or Qtn (2016)
    pub normalized_cone_resistance: Ratio,
    /// Fr = fs / (qt - sigma_v0) * 100
    pub normalized_friction_ratio: Ratio,
    pub stress_exponent: Ratio,
    /// Bq = (u2 - u0) / (qt - sigma_v0)
    pub pore_pressure_ratio: Ratio,
    /// Unit weight used for the stress at this depth, in kN/m3
    pub unit_weight: f64,
}

/// Soil type labels, ordered from coarse to fine grained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SoilLabel {
    Gravel,
    Sand,
    SiltySand,
    ClayeySand,
    Silt,
    Loam,
    ClayeySilt,
    SiltyClay,
    Clay,
    Peat,
    Unclassified,
}

impl SoilLabel {
    /// Position on the grain size scale; `None` for unclassified
    pub fn ordinal(&self) -> Option<u8> {
        match self {
            SoilLabel::Gravel => Some(0),
            SoilLabel::Sand => Some(1),
            SoilLabel::SiltySand => Some(2),
            SoilLabel::ClayeySand => Some(3),
            SoilLabel::Silt => Some(4),
            SoilLabel::Loam => Some(5),
            SoilLabel::ClayeySilt => Some(6),
            SoilLabel::SiltyClay => Some(7),
            SoilLabel::Clay => Some(8),
            SoilLabel::Peat => Some(9),
            SoilLabel::Unclassified => None,
        }
    }

    /// Stable name used in tables and exports
    pub fn name(&self) -> &'static str {
        match self {
            SoilLabel::Gravel => "gravel",
            SoilLabel::Sand => "sand",
            SoilLabel::SiltySand => "silty_sand",
            SoilLabel::ClayeySand => "clayey_sand",
            SoilLabel::Silt => "silt",
            SoilLabel::Loam => "loam",
            SoilLabel::ClayeySilt => "clayey_silt",
            SoilLabel::SiltyClay => "silty_clay",
            SoilLabel::Clay => "clay",
            SoilLabel::Peat => "peat",
            SoilLabel::Unclassified => "unclassified",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SoilLabel::Gravel => "gravelly sand to dense sand",
            SoilLabel::Sand => "clean sand to silty sand",
            SoilLabel::SiltySand => "silty sand to sandy silt",
            SoilLabel::ClayeySand => "clayey sand",
            SoilLabel::Silt => "silt",
            SoilLabel::Loam => "loam",
            SoilLabel::ClayeySilt => "clayey silt to silty clay",
            SoilLabel::SiltyClay => "silty clay",
            SoilLabel::Clay => "silty clay to clay",
            SoilLabel::Peat => "organic soils, peat",
            SoilLabel::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for SoilLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Composition of a soil by fraction; shares sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SoilFractions {
    pub gravel: f64,
    pub sand: f64,
    pub silt: f64,
    pub clay: f64,
    pub loam: f64,
    pub peat: f64,
}

impl SoilFractions {
    pub const TOLERANCE: f64 = 1e-6;

    pub fn sum(&self) -> f64 {
        self.gravel + self.sand + self.silt + self.clay + self.loam + self.peat
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= Self::TOLERANCE
    }

    /// Rescale the shares to sum to one; `None` if all shares are zero
    pub fn normalized(&self) -> Option<Self> {
        let total = self.sum();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        Some(self.scaled(1.0 / total))
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            gravel: self.gravel * factor,
            sand: self.sand * factor,
            silt: self.silt * factor,
            clay: self.clay * factor,
            loam: self.loam * factor,
            peat: self.peat * factor,
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            gravel: self.gravel + other.gravel,
            sand: self.sand + other.sand,
            silt: self.silt + other.silt,
            clay: self.clay + other.clay,
            loam: self.loam + other.loam,
            peat: self.peat + other.peat,
        }
    }

    /// Fractions as (label, share) pairs in grain size order
    pub fn shares(&self) -> [(SoilLabel, f64); 6] {
        [
            (SoilLabel::Gravel, self.gravel),
            (SoilLabel::Sand, self.sand),
            (SoilLabel::Silt, self.silt),
            (SoilLabel::Loam, self.loam),
            (SoilLabel::Clay, self.clay),
            (SoilLabel::Peat, self.peat),
        ]
    }
}

/// Outcome of classifying one measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Robertson soil behaviour type zone (2 to 7)
    pub zone: Option<u8>,
    /// Soil behaviour type index Ic
    pub ic: Ratio,
    pub label: SoilLabel,
    pub fractions: Option<SoilFractions>,
}

impl Classification {
    pub fn unclassified(reason: UndefinedReason) -> Self {
        Self {
            zone: None,
            ic: Ratio::Undefined(reason),
            label: SoilLabel::Unclassified,
            fractions: None,
        }
    }
}

/// Depth interval with a single soil label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub depth_top: f64,
    pub depth_bottom: f64,
    pub label: SoilLabel,
    pub fractions: Option<SoilFractions>,
    /// Soil description code (GEF NEN 5104 code or BRO soil name)
    pub soil_code: Option<String>,
    pub remarks: Vec<String>,
}

impl Layer {
    pub fn thickness(&self) -> f64 {
        self.depth_bottom - self.depth_top
    }

    /// Depth halfway between top and bottom
    pub fn depth_center(&self) -> f64 {
        (self.depth_top + self.depth_bottom) / 2.0
    }

    /// Elevation of the layer centre for a sounding at `ground_level`
    pub fn elevation_center(&self, ground_level: Option<f64>) -> Option<f64> {
        ground_level.map(|level| level - self.depth_center())
    }
}

/// One CPT row: measurement, derived ratios and classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CptRow {
    pub measurement: Measurement,
    pub ratios: DerivedRatios,
    pub classification: Classification,
}

/// Derived quantities exposed as table columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedColumn {
    Depth,
    Elevation,
    ComputedFrictionRatio,
    TotalConeResistance,
    TotalStress,
    HydrostaticPressure,
    EffectiveStress,
    NormalizedConeResistance,
    NormalizedFrictionRatio,
    StressExponent,
    PorePressureRatio,
    UnitWeight,
    SoilBehaviourTypeIndex,
}

impl DerivedColumn {
    pub const ALL: [DerivedColumn; 13] = [
        DerivedColumn::Depth,
        DerivedColumn::Elevation,
        DerivedColumn::ComputedFrictionRatio,
        DerivedColumn::TotalConeResistance,
        DerivedColumn::TotalStress,
        DerivedColumn::HydrostaticPressure,
        DerivedColumn::EffectiveStress,
        DerivedColumn::NormalizedConeResistance,
        DerivedColumn::NormalizedFrictionRatio,
        DerivedColumn::StressExponent,
        DerivedColumn::PorePressureRatio,
        DerivedColumn::UnitWeight,
        DerivedColumn::SoilBehaviourTypeIndex,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DerivedColumn::Depth => "depth",
            DerivedColumn::Elevation => "elevation",
            DerivedColumn::ComputedFrictionRatio => "frictionRatioComputed",
            DerivedColumn::TotalConeResistance => "totalConeResistance",
            DerivedColumn::TotalStress => "totalVerticalStress",
            DerivedColumn::HydrostaticPressure => "hydrostaticPorePressure",
            DerivedColumn::EffectiveStress => "effectiveVerticalStress",
            DerivedColumn::NormalizedConeResistance => "normalizedConeResistance",
            DerivedColumn::NormalizedFrictionRatio => "normalizedFrictionRatio",
            DerivedColumn::StressExponent => "stressExponent",
            DerivedColumn::PorePressureRatio => "porePressureRatio",
            DerivedColumn::UnitWeight => "unitWeight",
            DerivedColumn::SoilBehaviourTypeIndex => "soilBehaviourTypeIndex",
        }
    }
}

/// Column address into a [`CptRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    Measured(SemanticColumn),
    Derived(DerivedColumn),
}

impl Column {
    pub fn name(&self) -> &str {
        match self {
            Column::Measured(column) => column.name(),
            Column::Derived(column) => column.name(),
        }
    }
}

/// A processed cone penetration test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CptRecord {
    pub metadata: SiteMetadata,
    /// Columns as declared in the file
    pub columns: Vec<ColumnSpec>,
    /// Columns stored in `Measurement::extras`, in the same order
    pub extra_columns: Vec<SemanticColumn>,
    pub rows: Vec<CptRow>,
    pub layers: Vec<Layer>,
    pub warnings: Vec<PipelineWarning>,
}

impl CptRecord {
    pub fn measurements(&self) -> impl Iterator<Item = &Measurement> {
        self.rows.iter().map(|row| &row.measurement)
    }

    pub fn depths(&self) -> Vec<f64> {
        self.measurements().map(|m| m.depth).collect()
    }

    pub fn labels(&self) -> Vec<SoilLabel> {
        self.rows.iter().map(|row| row.classification.label).collect()
    }

    /// True when the file declared this measured column
    pub fn has_column(&self, column: &SemanticColumn) -> bool {
        self.columns
            .iter()
            .any(|spec| spec.enabled && &spec.column == column)
    }

    /// Numeric values of a column by semantic name; `None` when the column
    /// is neither declared nor derived
    pub fn column(&self, column: &Column) -> Option<Vec<Option<f64>>> {
        match column {
            Column::Measured(semantic) => {
                if Measurement::has_field(semantic) {
                    if *semantic != SemanticColumn::CorrectedDepth && !self.has_column(semantic) {
                        return None;
                    }
                    return Some(self.measurements().map(|m| m.value(semantic)).collect());
                }
                let position = self.extra_columns.iter().position(|c| c == semantic)?;
                Some(
                    self.measurements()
                        .map(|m| m.extras.get(position).and_then(Value::as_f64))
                        .collect(),
                )
            }
            Column::Derived(derived) => Some(
                self.rows
                    .iter()
                    .map(|row| derived_value(row, *derived))
                    .collect(),
            ),
        }
    }
}

fn derived_value(row: &CptRow, column: DerivedColumn) -> Option<f64> {
    let ratios = &row.ratios;
    match column {
        DerivedColumn::Depth => Some(row.measurement.depth),
        DerivedColumn::Elevation => row.measurement.elevation,
        DerivedColumn::ComputedFrictionRatio => ratios.friction_ratio.value(),
        DerivedColumn::TotalConeResistance => ratios.corrected_cone_resistance.value(),
        DerivedColumn::TotalStress => ratios.total_stress.value(),
        DerivedColumn::HydrostaticPressure => ratios.hydrostatic_pressure.value(),
        DerivedColumn::EffectiveStress => ratios.effective_stress.value(),
        DerivedColumn::NormalizedConeResistance => ratios.normalized_cone_resistance.value(),
        DerivedColumn::NormalizedFrictionRatio => ratios.normalized_friction_ratio.value(),
        DerivedColumn::StressExponent => ratios.stress_exponent.value(),
        DerivedColumn::PorePressureRatio => ratios.pore_pressure_ratio.value(),
        DerivedColumn::UnitWeight => Some(ratios.unit_weight),
        DerivedColumn::SoilBehaviourTypeIndex => row.classification.ic.value(),
    }
}

/// One borehole layer with its measured properties
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoreLayer {
    /// 1-based index of the source row in the data block
    pub row: usize,
    pub layer: Layer,
    /// Values aligned with `BoreRecord::property_columns`
    pub properties: Vec<Value>,
}

/// A processed borehole log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoreRecord {
    pub metadata: SiteMetadata,
    pub columns: Vec<ColumnSpec>,
    /// Declared columns other than the layer boundaries
    pub property_columns: Vec<SemanticColumn>,
    pub layers: Vec<BoreLayer>,
    pub warnings: Vec<PipelineWarning>,
}

impl BoreRecord {
    pub fn labels(&self) -> Vec<SoilLabel> {
        self.layers.iter().map(|l| l.layer.label).collect()
    }
}

/// Result of processing one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Sounding {
    Cpt(CptRecord),
    Bore(BoreRecord),
}

impl Sounding {
    pub fn metadata(&self) -> &SiteMetadata {
        match self {
            Sounding::Cpt(record) => &record.metadata,
            Sounding::Bore(record) => &record.metadata,
        }
    }

    pub fn warnings(&self) -> &[PipelineWarning] {
        match self {
            Sounding::Cpt(record) => &record.warnings,
            Sounding::Bore(record) => &record.warnings,
        }
    }

    pub fn test_type(&self) -> TestType {
        match self {
            Sounding::Cpt(_) => TestType::Cpt,
            Sounding::Bore(_) => TestType::Bore,
        }
    }

    /// Number of CPT rows or borehole layers
    pub fn len(&self) -> usize {
        match self {
            Sounding::Cpt(record) => record.rows.len(),
            Sounding::Bore(record) => record.layers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_parsing() {
        assert_eq!(Unit::parse("MPa"), Unit::Megapascal);
        assert_eq!(Unit::parse(" kPa "), Unit::Kilopascal);
        assert_eq!(Unit::parse("m"), Unit::Metre);
        assert_eq!(Unit::parse("deg"), Unit::Degree);
        assert_eq!(Unit::parse("-"), Unit::Unitless);
        assert_eq!(Unit::parse("S/m"), Unit::Other("S/m".to_string()));
    }

    #[test]
    fn test_ratio_rejects_non_finite() {
        assert_eq!(Ratio::finite(2.0), Ratio::Defined(2.0));
        assert_eq!(
            Ratio::finite(f64::INFINITY),
            Ratio::Undefined(UndefinedReason::NonFinite)
        );
        assert_eq!(Ratio::finite(f64::NAN).value(), None);
    }

    #[test]
    fn test_soil_label_ordinals_follow_grain_size() {
        assert!(SoilLabel::Gravel.ordinal() < SoilLabel::Sand.ordinal());
        assert!(SoilLabel::Clay.ordinal() < SoilLabel::Peat.ordinal());
        assert_eq!(SoilLabel::Unclassified.ordinal(), None);
        assert_eq!(SoilLabel::SiltySand.name(), "silty_sand");
    }

    #[test]
    fn test_fractions_normalization() {
        let fractions = SoilFractions {
            sand: 2.0,
            clay: 2.0,
            ..Default::default()
        };
        let normalized = fractions.normalized().unwrap();
        assert!(normalized.is_normalized());
        assert_eq!(normalized.sand, 0.5);
        assert!(SoilFractions::default().normalized().is_none());
    }

    #[test]
    fn test_stable_column_names() {
        assert_eq!(SemanticColumn::ConeResistance.name(), "coneResistance");
        assert_eq!(
            SemanticColumn::Extra("custom".to_string()).name(),
            "custom"
        );
        assert_eq!(
            Column::Derived(DerivedColumn::ComputedFrictionRatio).name(),
            "frictionRatioComputed"
        );
    }
}
