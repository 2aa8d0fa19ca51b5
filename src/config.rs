//! Configuration management and validation.
//!
//! The pipeline never reads process-wide settings; everything it needs is
//! carried by a [`PipelineConfig`] handed to
//! [`SoundingProcessor::new`](crate::processor::SoundingProcessor::new).

use crate::constants::{
    DEFAULT_ATMOSPHERIC_PRESSURE, DEFAULT_INITIAL_UNIT_WEIGHT, DEFAULT_MAX_ITERATIONS,
    DEFAULT_MIN_LAYER_THICKNESS, DEFAULT_WATER_UNIT_WEIGHT,
};
use crate::error::{GefError, Result};
use crate::models::{SemanticColumn, Unit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How missing values inside a column are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingValuePolicy {
    /// Keep gaps as missing markers
    Keep,
    /// Fill gaps linearly between the nearest present neighbours
    Interpolate,
}

/// What happens when a data row cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowErrorPolicy {
    /// Abort the whole file
    Fatal,
    /// Drop the row and record a warning
    SkipWithWarning,
}

/// Soil behaviour chart used for CPT rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationMethod {
    /// Qt with a stress exponent of one
    Robertson1990,
    /// Qtn with an iteratively refined stress exponent
    Robertson2016,
    /// Qt, Fr and the pore pressure ratio Bq; needs a u2 column
    BeenJefferies,
}

/// Settings of the ratio calculation and soil classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationConfig {
    pub method: ClassificationMethod,

    /// Normalisation base in MPa
    pub atmospheric_pressure: f64,

    /// Groundwater level below the surface in metres; overrides the header
    pub groundwater_depth: Option<f64>,

    /// Groundwater level relative to the vertical datum in metres,
    /// converted to a depth with the sounding's ground level
    pub groundwater_elevation: Option<f64>,

    /// Unit weight used before the first refinement pass, in kN/m3
    pub initial_unit_weight: f64,

    /// Unit weight of water, in kN/m3
    pub water_unit_weight: f64,

    /// Maximum number of unit weight refinement passes
    pub max_iterations: usize,

    /// Derive soil fractions alongside the label
    pub soil_fractions: bool,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            method: ClassificationMethod::Robertson2016,
            atmospheric_pressure: DEFAULT_ATMOSPHERIC_PRESSURE,
            groundwater_depth: None,
            groundwater_elevation: None,
            initial_unit_weight: DEFAULT_INITIAL_UNIT_WEIGHT,
            water_unit_weight: DEFAULT_WATER_UNIT_WEIGHT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            soil_fractions: true,
        }
    }
}

/// Settings of the record assembler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeringConfig {
    /// Layers thinner than this (in metres) are merged into a neighbour
    pub min_layer_thickness: f64,
}

impl Default for LayeringConfig {
    fn default() -> Self {
        Self {
            min_layer_thickness: DEFAULT_MIN_LAYER_THICKNESS,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Unit the values of a column are written in, replacing the declared unit
    pub unit_overrides: BTreeMap<SemanticColumn, Unit>,

    /// No-data sentinel applied to every column, replacing declared voids
    pub missing_value: Option<f64>,

    pub missing_value_policy: MissingValuePolicy,

    pub row_error_policy: RowErrorPolicy,

    /// Drop samples above the pre-excavated depth
    pub apply_pre_excavation: bool,

    pub classification: ClassificationConfig,

    pub layering: LayeringConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            unit_overrides: BTreeMap::new(),
            missing_value: None,
            missing_value_policy: MissingValuePolicy::Keep,
            row_error_policy: RowErrorPolicy::Fatal,
            apply_pre_excavation: true,
            classification: ClassificationConfig::default(),
            layering: LayeringConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit_override(mut self, column: SemanticColumn, unit: Unit) -> Self {
        self.unit_overrides.insert(column, unit);
        self
    }

    pub fn with_missing_value(mut self, sentinel: f64) -> Self {
        self.missing_value = Some(sentinel);
        self
    }

    pub fn with_missing_value_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_value_policy = policy;
        self
    }

    pub fn with_row_error_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.row_error_policy = policy;
        self
    }

    pub fn with_pre_excavation(mut self, apply: bool) -> Self {
        self.apply_pre_excavation = apply;
        self
    }

    pub fn with_method(mut self, method: ClassificationMethod) -> Self {
        self.classification.method = method;
        self
    }

    pub fn with_atmospheric_pressure(mut self, pressure: f64) -> Self {
        self.classification.atmospheric_pressure = pressure;
        self
    }

    pub fn with_groundwater_depth(mut self, depth: f64) -> Self {
        self.classification.groundwater_depth = Some(depth);
        self
    }

    pub fn with_groundwater_elevation(mut self, elevation: f64) -> Self {
        self.classification.groundwater_elevation = Some(elevation);
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.classification.max_iterations = iterations;
        self
    }

    pub fn with_soil_fractions(mut self, enabled: bool) -> Self {
        self.classification.soil_fractions = enabled;
        self
    }

    pub fn with_min_layer_thickness(mut self, thickness: f64) -> Self {
        self.layering.min_layer_thickness = thickness;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let classification = &self.classification;

        if !(classification.atmospheric_pressure.is_finite()
            && classification.atmospheric_pressure > 0.0)
        {
            return Err(GefError::configuration(format!(
                "atmospheric_pressure must be positive, got {}",
                classification.atmospheric_pressure
            )));
        }

        if let Some(depth) = classification.groundwater_depth {
            if !depth.is_finite() {
                return Err(GefError::configuration(
                    "groundwater_depth must be a finite number",
                ));
            }
        }

        if let Some(elevation) = classification.groundwater_elevation {
            if !elevation.is_finite() {
                return Err(GefError::configuration(
                    "groundwater_elevation must be a finite number",
                ));
            }
            if classification.groundwater_depth.is_some() {
                return Err(GefError::configuration(
                    "groundwater_depth and groundwater_elevation are mutually exclusive",
                ));
            }
        }

        if !(classification.initial_unit_weight > 0.0 && classification.water_unit_weight > 0.0)
        {
            return Err(GefError::configuration("unit weights must be positive"));
        }

        if classification.max_iterations == 0 {
            return Err(GefError::configuration(
                "max_iterations must be greater than 0",
            ));
        }

        let thickness = self.layering.min_layer_thickness;
        if !(thickness.is_finite() && thickness >= 0.0) {
            return Err(GefError::configuration(format!(
                "min_layer_thickness must be zero or positive, got {}",
                thickness
            )));
        }

        if let Some(sentinel) = self.missing_value {
            if !sentinel.is_finite() {
                return Err(GefError::configuration(
                    "missing_value must be a finite number",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.classification.atmospheric_pressure, 0.1);
        assert_eq!(config.layering.min_layer_thickness, 0.2);
        assert_eq!(config.row_error_policy, RowErrorPolicy::Fatal);
    }

    #[test]
    fn test_builder_methods() {
        let config = PipelineConfig::new()
            .with_groundwater_depth(1.5)
            .with_min_layer_thickness(0.5)
            .with_method(ClassificationMethod::Robertson1990)
            .with_unit_override(SemanticColumn::ConeResistance, Unit::Kilopascal)
            .with_row_error_policy(RowErrorPolicy::SkipWithWarning);

        assert_eq!(config.classification.groundwater_depth, Some(1.5));
        assert_eq!(config.layering.min_layer_thickness, 0.5);
        assert_eq!(
            config.unit_overrides.get(&SemanticColumn::ConeResistance),
            Some(&Unit::Kilopascal)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(
            PipelineConfig::new()
                .with_atmospheric_pressure(0.0)
                .validate()
                .is_err()
        );
        assert!(
            PipelineConfig::new()
                .with_min_layer_thickness(-1.0)
                .validate()
                .is_err()
        );
        assert!(PipelineConfig::new().with_max_iterations(0).validate().is_err());
        assert!(
            PipelineConfig::new()
                .with_groundwater_elevation(f64::NAN)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_groundwater_depth_and_elevation_are_exclusive() {
        let elevation = PipelineConfig::new()
            .with_groundwater_elevation(-1.5)
            .with_method(ClassificationMethod::BeenJefferies);
        assert!(elevation.validate().is_ok());
        assert_eq!(elevation.classification.groundwater_elevation, Some(-1.5));

        let both = elevation.with_groundwater_depth(1.0);
        assert!(matches!(
            both.validate(),
            Err(GefError::Configuration { .. })
        ));
    }
}
