//! Main processing engine.
//!
//! Runs one in-memory GEF or BRO-XML buffer through the whole pipeline:
//! header parsing, table reading, column normalisation, ratio calculation,
//! soil classification and layer assembly. Reading files and writing
//! tables is left to the caller.

#[cfg(test)]
pub mod tests;

use crate::assembler::assemble_layers;
use crate::classifier::{
    SoilClassifier, SoilDescription, classify_description, describe_soil, stress_exponent,
    unit_weight,
};
use crate::config::{ClassificationMethod, PipelineConfig};
use crate::constants::REFINEMENT_TOLERANCE;
use crate::error::{PipelineWarning, Result};
use crate::header::{HeaderBlock, build_metadata, parse_header, resolve_layout};
use crate::models::{
    BoreLayer, BoreRecord, Classification, CptRecord, CptRow, DerivedRatios, Layer, Measurement,
    Ratio, SiteMetadata, SoilLabel, Sounding, TestType,
};
use crate::normalizer::{normalize_bore, normalize_cpt};
use crate::ratios::RatioCalculator;
use crate::reader::read_table;
use tracing::{debug, info, warn};

/// Pipeline runner holding a validated configuration
#[derive(Debug, Clone)]
pub struct SoundingProcessor {
    config: PipelineConfig,
}

impl SoundingProcessor {
    /// Create a processor; fails if the configuration is invalid
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one GEF or BRO-XML document.
    ///
    /// The record type comes from the header; a GEF file without a report
    /// code is read as a CPT.
    pub fn process(&self, text: &str) -> Result<Sounding> {
        let header = parse_header(text)?;
        let sounding = match header.test_type.unwrap_or(TestType::Cpt) {
            TestType::Cpt => Sounding::Cpt(self.process_cpt(&header)?),
            TestType::Bore => Sounding::Bore(self.process_bore(&header)?),
        };

        let metadata = sounding.metadata();
        let name = metadata.test_id.as_deref().unwrap_or("<unnamed>");
        for warning in sounding.warnings() {
            warn!("{}: {}", name, warning);
        }
        info!(
            "Processed {} {} ({} rows, {} warnings)",
            sounding.test_type(),
            name,
            sounding.len(),
            sounding.warnings().len()
        );

        Ok(sounding)
    }

    /// Run the CPT stages on a parsed header
    pub fn process_cpt(&self, header: &HeaderBlock) -> Result<CptRecord> {
        let layout = resolve_layout(header, TestType::Cpt, &self.config)?;
        let metadata = build_metadata(header, TestType::Cpt);
        let table = read_table(&layout, &header.data, self.config.row_error_policy)?;
        let normalized = normalize_cpt(&layout, &table, &metadata, &self.config);

        let mut warnings = normalized.warnings;
        let rows = self.classify_rows(normalized.measurements, &metadata, &mut warnings);
        let layers = assemble_layers(&rows, self.config.layering.min_layer_thickness);

        Ok(CptRecord {
            metadata,
            columns: layout.columns,
            extra_columns: normalized.extra_columns,
            rows,
            layers,
            warnings,
        })
    }

    /// Run the borehole stages on a parsed header
    pub fn process_bore(&self, header: &HeaderBlock) -> Result<BoreRecord> {
        let layout = resolve_layout(header, TestType::Bore, &self.config)?;
        let metadata = build_metadata(header, TestType::Bore);
        let table = read_table(&layout, &header.data, self.config.row_error_policy)?;
        let normalized = normalize_bore(&layout, &table);

        let mut warnings = normalized.warnings;
        let layers = normalized
            .rows
            .into_iter()
            .map(|row| {
                let mut text = row.text.into_iter();
                let code = text.next().filter(|code| !code.is_empty());
                let classification = match &code {
                    Some(code) => {
                        let description = describe_soil(code, header.dialect);
                        if description == SoilDescription::Unknown {
                            warnings.push(PipelineWarning::UnknownSoilCode {
                                row: row.row,
                                code: code.clone(),
                            });
                        }
                        classify_description(description)
                    }
                    None => {
                        warnings.push(PipelineWarning::UnclassifiedSoil { row: row.row });
                        classify_description(SoilDescription::Unknown)
                    }
                };

                BoreLayer {
                    row: row.row,
                    layer: Layer {
                        depth_top: row.top,
                        depth_bottom: row.bottom,
                        label: classification.label,
                        fractions: classification
                            .fractions
                            .filter(|_| self.config.classification.soil_fractions),
                        soil_code: code,
                        remarks: text.collect(),
                    },
                    properties: row.properties,
                }
            })
            .collect();

        Ok(BoreRecord {
            metadata,
            columns: layout.columns,
            property_columns: normalized.property_columns,
            layers,
            warnings,
        })
    }

    /// Derive ratios and classify every measurement, refining unit weights
    /// and stress exponents from the classification until they settle
    fn classify_rows(
        &self,
        measurements: Vec<Measurement>,
        metadata: &SiteMetadata,
        warnings: &mut Vec<PipelineWarning>,
    ) -> Vec<CptRow> {
        let config = &self.config.classification;
        let calculator = RatioCalculator::new(config, metadata)
            .with_groundwater_depth(self.groundwater_depth(metadata, warnings));
        let classifier = SoilClassifier::new(config);

        let mut unit_weights = vec![config.initial_unit_weight; measurements.len()];
        let mut exponents = vec![1.0; measurements.len()];
        let mut passes = 0;

        let (ratios, classifications) = loop {
            let ratios = calculator.calculate(&measurements, &unit_weights, &exponents);
            let classifications: Vec<Classification> =
                ratios.iter().map(|r| classifier.classify(r)).collect();
            passes += 1;
            if passes >= config.max_iterations {
                break (ratios, classifications);
            }

            let (next_weights, next_exponents) = self.refine(
                &measurements,
                &ratios,
                &classifications,
                calculator.groundwater_depth(),
                (&unit_weights, &exponents),
            );
            let change = max_change(&unit_weights, &next_weights)
                .max(max_change(&exponents, &next_exponents));
            if change <= REFINEMENT_TOLERANCE {
                break (ratios, classifications);
            }
            unit_weights = next_weights;
            exponents = next_exponents;
        };
        debug!("Classification settled after {} passes", passes);

        measurements
            .into_iter()
            .zip(ratios)
            .zip(classifications)
            .map(|((measurement, ratios), classification)| {
                if let Ratio::Undefined(reason) = ratios.friction_ratio {
                    warnings.push(PipelineWarning::UndefinedRatio {
                        row: measurement.row,
                        reason,
                    });
                }
                if classification.label == SoilLabel::Unclassified {
                    warnings.push(PipelineWarning::UnclassifiedSoil {
                        row: measurement.row,
                    });
                }
                CptRow {
                    measurement,
                    ratios,
                    classification,
                }
            })
            .collect()
    }

    /// Groundwater depth below the surface: the configured depth, else the
    /// configured elevation measured down from the ground level, else the
    /// level in the header
    fn groundwater_depth(
        &self,
        metadata: &SiteMetadata,
        warnings: &mut Vec<PipelineWarning>,
    ) -> Option<f64> {
        let config = &self.config.classification;
        if let Some(depth) = config.groundwater_depth {
            return Some(depth);
        }
        if let Some(elevation) = config.groundwater_elevation {
            match metadata.ground_level {
                Some(ground_level) => return Some(ground_level - elevation),
                None => warnings.push(PipelineWarning::UnknownGroundLevel {
                    groundwater_elevation: elevation,
                }),
            }
        }
        metadata.groundwater_level
    }

    /// Unit weights and stress exponents implied by the last pass; rows
    /// without an Ic keep their previous values
    fn refine(
        &self,
        measurements: &[Measurement],
        ratios: &[DerivedRatios],
        classifications: &[Classification],
        groundwater_depth: Option<f64>,
        (weights, exponents): (&[f64], &[f64]),
    ) -> (Vec<f64>, Vec<f64>) {
        let config = &self.config.classification;
        let mut next_weights = weights.to_vec();
        let mut next_exponents = exponents.to_vec();

        for (index, classification) in classifications.iter().enumerate() {
            let Ratio::Defined(ic) = classification.ic else {
                continue;
            };
            let below_water = groundwater_depth.is_some_and(|gw| measurements[index].depth > gw);
            next_weights[index] = unit_weight(ic, below_water);

            if config.method == ClassificationMethod::Robertson2016 {
                if let Ratio::Defined(effective) = ratios[index].effective_stress {
                    next_exponents[index] =
                        stress_exponent(ic, effective, config.atmospheric_pressure);
                }
            }
        }

        (next_weights, next_exponents)
    }
}

fn max_change(previous: &[f64], next: &[f64]) -> f64 {
    previous
        .iter()
        .zip(next)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}
