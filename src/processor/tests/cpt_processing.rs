//! CPT processing tests

use super::{CPT_BRO, CPT_FRICTION_RATIO, CPT_FULL, CPT_SIMPLE, process_cpt};
use crate::config::{ClassificationMethod, PipelineConfig};
use crate::error::{PipelineWarning, UndefinedReason};
use crate::models::{Column, DerivedColumn, Dialect, Ratio, SemanticColumn, SoilLabel};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_full_cpt_metadata() {
    let record = process_cpt(CPT_FULL, PipelineConfig::default());
    let metadata = &record.metadata;

    assert_eq!(metadata.test_id.as_deref(), Some("CPT-01"));
    assert_eq!(metadata.dialect, Some(Dialect::Gef));
    assert_eq!(metadata.ground_level, Some(-0.5));
    assert_eq!(metadata.vertical_datum.as_deref(), Some("NAP"));
    assert_eq!(metadata.groundwater_level, Some(1.0));
    assert_eq!(metadata.cone_area_quotient, Some(0.8));
    assert_eq!(metadata.cone_id.as_deref(), Some("C10CFII.P1915"));
}

#[test]
fn test_pre_excavated_rows_are_dropped() {
    let record = process_cpt(CPT_FULL, PipelineConfig::default());

    assert_eq!(record.rows.len(), 12);
    let first = &record.rows[0].measurement;
    assert_eq!(first.row, 2);
    assert_eq!(first.depth, 1.0);
    assert_eq!(first.pore_pressure_u2, Some(0.0));

    let all = process_cpt(CPT_FULL, PipelineConfig::new().with_pre_excavation(false));
    assert_eq!(all.rows.len(), 13);
    assert_eq!(all.rows[0].measurement.pore_pressure_u2, None);
}

#[test]
fn test_depths_are_non_decreasing() {
    let record = process_cpt(CPT_FULL, PipelineConfig::default());
    let depths = record.depths();
    assert!(depths.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_sand_over_clay_for_both_methods() {
    for method in [
        ClassificationMethod::Robertson1990,
        ClassificationMethod::Robertson2016,
    ] {
        let record = process_cpt(CPT_FULL, PipelineConfig::new().with_method(method));
        let labels = record.labels();

        assert!(
            labels[..6].iter().all(|l| *l == SoilLabel::Sand),
            "{method:?}: {labels:?}"
        );
        assert!(
            labels[6..].iter().all(|l| *l == SoilLabel::Clay),
            "{method:?}: {labels:?}"
        );

        assert_eq!(record.layers.len(), 2);
        assert_eq!(record.layers[0].label, SoilLabel::Sand);
        assert_close(record.layers[0].depth_top, 1.0);
        assert_close(record.layers[0].depth_bottom, 2.2);
        assert_eq!(record.layers[1].label, SoilLabel::Clay);
        assert_close(record.layers[1].depth_bottom, 3.4);
    }
}

#[test]
fn test_layers_cover_depth_range_without_gaps() {
    let record = process_cpt(CPT_FULL, PipelineConfig::new().with_min_layer_thickness(0.0));
    let layers = &record.layers;

    assert_eq!(layers.first().unwrap().depth_top, 1.0);
    for pair in layers.windows(2) {
        assert_eq!(pair[0].depth_bottom, pair[1].depth_top);
    }
    assert_close(layers.last().unwrap().depth_bottom, 3.4);
}

#[test]
fn test_thin_layers_merge_into_neighbour() {
    let record = process_cpt(CPT_FULL, PipelineConfig::new().with_min_layer_thickness(2.0));

    assert_eq!(record.layers.len(), 1);
    let layer = &record.layers[0];
    assert_eq!(layer.label, SoilLabel::Clay);
    assert_close(layer.depth_top, 1.0);
    assert_close(layer.depth_bottom, 3.4);
    assert!(layer.fractions.unwrap().is_normalized());
}

#[test]
fn test_pore_pressure_correction_and_stresses() {
    let record = process_cpt(CPT_FULL, PipelineConfig::default());

    // qt = qc + u2 (1 - a) at 1.2 m
    let qt = record.rows[1].ratios.corrected_cone_resistance.value().unwrap();
    assert_close(qt, 5.2 + 0.002 * 0.2);

    // one metre below the water table
    let at_two = &record.rows[5].ratios;
    assert_close(at_two.hydrostatic_pressure.value().unwrap(), 0.00981);
    let effective = at_two.effective_stress.value().unwrap();
    let total = at_two.total_stress.value().unwrap();
    assert_close(effective, total - 0.00981);

    // above the water table there is no pore pressure
    assert_eq!(record.rows[0].ratios.hydrostatic_pressure, Ratio::Defined(0.0));
}

#[test]
fn test_configured_groundwater_overrides_header() {
    let record = process_cpt(CPT_FULL, PipelineConfig::new().with_groundwater_depth(3.0));
    assert_eq!(record.rows[5].ratios.hydrostatic_pressure, Ratio::Defined(0.0));
}

#[test]
fn test_groundwater_elevation_is_measured_from_ground_level() {
    // ground level -0.5 m, water at -3.5 m: three metres below the surface
    let by_elevation = process_cpt(
        CPT_FULL,
        PipelineConfig::new().with_groundwater_elevation(-3.5),
    );
    let by_depth = process_cpt(CPT_FULL, PipelineConfig::new().with_groundwater_depth(3.0));

    assert_eq!(by_elevation.rows[5].ratios.hydrostatic_pressure, Ratio::Defined(0.0));
    for (a, b) in by_elevation.rows.iter().zip(&by_depth.rows) {
        let (ua, ub) = (
            a.ratios.hydrostatic_pressure.value().unwrap(),
            b.ratios.hydrostatic_pressure.value().unwrap(),
        );
        assert_close(ua, ub);
    }
    assert!(
        !by_elevation
            .warnings
            .iter()
            .any(|w| matches!(w, PipelineWarning::UnknownGroundLevel { .. }))
    );
}

#[test]
fn test_groundwater_elevation_without_ground_level() {
    let record = process_cpt(
        CPT_SIMPLE,
        PipelineConfig::new().with_groundwater_elevation(-1.0),
    );

    assert_eq!(
        record.warnings[0],
        PipelineWarning::UnknownGroundLevel {
            groundwater_elevation: -1.0
        }
    );
    assert_eq!(
        record.rows[0].ratios.normalized_cone_resistance,
        Ratio::Undefined(UndefinedReason::NoNormalizationBase)
    );
    assert_ne!(record.rows[0].classification.label, SoilLabel::Unclassified);
}

#[test]
fn test_reported_friction_ratio_replaces_missing_sleeve_friction() {
    let record = process_cpt(CPT_FRICTION_RATIO, PipelineConfig::default());

    let first = &record.rows[0];
    assert_eq!(first.measurement.local_friction, None);
    assert_eq!(first.measurement.friction_ratio, Some(2.0));
    assert_close(first.ratios.friction_ratio.value().unwrap(), 2.0);
    assert_close(record.rows[1].ratios.friction_ratio.value().unwrap(), 4.0);

    assert_eq!(record.labels(), vec![SoilLabel::SiltySand, SoilLabel::Clay]);
    assert!(record.warnings.is_empty(), "{:?}", record.warnings);

    // with a water table the normalised friction ratio is derived as well
    let normalised = process_cpt(
        CPT_FRICTION_RATIO,
        PipelineConfig::new().with_groundwater_elevation(0.2),
    );
    assert!(normalised.rows[0].ratios.normalized_friction_ratio.is_defined());
    assert!(normalised.warnings.is_empty(), "{:?}", normalised.warnings);
}

#[test]
fn test_been_jefferies_classification() {
    let record = process_cpt(
        CPT_FULL,
        PipelineConfig::new().with_method(ClassificationMethod::BeenJefferies),
    );
    let labels = record.labels();

    assert!(
        labels[..6].iter().all(|l| *l == SoilLabel::Sand),
        "{labels:?}"
    );
    // soft soil with high excess pore pressure plots as clay or peat
    for row in &record.rows[6..] {
        assert!(row.classification.zone.unwrap() <= 3, "{labels:?}");
        assert!(row.classification.ic.value().unwrap() >= 2.76);
    }
    assert!(record.rows.iter().all(|r| r.classification.fractions.is_none()));
    assert!(record.rows.iter().all(|r| r.ratios.stress_exponent == Ratio::Defined(1.0)));

    // without u2 there is no pore pressure ratio to place rows with
    let no_u2 = process_cpt(
        CPT_SIMPLE,
        PipelineConfig::new()
            .with_method(ClassificationMethod::BeenJefferies)
            .with_groundwater_depth(0.5),
    );
    assert!(no_u2.labels().iter().all(|l| *l == SoilLabel::Unclassified));
}

#[test]
fn test_unit_weights_are_refined_from_classification() {
    let record = process_cpt(CPT_FULL, PipelineConfig::default());
    // cohesive soil below the water table
    assert_eq!(record.rows[8].ratios.unit_weight, 16.0);
    // granular soil above it
    assert_eq!(record.rows[0].ratios.unit_weight, 18.0);

    let single_pass = process_cpt(CPT_FULL, PipelineConfig::new().with_max_iterations(1));
    assert!(single_pass.rows.iter().all(|r| r.ratios.unit_weight == 18.0));
}

#[test]
fn test_stress_exponent_follows_method() {
    let old = process_cpt(
        CPT_FULL,
        PipelineConfig::new().with_method(ClassificationMethod::Robertson1990),
    );
    assert!(old.rows.iter().all(|r| r.ratios.stress_exponent == Ratio::Defined(1.0)));

    let new = process_cpt(CPT_FULL, PipelineConfig::default());
    let sand_exponent = new.rows[3].ratios.stress_exponent.value().unwrap();
    assert!(sand_exponent > 0.0 && sand_exponent < 1.0);
    let clay_exponent = new.rows[9].ratios.stress_exponent.value().unwrap();
    assert_eq!(clay_exponent, 1.0);
}

#[test]
fn test_soil_fractions_can_be_disabled() {
    let record = process_cpt(CPT_FULL, PipelineConfig::new().with_soil_fractions(false));
    assert!(record.rows.iter().all(|r| r.classification.fractions.is_none()));
    assert!(record.layers.iter().all(|l| l.fractions.is_none()));

    let with = process_cpt(CPT_FULL, PipelineConfig::default());
    assert!(
        with.rows
            .iter()
            .all(|r| r.classification.fractions.unwrap().is_normalized())
    );
}

#[test]
fn test_friction_ratio_scenarios() {
    let record = process_cpt(CPT_SIMPLE, PipelineConfig::default());

    let first = &record.rows[0];
    assert_eq!(first.measurement.depth, 1.0);
    assert_eq!(first.measurement.cone_resistance, Some(2.5));
    assert_eq!(first.measurement.local_friction, Some(0.05));
    assert_close(first.ratios.friction_ratio.value().unwrap(), 2.0);
    assert_ne!(first.classification.label, SoilLabel::Unclassified);

    let second = &record.rows[1];
    assert_eq!(
        second.ratios.friction_ratio,
        Ratio::Undefined(UndefinedReason::NonPositiveConeResistance)
    );
    assert_eq!(second.classification.label, SoilLabel::Unclassified);
    assert_eq!(
        record.warnings,
        vec![
            PipelineWarning::UndefinedRatio {
                row: 2,
                reason: UndefinedReason::NonPositiveConeResistance,
            },
            PipelineWarning::UnclassifiedSoil { row: 2 },
        ]
    );
}

#[test]
fn test_processing_is_idempotent() {
    let first = process_cpt(CPT_FULL, PipelineConfig::default());
    let second = process_cpt(CPT_FULL, PipelineConfig::default());
    assert_eq!(first, second);
}

#[test]
fn test_columns_by_semantic_name() {
    let record = process_cpt(CPT_SIMPLE, PipelineConfig::default());

    let qc = record
        .column(&Column::Measured(SemanticColumn::ConeResistance))
        .unwrap();
    assert_eq!(qc, vec![Some(2.5), Some(0.0)]);

    let rf = record
        .column(&Column::Derived(DerivedColumn::ComputedFrictionRatio))
        .unwrap();
    assert_eq!(rf[1], None);

    assert!(
        record
            .column(&Column::Measured(SemanticColumn::PorePressureU2))
            .is_none()
    );
}

#[test]
fn test_bro_cpt_record() {
    let record = process_cpt(CPT_BRO, PipelineConfig::default());
    let metadata = &record.metadata;

    assert_eq!(metadata.test_id.as_deref(), Some("CPT000000012345"));
    assert_eq!(metadata.dialect, Some(Dialect::BroXml));
    assert_eq!(metadata.ground_level, Some(0.25));
    assert_eq!(metadata.cone_area_quotient, Some(0.8));

    assert_eq!(record.depths(), vec![0.5, 1.0, 1.5, 2.0, 2.5]);
    let elevation = record.rows[2].measurement.elevation.unwrap();
    assert_close(elevation, -1.25);

    // reported and computed friction ratios agree
    let reported = record.rows[0].measurement.friction_ratio.unwrap();
    let computed = record.rows[0].ratios.friction_ratio.value().unwrap();
    assert_close(reported, computed);

    // without a groundwater level the non-normalised chart is used
    assert_eq!(
        record.rows[2].ratios.normalized_cone_resistance,
        Ratio::Undefined(UndefinedReason::NoNormalizationBase)
    );
    assert_eq!(record.rows[2].classification.label, SoilLabel::Clay);

    // the last row has only a penetration length
    let last = record.rows.last().unwrap();
    assert_eq!(last.measurement.cone_resistance, None);
    assert_eq!(last.classification.label, SoilLabel::Unclassified);
    assert!(
        record
            .warnings
            .contains(&PipelineWarning::UnclassifiedSoil { row: 5 })
    );
}
