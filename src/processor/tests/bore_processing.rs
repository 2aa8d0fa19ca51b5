//! Borehole processing tests

use super::{BORE_BRO, BORE_GEF, process_bore};
use crate::error::PipelineWarning;
use crate::models::{Dialect, SoilLabel, TestType};

#[test]
fn test_gef_bore_metadata() {
    let record = process_bore(BORE_GEF);
    let metadata = &record.metadata;

    assert_eq!(metadata.test_id.as_deref(), Some("B12"));
    assert_eq!(metadata.project_id.as_deref(), Some("2010-017"));
    assert_eq!(metadata.test_type, Some(TestType::Bore));
    assert_eq!(metadata.ground_level, Some(0.2));
    assert_eq!(metadata.location.as_ref().map(|l| l.x), Some(132010.0));
}

#[test]
fn test_gef_bore_layers() {
    let record = process_bore(BORE_GEF);

    assert_eq!(
        record.labels(),
        vec![
            SoilLabel::Sand,
            SoilLabel::Clay,
            SoilLabel::Peat,
            SoilLabel::Sand,
            SoilLabel::Unclassified,
            SoilLabel::Unclassified,
        ]
    );

    let top = &record.layers[0].layer;
    assert_eq!((top.depth_top, top.depth_bottom), (0.0, 0.5));
    assert_eq!(top.soil_code.as_deref(), Some("Zs1h1"));
    assert_eq!(top.remarks, vec!["bruin".to_string()]);
    let fractions = top.fractions.unwrap();
    assert!((fractions.sand - 0.9).abs() < 1e-9);
    assert!((fractions.silt - 0.05).abs() < 1e-9);

    let clay = &record.layers[1].layer;
    assert_eq!(clay.remarks, vec!["grijs".to_string(), "slap".to_string()]);

    // NBE is a known code without soil fractions
    assert_eq!(record.layers[4].layer.fractions, None);
}

#[test]
fn test_unknown_soil_code_is_a_warning() {
    let record = process_bore(BORE_GEF);
    assert_eq!(
        record.warnings,
        vec![PipelineWarning::UnknownSoilCode {
            row: 6,
            code: "Qq9".to_string(),
        }]
    );
}

#[test]
fn test_bro_bore_layers() {
    let record = process_bore(BORE_BRO);

    assert_eq!(record.metadata.dialect, Some(Dialect::BroXml));
    assert_eq!(record.metadata.test_id.as_deref(), Some("BHR000000108193"));
    assert_eq!(
        record.labels(),
        vec![
            SoilLabel::Sand,
            SoilLabel::SiltyClay,
            SoilLabel::Peat,
            SoilLabel::Loam,
            SoilLabel::Unclassified,
        ]
    );

    let loam = record.layers[3].layer.fractions.unwrap();
    assert!(loam.is_normalized());
    assert!((loam.gravel - 0.25).abs() < 1e-9);

    let last = &record.layers[4].layer;
    assert_eq!((last.depth_top, last.depth_bottom), (3.0, 3.5));
    assert_eq!(last.soil_code.as_deref(), Some("nietGedefinieerd"));
    assert!(record.warnings.is_empty());
}

#[test]
fn test_bore_layers_are_contiguous() {
    let record = process_bore(BORE_GEF);
    for pair in record.layers.windows(2) {
        assert_eq!(pair[0].layer.depth_bottom, pair[1].layer.depth_top);
    }
}
