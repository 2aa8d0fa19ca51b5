//! Tests of the complete pipeline on GEF and BRO-XML fixtures.

pub mod bore_processing;
pub mod cpt_processing;

use crate::config::PipelineConfig;
use crate::models::{BoreRecord, CptRecord, Sounding};
use crate::processor::SoundingProcessor;

pub const CPT_FULL: &str = include_str!("../../../tests/data/cpt_full.gef");
pub const CPT_SIMPLE: &str = include_str!("../../../tests/data/cpt_simple.gef");
pub const CPT_FRICTION_RATIO: &str = include_str!("../../../tests/data/cpt_friction_ratio.gef");
pub const CPT_BRO: &str = include_str!("../../../tests/data/cpt_bro.xml");
pub const BORE_GEF: &str = include_str!("../../../tests/data/bore.gef");
pub const BORE_BRO: &str = include_str!("../../../tests/data/bore_bro.xml");

pub fn process_cpt(text: &str, config: PipelineConfig) -> CptRecord {
    match SoundingProcessor::new(config).unwrap().process(text).unwrap() {
        Sounding::Cpt(record) => record,
        Sounding::Bore(_) => panic!("Expected a CPT record"),
    }
}

pub fn process_bore(text: &str) -> BoreRecord {
    match SoundingProcessor::new(PipelineConfig::default())
        .unwrap()
        .process(text)
        .unwrap()
    {
        Sounding::Bore(record) => record,
        Sounding::Cpt(_) => panic!("Expected a bore record"),
    }
}
