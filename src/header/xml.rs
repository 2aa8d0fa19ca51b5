//! BRO-XML documents (CPT and BHR-GT), flattened into header fields.
//!
//! Field keys are the local element names of the metadata the pipeline
//! uses. Column declarations become `parameters/<name>` fields and the
//! text encoding attributes become `tokenSeparator`, `blockSeparator`
//! and `decimalSeparator`. Borehole layers are rewritten as a `;`
//! separated data block with the soil name as a quoted trailing token.

use super::{HeaderBlock, RawHeaderField};
use crate::error::{GefError, Result};
use crate::models::{Dialect, TestType};
use roxmltree::{Document, Node};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Metadata elements recorded by their first occurrence
const SCALAR_ELEMENTS: &[&str] = &[
    "broId",
    "offset",
    "verticalDatum",
    "localVerticalReferencePoint",
    "predrilledDepth",
    "finalDepth",
    "coneSurfaceQuotient",
    "groundwaterLevel",
    "cptStandard",
    "qualityClass",
];

const DATE_ELEMENTS: &[&str] = &["researchReportDate", "descriptionReportDate"];

const ENCODING_ATTRIBUTES: &[&str] = &["decimalSeparator", "tokenSeparator", "blockSeparator"];

pub(super) fn parse_bro_header(text: &str) -> Result<HeaderBlock<'static>> {
    let doc = Document::parse(text)?;
    let test_type = detect_test_type(&doc)?;
    let line_of = |node: &Node| doc.text_pos_at(node.range().start).row as usize;

    let mut fields: Vec<RawHeaderField> = Vec::new();

    let mut values: Option<(String, usize)> = None;
    let mut layer_rows: Vec<String> = Vec::new();

    for node in doc.descendants().filter(Node::is_element) {
        let name = node.tag_name().name();
        let line = line_of(&node);

        match name {
            _ if SCALAR_ELEMENTS.contains(&name) => {
                if let Some(text) = element_text(&node) {
                    push(&mut fields, name.to_string(), text.trim(), line);
                }
            }
            _ if DATE_ELEMENTS.contains(&name) => {
                if let Some(date) = child(&node, "date").as_ref().and_then(element_text) {
                    push(&mut fields, name.to_string(), date.trim(), line);
                }
            }
            "pos" => {
                let prefix = node
                    .ancestors()
                    .map(|a| a.tag_name().name())
                    .find(|n| n.ends_with("Location"))
                    .unwrap_or("location");
                if let Some(text) = element_text(&node) {
                    push(&mut fields, format!("{}/pos", prefix), text.trim(), line);
                }
                if let Some(srs) = node.parent().and_then(|p| p.attribute("srsName")) {
                    push(&mut fields, format!("{}/srsName", prefix), srs.trim(), line);
                }
            }
            "parameters" if test_type == TestType::Cpt => {
                for parameter in node.children().filter(Node::is_element) {
                    let value = parameter.text().unwrap_or_default();
                    push(
                        &mut fields,
                        format!("parameters/{}", parameter.tag_name().name()),
                        value.trim(),
                        line_of(&parameter),
                    );
                }
            }
            "TextEncoding" => {
                for attribute in ENCODING_ATTRIBUTES {
                    // separators may be whitespace, so they are kept untrimmed
                    if let Some(value) = node.attribute(*attribute) {
                        push(&mut fields, attribute.to_string(), value, line);
                    }
                }
            }
            "values" if values.is_none() => {
                values = Some((node.text().unwrap_or_default().trim().to_string(), line));
            }
            "layer" if test_type == TestType::Bore => {
                if let Some(row) = layer_row(&node) {
                    layer_rows.push(row);
                } else {
                    warn!("Skipping borehole layer at line {} without boundaries", line);
                }
            }
            _ => {}
        }
    }

    let (data, data_line) = match test_type {
        TestType::Cpt => values.ok_or_else(|| {
            GefError::malformed_header("CPT document has no cptResult values element")
        })?,
        TestType::Bore => (layer_rows.join("\n"), 1),
    };

    debug!(
        "BRO-XML {} document: {} fields, {} bytes of data",
        test_type,
        fields.len(),
        data.len()
    );

    Ok(HeaderBlock {
        dialect: Dialect::BroXml,
        test_type: Some(test_type),
        fields,
        data: Cow::Owned(data),
        data_line,
    })
}

/// Record `key` unless an earlier element already supplied it
fn push(fields: &mut Vec<RawHeaderField>, key: String, value: &str, line: usize) {
    if fields.iter().any(|f| f.key == key) {
        return;
    }
    fields.push(RawHeaderField {
        key,
        value: value.to_string(),
        line,
    });
}

fn detect_test_type(doc: &Document) -> Result<TestType> {
    for node in doc.descendants().filter(Node::is_element) {
        match node.tag_name().name() {
            "CPT_O" | "CPT" => return Ok(TestType::Cpt),
            "BHR_GT_O" | "BHR_GT" => return Ok(TestType::Bore),
            _ => {}
        }
    }
    Err(GefError::unsupported(
        "BRO-XML document contains neither a CPT nor a BHR-GT object",
    ))
}

fn child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

fn element_text<'a>(node: &Node<'a, '_>) -> Option<&'a str> {
    node.text().map(str::trim).filter(|t| !t.is_empty())
}

/// `upper;lower;'soil name'` for one BHR-GT layer
fn layer_row(layer: &Node) -> Option<String> {
    let upper = child(layer, "upperBoundary").as_ref().and_then(element_text)?;
    let lower = child(layer, "lowerBoundary").as_ref().and_then(element_text)?;

    let soil_name = layer
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "geotechnicalSoilName")
        .or_else(|| {
            layer
                .descendants()
                .find(|n| n.is_element() && n.tag_name().name() == "soilNameNEN5104")
        })
        .as_ref()
        .and_then(element_text)
        .unwrap_or("nietGedefinieerd");

    Some(format!("{};{};'{}'", upper, lower, soil_name))
}
