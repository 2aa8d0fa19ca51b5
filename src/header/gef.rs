//! GEF header lines: `#KEY= value, value` up to `#EOH=`.

use super::{HeaderBlock, RawHeaderField};
use crate::constants::GEF_END_OF_HEADER;
use crate::error::{GefError, Result};
use crate::models::{Dialect, TestType};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::debug;

static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s*([A-Za-z0-9_]+)\s*=\s*(.*?)\s*$").expect("header line pattern is valid")
});

pub(super) fn parse_gef_header(text: &str) -> Result<HeaderBlock<'_>> {
    let mut fields = Vec::new();
    let mut offset = 0;

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let line_number = index + 1;
        offset += line.len();

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !trimmed.starts_with('#') {
            debug!("Ignoring non-header line {} before #EOH", line_number);
            continue;
        }

        let captures = HEADER_LINE.captures(trimmed).ok_or_else(|| {
            GefError::malformed_header_at(
                format!("expected '#KEY= value', found '{}'", trimmed),
                line_number,
            )
        })?;
        let key = captures[1].to_ascii_uppercase();

        if key == GEF_END_OF_HEADER {
            let test_type = detect_test_type(&fields)?;
            return Ok(HeaderBlock {
                dialect: Dialect::Gef,
                test_type,
                fields,
                data: Cow::Borrowed(&text[offset..]),
                data_line: line_number + 1,
            });
        }

        fields.push(RawHeaderField {
            key,
            value: captures[2].to_string(),
            line: line_number,
        });
    }

    Err(GefError::malformed_header(
        "missing end of header marker #EOH",
    ))
}

/// Record type from `#REPORTCODE` or `#PROCEDURECODE`
fn detect_test_type(fields: &[RawHeaderField]) -> Result<Option<TestType>> {
    let code = fields
        .iter()
        .find(|f| f.key == "REPORTCODE")
        .or_else(|| fields.iter().find(|f| f.key == "PROCEDURECODE"));

    let Some(code) = code else {
        return Ok(None);
    };
    let name = code.value_at(0).unwrap_or_default().to_ascii_lowercase();

    if name.contains("cpt") || name.contains("dis") {
        Ok(Some(TestType::Cpt))
    } else if name.contains("borehole") {
        Err(GefError::unsupported(format!(
            "'{}' is a borehole report; only CPT and BORE reports are supported",
            code.value_at(0).unwrap_or_default()
        )))
    } else if name.contains("bore") {
        Ok(Some(TestType::Bore))
    } else {
        debug!("Unknown report code '{}' at line {}", name, code.line);
        Ok(None)
    }
}
