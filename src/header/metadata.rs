//! Site metadata extraction.

use super::HeaderBlock;
use crate::constants::{MEASUREMENTTEXT_CONE_ID, NAP_HEIGHT_SYSTEM, measurement_var};
use crate::models::{Dialect, Location, SiteMetadata, TestType};
use chrono::NaiveDate;
use tracing::warn;

/// Collect site metadata from the header of a record of type `test_type`
pub fn build_metadata(header: &HeaderBlock, test_type: TestType) -> SiteMetadata {
    let mut metadata = match header.dialect {
        Dialect::Gef => gef_metadata(header, test_type),
        Dialect::BroXml => bro_metadata(header),
    };
    metadata.dialect = Some(header.dialect);
    metadata.test_type = Some(test_type);
    metadata
}

fn gef_metadata(header: &HeaderBlock, test_type: TestType) -> SiteMetadata {
    let project_id = header.get("PROJECTID").and_then(|f| match test_type {
        // CPT project ids are written as `client, number`
        TestType::Cpt => f.value_at(1).or_else(|| f.value_at(0)),
        TestType::Bore => f.value_at(0),
    });

    let location = header.get("XYID").and_then(|f| {
        match (f.value_at(0), f.number_at(1), f.number_at(2)) {
            (Some(srs), Some(x), Some(y)) => Some(Location {
                srs_name: srs.to_string(),
                x,
                y,
            }),
            _ => {
                warn!("Could not parse #XYID '{}' at line {}", f.value.trim(), f.line);
                None
            }
        }
    });

    let (ground_level, vertical_datum) = match header.get("ZID") {
        Some(f) => {
            let datum = f.value_at(0).map(|code| match code.parse::<f64>() {
                Ok(n) if n as i64 == NAP_HEIGHT_SYSTEM => "NAP".to_string(),
                _ => code.to_string(),
            });
            (f.number_at(1), datum)
        }
        None => (None, None),
    };

    let date = ["STARTDATE", "FILEDATE"].iter().find_map(|key| {
        let field = header.get(key)?;
        let parsed = gef_date(&field.values());
        if parsed.is_none() {
            warn!("Could not parse #{} '{}'", key, field.value.trim());
        }
        parsed
    });

    SiteMetadata {
        test_id: header.get("TESTID").and_then(|f| f.value_at(0)).map(str::to_string),
        project_id: project_id.map(str::to_string),
        location,
        ground_level,
        vertical_datum,
        date,
        cone_area_quotient: header.measurement_var(measurement_var::CONE_AREA_QUOTIENT),
        cone_id: header
            .numbered_value("MEASUREMENTTEXT", MEASUREMENTTEXT_CONE_ID)
            .map(str::to_string),
        pre_excavated_depth: header.measurement_var(measurement_var::PRE_EXCAVATED_DEPTH),
        groundwater_level: header.measurement_var(measurement_var::GROUNDWATER_LEVEL),
        final_depth: header.measurement_var(measurement_var::END_DEPTH),
        inclination_present: header
            .measurement_var(measurement_var::INCLINATION_PRESENT)
            .map(|v| v != 0.0),
        ..Default::default()
    }
}

fn gef_date(values: &[&str]) -> Option<NaiveDate> {
    let year = values.first()?.parse::<i32>().ok()?;
    let month = values.get(1)?.parse::<u32>().ok()?;
    let day = values.get(2)?.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn bro_metadata(header: &HeaderBlock) -> SiteMetadata {
    let number = |key: &str| header.text(key).and_then(|v| v.parse::<f64>().ok());

    let date = header
        .text("researchReportDate")
        .or_else(|| header.text("descriptionReportDate"))
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok());

    SiteMetadata {
        test_id: header.text("broId").map(str::to_string),
        location: bro_location(header, "deliveredLocation"),
        standardized_location: bro_location(header, "standardizedLocation"),
        ground_level: number("offset"),
        vertical_datum: header.text("verticalDatum").map(str::to_string),
        date,
        cone_area_quotient: number("coneSurfaceQuotient"),
        pre_excavated_depth: number("predrilledDepth"),
        groundwater_level: number("groundwaterLevel"),
        final_depth: number("finalDepth"),
        ..Default::default()
    }
}

fn bro_location(header: &HeaderBlock, prefix: &str) -> Option<Location> {
    let pos = header.text(&format!("{}/pos", prefix))?;
    let (x, y) = parse_position(pos)?;
    Some(Location {
        srs_name: header
            .text(&format!("{}/srsName", prefix))
            .unwrap_or_default()
            .to_string(),
        x,
        y,
    })
}

/// Parse a `gml:pos` written as `x y`, `x,y` or `x;y`
pub(crate) fn parse_position(pos: &str) -> Option<(f64, f64)> {
    let parts: Vec<&str> = pos
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 2 {
        warn!("Could not parse position '{}'", pos);
        return None;
    }
    Some((parts[0].parse().ok()?, parts[1].parse().ok()?))
}
