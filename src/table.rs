//! Tabular views of processed soundings.
//!
//! Converts records to polars DataFrames using the stable column names of
//! [`Column::name`](crate::models::Column::name), with the site identifier
//! and position repeated on every row so tables of many soundings can be
//! stacked.

use crate::error::Result;
use crate::models::{
    BoreRecord, Column, ColumnSpec, CptRecord, DerivedColumn, Layer, QuantityType,
    SemanticColumn, SiteMetadata, SoilFractions, Value,
};
use polars::prelude::{
    Column as PlColumn, DataFrame, IntoLazy, LazyFrame, UnionArgs, concat_lf_diagonal,
};
use std::collections::HashSet;
use tracing::debug;

const FRACTION_COLUMNS: [&str; 6] = [
    "gravelFraction",
    "sandFraction",
    "siltFraction",
    "loamFraction",
    "clayFraction",
    "peatFraction",
];

/// Columns collected under unique names; later duplicates are dropped
#[derive(Default)]
struct TableBuilder {
    columns: Vec<PlColumn>,
    names: HashSet<String>,
}

impl TableBuilder {
    fn push(&mut self, column: PlColumn) {
        let name = column.name().to_string();
        if self.names.insert(name.clone()) {
            self.columns.push(column);
        } else {
            debug!("Dropping duplicate column '{}'", name);
        }
    }

    fn numbers(&mut self, name: &str, values: Vec<Option<f64>>) {
        self.push(PlColumn::new(name.into(), values));
    }

    fn texts(&mut self, name: &str, values: Vec<Option<String>>) {
        self.push(PlColumn::new(name.into(), values));
    }

    /// Site identification repeated `rows` times
    fn site(&mut self, metadata: &SiteMetadata, rows: usize) {
        self.texts("testId", vec![metadata.test_id.clone(); rows]);
        let location = metadata.location.as_ref();
        self.numbers("x", vec![location.map(|l| l.x); rows]);
        self.numbers("y", vec![location.map(|l| l.y); rows]);
        self.numbers("groundLevel", vec![metadata.ground_level; rows]);
    }

    /// Values of a declared column, numeric or as text by its quantity type
    fn values<'a>(
        &mut self,
        column: &SemanticColumn,
        columns: &[ColumnSpec],
        values: impl Iterator<Item = Option<&'a Value>>,
    ) {
        let numeric = columns
            .iter()
            .find(|spec| &spec.column == column)
            .is_none_or(|spec| spec.quantity_type == QuantityType::Numeric);
        if numeric {
            let values = values.map(|v| v.and_then(Value::as_f64)).collect();
            self.numbers(column.name(), values);
        } else {
            let values = values.map(|v| v.and_then(value_text)).collect();
            self.texts(column.name(), values);
        }
    }

    fn fractions<'a>(&mut self, fractions: impl Iterator<Item = Option<&'a SoilFractions>>) {
        let shares: Vec<Option<[f64; 6]>> = fractions
            .map(|f| f.map(|f| f.shares().map(|(_, share)| share)))
            .collect();
        if shares.iter().all(Option::is_none) {
            return;
        }
        for (position, name) in FRACTION_COLUMNS.iter().enumerate() {
            let values = shares.iter().map(|s| s.map(|s| s[position])).collect();
            self.numbers(name, values);
        }
    }

    fn finish(self) -> Result<DataFrame> {
        Ok(DataFrame::new(self.columns)?)
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(v) => Some(v.to_string()),
        Value::Text(text) => Some(text.clone()),
        Value::Date(date) => Some(date.to_string()),
        Value::Missing => None,
    }
}

/// Layer rows shared by CPT and borehole layer tables
fn layer_table<'a>(
    metadata: &SiteMetadata,
    layers: impl Iterator<Item = &'a Layer> + Clone,
    rows: usize,
) -> TableBuilder {
    let mut table = TableBuilder::default();
    table.site(metadata, rows);
    table.numbers("depthTop", layers.clone().map(|l| Some(l.depth_top)).collect());
    table.numbers(
        "depthBottom",
        layers.clone().map(|l| Some(l.depth_bottom)).collect(),
    );
    table.numbers("thickness", layers.clone().map(|l| Some(l.thickness())).collect());
    table.numbers(
        "depthCenter",
        layers.clone().map(|l| Some(l.depth_center())).collect(),
    );
    table.numbers(
        "elevationCenter",
        layers
            .clone()
            .map(|l| l.elevation_center(metadata.ground_level))
            .collect(),
    );
    table.texts(
        "label",
        layers.clone().map(|l| Some(l.label.name().to_string())).collect(),
    );
    table.fractions(layers.map(|l| l.fractions.as_ref()));
    table
}

impl CptRecord {
    /// One row per measurement: measured columns, extras, derived ratios
    /// and the classification
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let rows = self.rows.len();
        let mut table = TableBuilder::default();
        table.site(&self.metadata, rows);
        table.push(PlColumn::new(
            "row".into(),
            self.measurements()
                .map(|m| m.row as u32)
                .collect::<Vec<u32>>(),
        ));

        for spec in self.columns.iter().filter(|spec| spec.enabled) {
            if let Some(values) = self.column(&Column::Measured(spec.column.clone())) {
                if !self.extra_columns.contains(&spec.column) {
                    table.numbers(spec.column.name(), values);
                }
            }
        }
        for (position, column) in self.extra_columns.iter().enumerate() {
            table.values(
                column,
                &self.columns,
                self.measurements().map(|m| m.extras.get(position)),
            );
        }
        for derived in DerivedColumn::ALL {
            if let Some(values) = self.column(&Column::Derived(derived)) {
                table.numbers(derived.name(), values);
            }
        }

        table.push(PlColumn::new(
            "zone".into(),
            self.rows
                .iter()
                .map(|r| r.classification.zone.map(u32::from))
                .collect::<Vec<Option<u32>>>(),
        ));
        table.texts(
            "label",
            self.labels()
                .iter()
                .map(|l| Some(l.name().to_string()))
                .collect(),
        );
        table.fractions(self.rows.iter().map(|r| r.classification.fractions.as_ref()));

        table.finish()
    }

    /// One row per assembled layer
    pub fn layers_dataframe(&self) -> Result<DataFrame> {
        layer_table(&self.metadata, self.layers.iter(), self.layers.len()).finish()
    }
}

impl BoreRecord {
    /// One row per borehole layer with its soil code, remarks and
    /// measured properties
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let layers = self.layers.iter().map(|l| &l.layer);
        let mut table = layer_table(&self.metadata, layers.clone(), self.layers.len());

        table.texts("soilCode", layers.clone().map(|l| l.soil_code.clone()).collect());
        table.texts(
            "remarks",
            layers
                .map(|l| (!l.remarks.is_empty()).then(|| l.remarks.join("; ")))
                .collect(),
        );
        for (position, column) in self.property_columns.iter().enumerate() {
            table.values(
                column,
                &self.columns,
                self.layers.iter().map(|l| l.properties.get(position)),
            );
        }

        table.finish()
    }
}

/// Stack tables of several soundings; columns missing from a table are
/// filled with nulls
pub fn concat_tables(frames: Vec<DataFrame>) -> Result<DataFrame> {
    if frames.len() <= 1 {
        return Ok(frames.into_iter().next().unwrap_or_else(DataFrame::empty));
    }
    let lazy: Vec<LazyFrame> = frames.into_iter().map(|df| df.lazy()).collect();
    Ok(concat_lf_diagonal(lazy, UnionArgs::default())?.collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::models::Sounding;
    use crate::processor::SoundingProcessor;

    const CPT: &str = "#GEFID= 1, 1, 0
#COLUMN= 3
#COLUMNINFO= 1, m, penetration length, 1
#COLUMNINFO= 2, MPa, cone resistance, 2
#COLUMNINFO= 3, MPa, local friction, 3
#TESTID= CPT-A
#XYID= 31000, 100000.0, 400000.0
#ZID= 31000, 1.5
#EOH=
1.0 0.5 0.02
1.5 0.6 0.025
2.0 8.0 0.04
";

    const BORE: &str = "#GEFID= 1, 1, 0
#COLUMN= 2
#COLUMNINFO= 1, m, upper boundary, 1
#COLUMNINFO= 2, m, lower boundary, 2
#COLUMNSEPARATOR= ;
#REPORTCODE= GEF-BORE-Report, 1, 0, 0
#TESTID= B-1
#EOH=
0.0;1.0;'Kz1';'stiff'
1.0;2.5;'Zs1';
";

    fn process(text: &str) -> Sounding {
        SoundingProcessor::new(PipelineConfig::default())
            .unwrap()
            .process(text)
            .unwrap()
    }

    #[test]
    fn test_cpt_dataframe_uses_stable_names() {
        let Sounding::Cpt(record) = process(CPT) else {
            panic!("Expected a CPT record");
        };
        let df = record.to_dataframe().unwrap();

        assert_eq!(df.height(), 3);
        for name in [
            "testId",
            "penetrationLength",
            "coneResistance",
            "localFriction",
            "depth",
            "elevation",
            "frictionRatioComputed",
            "label",
        ] {
            assert!(df.column(name).is_ok(), "missing column {name}");
        }
        let rf = df.column("frictionRatioComputed").unwrap().f64().unwrap();
        assert!((rf.get(0).unwrap() - 4.0).abs() < 1e-9);
        let elevation = df.column("elevation").unwrap().f64().unwrap();
        assert!((elevation.get(0).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_layer_dataframe_covers_record() {
        let Sounding::Cpt(record) = process(CPT) else {
            panic!("Expected a CPT record");
        };
        let df = record.layers_dataframe().unwrap();
        assert_eq!(df.height(), record.layers.len());
        let top = df.column("depthTop").unwrap().f64().unwrap();
        assert_eq!(top.get(0), Some(1.0));

        // ground level 1.5 m above the datum
        let center = df.column("depthCenter").unwrap().f64().unwrap();
        let elevation = df.column("elevationCenter").unwrap().f64().unwrap();
        for (index, layer) in record.layers.iter().enumerate() {
            let expected = (layer.depth_top + layer.depth_bottom) / 2.0;
            assert!((center.get(index).unwrap() - expected).abs() < 1e-9);
            assert!((elevation.get(index).unwrap() - (1.5 - expected)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bore_dataframe_keeps_codes_and_remarks() {
        let Sounding::Bore(record) = process(BORE) else {
            panic!("Expected a bore record");
        };
        let df = record.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);

        let codes = df.column("soilCode").unwrap().str().unwrap();
        assert_eq!(codes.get(0), Some("Kz1"));
        let remarks = df.column("remarks").unwrap().str().unwrap();
        assert_eq!(remarks.get(0), Some("stiff"));
        assert_eq!(remarks.get(1), None);

        let center = df.column("depthCenter").unwrap().f64().unwrap();
        assert_eq!(center.get(1), Some(1.75));
        // no ground level in the header
        assert_eq!(df.column("elevationCenter").unwrap().null_count(), 2);
    }

    #[test]
    fn test_concat_fills_missing_columns() {
        let Sounding::Cpt(cpt) = process(CPT) else {
            panic!("Expected a CPT record");
        };
        let Sounding::Bore(bore) = process(BORE) else {
            panic!("Expected a bore record");
        };
        let combined = concat_tables(vec![
            cpt.layers_dataframe().unwrap(),
            bore.to_dataframe().unwrap(),
        ])
        .unwrap();

        assert_eq!(combined.height(), cpt.layers.len() + 2);
        let codes = combined.column("soilCode").unwrap();
        assert_eq!(codes.null_count(), cpt.layers.len());
        assert_eq!(concat_tables(Vec::new()).unwrap().height(), 0);
    }
}
