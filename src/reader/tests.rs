use super::*;
use crate::config::PipelineConfig;
use crate::header::{parse_header, resolve_layout};
use crate::models::TestType;

fn layout_for(text: &str, test_type: TestType) -> (TableLayout, String) {
    let header = parse_header(text).unwrap();
    let layout = resolve_layout(&header, test_type, &PipelineConfig::default()).unwrap();
    (layout, header.data.to_string())
}

const THREE_COLUMNS: &str = "#GEFID= 1, 1, 0
#COLUMN= 3
#COLUMNINFO= 1, m, penetration length, 1
#COLUMNINFO= 2, MPa, cone resistance, 2
#COLUMNINFO= 3, MPa, sleeve friction, 3
#COLUMNVOID= 2, -9999.0
#COLUMNVOID= 3, -9999.0
#REPORTCODE= GEF-CPT-Report, 1, 1, 0
#EOH=
";

#[test]
fn test_reads_rows_in_file_order() {
    let text = format!("{}1.0 2.5 0.05\n2.0 0 0.03\n", THREE_COLUMNS);
    let (layout, data) = layout_for(&text, TestType::Cpt);
    let table = read_table(&layout, &data, RowErrorPolicy::Fatal).unwrap();

    assert_eq!(table.rows.len(), 2);
    assert_eq!(
        table.rows[0].values,
        vec![Value::Number(1.0), Value::Number(2.5), Value::Number(0.05)]
    );
    assert_eq!(table.rows[1].row, 2);
    assert_eq!(table.rows[1].values[1], Value::Number(0.0));
}

#[test]
fn test_partial_void_row_is_kept_and_full_void_row_dropped() {
    let text = format!(
        "{}1.0 -9999 0.05\n-9999 -9999.0 -9999\n2.0 3.0 0.1\n",
        THREE_COLUMNS
    );
    let (layout, data) = layout_for(&text, TestType::Cpt);
    let table = read_table(&layout, &data, RowErrorPolicy::Fatal).unwrap();

    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.void_rows, 1);
    assert_eq!(table.rows[0].values[1], Value::Missing);
    assert_eq!(table.rows[1].row, 3);
}

#[test]
fn test_token_count_mismatch_is_row_parse_error() {
    let text = format!("{}1.0 2.5 0.05\n2.0 0.03\n", THREE_COLUMNS);
    let (layout, data) = layout_for(&text, TestType::Cpt);
    let error = read_table(&layout, &data, RowErrorPolicy::Fatal).unwrap_err();

    match error {
        GefError::RowParse { row, raw, .. } => {
            assert_eq!(row, 2);
            assert_eq!(raw, "2.0 0.03");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_non_numeric_token_names_the_column() {
    let text = format!("{}1.0 abc 0.05\n", THREE_COLUMNS);
    let (layout, data) = layout_for(&text, TestType::Cpt);
    let error = read_table(&layout, &data, RowErrorPolicy::Fatal).unwrap_err();

    match error {
        GefError::RowParse { field, .. } => assert_eq!(field.as_deref(), Some("coneResistance")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_skip_policy_records_warning() {
    let text = format!("{}1.0 2.5 0.05\n2.0 x 0.03\n3.0 4.0 0.1\n", THREE_COLUMNS);
    let (layout, data) = layout_for(&text, TestType::Cpt);
    let table = read_table(&layout, &data, RowErrorPolicy::SkipWithWarning).unwrap();

    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.warnings.len(), 1);
    assert!(matches!(
        table.warnings[0],
        PipelineWarning::RowSkipped { row: 2, .. }
    ));
}

#[test]
fn test_bore_rows_collect_trailing_text() {
    let text = "#GEFID= 1,1,0
#COLUMN= 2
#COLUMNINFO= 1, m, Laag van, 1
#COLUMNINFO= 2, m, Laag tot, 2
#COLUMNSEPARATOR= ;
#RECORDSEPARATOR= !
#REPORTCODE= GEF-BORE-Report, 1, 0, 0, -
#EOH=
0.0000e+000;2.0000e-001;'Zs1';'ZUF';'DO TGR BR';;;!
2.0000e-001;4.0000e-001;'Vz3';;'DO BR';;;!
";
    let (layout, data) = layout_for(text, TestType::Bore);
    let table = read_table(&layout, &data, RowErrorPolicy::Fatal).unwrap();

    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].values, vec![Value::Number(0.0), Value::Number(0.2)]);
    assert_eq!(table.rows[0].text, vec!["Zs1", "ZUF", "DO TGR BR"]);
    assert_eq!(table.rows[1].text, vec!["Vz3", "DO BR"]);
}

#[test]
fn test_decimal_comma() {
    let xml = r#"<?xml version="1.0"?>
<dispatchDocument xmlns:cpt="urn:cpt" xmlns:swe="urn:swe">
  <CPT_O>
    <cpt:parameters>
      <cpt:penetrationLength>ja</cpt:penetrationLength>
      <cpt:coneResistance>ja</cpt:coneResistance>
    </cpt:parameters>
    <swe:TextEncoding decimalSeparator="," tokenSeparator=" " blockSeparator=";"/>
    <cpt:values>0,5 1,25;1,0 -999999;</cpt:values>
  </CPT_O>
</dispatchDocument>"#;
    let (layout, data) = layout_for(xml, TestType::Cpt);
    let table = read_table(&layout, &data, RowErrorPolicy::Fatal).unwrap();

    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].values, vec![Value::Number(0.5), Value::Number(1.25)]);
    assert_eq!(table.rows[1].values[1], Value::Missing);
}

#[test]
fn test_void_tolerance() {
    assert!(is_void(9.9990e+003, 9999.0));
    assert!(is_void(-9999.0, -9999.0));
    assert!(!is_void(-9999.99, -9999.0));
}
