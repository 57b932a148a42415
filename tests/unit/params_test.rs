//! Tests for runtime parameters

use action_runner::core::{ParamValue, ParameterSet, Primitive, WireParamValue};

#[test]
fn test_wire_values_from_json() {
    let params: ParameterSet = serde_json::from_str(
        r#"{
            "region": {"type": "wire", "value": {"kind": "string", "value": "EMEA"}},
            "years": {"type": "wire", "value": {"kind": "list", "value": ["2023", "2024"]}},
            "limit": {"type": "primitive", "value": 50}
        }"#,
    )
    .expect("valid parameters");

    assert_eq!(params.len(), 3);
    assert_eq!(params.get("region").and_then(ParamValue::as_str), Some("EMEA"));
    assert_eq!(
        params.get("years"),
        Some(&ParamValue::Wire(WireParamValue::List(vec![
            "2023".to_string(),
            "2024".to_string()
        ])))
    );
    assert_eq!(
        params.get("limit"),
        Some(&ParamValue::Primitive(Primitive::Integer(50)))
    );
}

#[test]
fn test_accessors_reject_other_types() {
    let value = ParamValue::from(3_i64);
    assert_eq!(value.as_bool(), None);
    assert_eq!(value.as_str(), None);
    assert_eq!(ParamValue::Date(0).as_str(), None);
}

#[test]
fn test_insert_and_remove() {
    let mut params = ParameterSet::new();
    assert!(params.is_empty());

    assert_eq!(params.insert("format", "pdf"), None);
    let previous = params.insert("format", "csv");
    assert_eq!(previous.as_ref().and_then(ParamValue::as_str), Some("pdf"));
    assert!(params.contains_key("format"));

    assert!(params.remove("format").is_some());
    assert!(!params.contains_key("format"));
    assert!(params.is_empty());
}

#[test]
fn test_iter_visits_every_entry() {
    let params: ParameterSet = [("a", true), ("b", false)].into_iter().collect();
    let mut names: Vec<&str> = params.iter().map(|(k, _)| k).collect();
    names.sort_unstable();
    assert_eq!(names, ["a", "b"]);
}
