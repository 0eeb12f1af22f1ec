//! Field mapping and JSONPath resolution through the public API.

use serde_json::json;
use sigma_search_eval::fields::FieldMappingTable;
use sigma_search_eval::{
    Detection, Event, EvaluatorConfig, FieldMatcher, FieldResolver, Rule, RuleEvaluator, Search,
    SearchExpr, SigmaError,
};
use std::collections::HashMap;

fn single_matcher_evaluator(matcher: FieldMatcher, mappings: FieldMappingTable) -> RuleEvaluator {
    let detection = Detection::new()
        .with_search("selection", Search::fields(vec![matcher]))
        .with_condition(SearchExpr::identifier("selection"));
    let config = EvaluatorConfig::new().with_field_mappings(mappings);
    RuleEvaluator::new(Rule::new("mapping-rule", detection), config).unwrap()
}

fn mapping(entries: &[(&str, &str)]) -> FieldMappingTable {
    let mut table = FieldMappingTable::new();
    for (field, target) in entries {
        table.add_mapping(field, target);
    }
    table
}

#[test]
fn test_nested_json_string_is_decoded() {
    let evaluator = single_matcher_evaluator(
        FieldMatcher::new("field", &[], &["1"]),
        mapping(&[("field", "$.nested.x")]),
    );

    let event = json!({"nested": "{\"x\":1}"});
    assert!(evaluator.matches(&Event::from(&event)).unwrap().matched);

    let event = json!({"nested": "{\"x\":2}"});
    assert!(!evaluator.matches(&Event::from(&event)).unwrap().matched);
}

#[test]
fn test_nested_document_without_recovery() {
    let evaluator = single_matcher_evaluator(
        FieldMatcher::new("ParentImage", &["endswith"], &["\\explorer.exe"]),
        mapping(&[("ParentImage", "$.process.parent.executable")]),
    );

    let event = json!({
        "process": {"parent": {"executable": "C:\\Windows\\explorer.exe"}}
    });
    assert!(evaluator.matches(&Event::from(&event)).unwrap().matched);
}

#[test]
fn test_recovery_disabled_by_config() {
    let detection = Detection::new()
        .with_search(
            "selection",
            Search::fields(vec![FieldMatcher::new("field", &[], &["1"])]),
        )
        .with_condition(SearchExpr::identifier("selection"));
    let config = EvaluatorConfig::new()
        .with_field_mappings(mapping(&[("field", "$.nested.x")]))
        .with_jsonpath_recovery(false);
    let evaluator = RuleEvaluator::new(Rule::new("r", detection), config).unwrap();

    let event = json!({"nested": "{\"x\":1}"});
    assert!(!evaluator.matches(&Event::from(&event)).unwrap().matched);
}

#[test]
fn test_multiple_targets_are_pooled() {
    let mappings = mapping(&[("User", "user_name"), ("User", "$.actor.alternate_names")]);
    let any = single_matcher_evaluator(FieldMatcher::new("User", &[], &["root"]), mappings.clone());
    let all = single_matcher_evaluator(
        FieldMatcher::new("User", &["all"], &["alice", "root"]),
        mappings,
    );

    let event = json!({
        "user_name": "alice",
        "actor": {"alternate_names": ["admin", "root"]},
    });
    assert!(any.matches(&Event::from(&event)).unwrap().matched);
    // "alice" and "root" come from different targets
    assert!(all.matches(&Event::from(&event)).unwrap().matched);

    let event = json!({"user_name": "alice"});
    assert!(!any.matches(&Event::from(&event)).unwrap().matched);
    assert!(!all.matches(&Event::from(&event)).unwrap().matched);
}

#[test]
fn test_mapped_field_on_string_map_event() {
    let evaluator = single_matcher_evaluator(
        FieldMatcher::new("CommandLine", &["contains"], &["whoami"]),
        mapping(&[("CommandLine", "$.payload.cmd")]),
    );

    let mut event = HashMap::new();
    event.insert(
        "payload".to_string(),
        r#"{"cmd": "cmd.exe /c whoami /all"}"#.to_string(),
    );
    assert!(evaluator.matches(&Event::from(&event)).unwrap().matched);
}

#[test]
fn test_unresolvable_paths_never_error() {
    let evaluator = single_matcher_evaluator(
        FieldMatcher::new("field", &[], &["x"]),
        mapping(&[("field", "$.a.b.c")]),
    );

    for event in [
        json!({}),
        json!({"a": null}),
        json!({"a": {"b": 5}}),
        json!({"a": "not json"}),
        json!({"a": "{\"b\": []}"}),
        json!([1, 2, 3]),
    ] {
        let result = evaluator.matches(&Event::from(&event)).unwrap();
        assert!(!result.matched, "unexpected match for {event}");
    }
}

#[test]
fn test_wildcard_paths_collect_every_match() {
    let evaluator = single_matcher_evaluator(
        FieldMatcher::new("DestinationPort", &[], &["4444"]),
        mapping(&[("DestinationPort", "$.connections[*].port")]),
    );

    let event = json!({
        "connections": [{"port": 443}, {"port": 4444}, {"host": "no-port"}]
    });
    assert!(evaluator.matches(&Event::from(&event)).unwrap().matched);
}

#[test]
fn test_mapping_table_from_yaml() -> anyhow::Result<()> {
    let mappings = FieldMappingTable::from_yaml_str(
        r#"
Image:
  - process.executable
  - $.process.path
User: user.name
"#,
    )?;
    let resolver = FieldResolver::new(&mappings)?;
    assert!(resolver.has_mapping("Image"));
    assert!(resolver.has_mapping("User"));
    assert!(!resolver.has_mapping("CommandLine"));

    let event = json!({"process": {"path": "C:\\a.exe"}, "user.name": "bob"});
    let images = resolver.candidates("Image", &Event::from(&event))?;
    // process.executable is absent and contributes no candidate
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].as_ref(), &json!("C:\\a.exe"));
    Ok(())
}

#[test]
fn test_invalid_json_path_is_a_definition_error() {
    let config = EvaluatorConfig::new().with_field_mappings(mapping(&[("f", "$[?(@.a == 1)]")]));
    let err = RuleEvaluator::new(Rule::new("r", Detection::new()), config).unwrap_err();
    assert!(matches!(err, SigmaError::InvalidJsonPath(_)));
    assert!(err.is_rule_definition_error());
}
