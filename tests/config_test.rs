//! Loading evaluator configuration from YAML files.

use serde_json::json;
use sigma_search_eval::{
    Detection, Event, EvaluatorConfig, FieldMatcher, Rule, RuleEvaluator, Search, SearchExpr,
    SigmaError,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> anyhow::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[test]
fn test_config_from_file_drives_evaluation() -> anyhow::Result<()> {
    let file = write_config(
        r#"
fieldmappings:
  Image:
    - process.executable
    - $.process.path
  CommandLine: $.payload.cmd
jsonpath_recovery: true
parallel:
  enabled: false
"#,
    )?;
    let config = EvaluatorConfig::from_file(file.path())?;
    assert!(!config.parallel.enabled);
    assert_eq!(config.parallel.min_batch_size, 64);
    assert_eq!(config.field_mappings.targets("Image").map(<[String]>::len), Some(2));

    let detection = Detection::new()
        .with_search(
            "selection",
            Search::fields(vec![
                FieldMatcher::new("Image", &["endswith"], &["\\rundll32.exe"]),
                FieldMatcher::new("CommandLine", &["contains"], &["javascript:"]),
            ]),
        )
        .with_condition(SearchExpr::identifier("selection"));
    let evaluator = RuleEvaluator::new(Rule::new("rundll32-js", detection), config)?;

    let event = json!({
        "process": {"path": "C:\\Windows\\System32\\rundll32.exe"},
        "payload": "{\"cmd\": \"rundll32.exe javascript:\\\"\\\\..\\\\mshtml\\\"\"}",
    });
    assert!(evaluator.matches(&Event::from(&event))?.matched);
    Ok(())
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EvaluatorConfig::from_file(dir.path().join("missing.yml")).unwrap_err();
    assert!(matches!(err, SigmaError::IoError(_)));
    assert!(!err.is_rule_definition_error());
}

#[test]
fn test_malformed_yaml_is_yaml_error() -> anyhow::Result<()> {
    let file = write_config("fieldmappings: [not, a, map]\n")?;
    let err = EvaluatorConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, SigmaError::YamlError(_)));
    Ok(())
}

#[test]
fn test_invalid_values_are_config_errors() -> anyhow::Result<()> {
    let file = write_config("parallel:\n  min_batch_size: 0\n")?;
    let err = EvaluatorConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, SigmaError::ConfigError(_)));
    Ok(())
}

#[test]
fn test_empty_file_yields_defaults() -> anyhow::Result<()> {
    let file = write_config("")?;
    assert_eq!(EvaluatorConfig::from_file(file.path())?, EvaluatorConfig::default());
    Ok(())
}
