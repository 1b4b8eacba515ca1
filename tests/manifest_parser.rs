use iac_explain::analyzer::manifest::extract;
use iac_explain::analyzer::{ManifestFormat, ManifestParser};
use std::path::Path;

const WEB: &str = include_str!("fixtures/manifests/web.yaml");
const WORKER: &str = include_str!("fixtures/manifests/worker.json");

#[test]
fn test_yaml_stream_keeps_valid_documents() {
    let result = ManifestParser::parse_yaml(WEB);

    let kinds: Vec<&str> = result.resources.iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(kinds, vec!["Deployment", "Service"]);

    assert_eq!(result.diagnostics.len(), 1);
    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.document_index, 2);
    assert_eq!(diagnostic.line, Some(33));
}

#[test]
fn test_single_json_object() {
    let result = ManifestParser::parse_json(WORKER);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.resources.len(), 1);

    let worker = &result.resources[0];
    assert_eq!(worker.name(), "worker");
    assert_eq!(worker.namespace(), None);
    assert_eq!(worker.namespace_or_default(), "default");

    let pod = worker.pod_security_context().unwrap().unwrap();
    assert_eq!(pod.run_as_non_root, Some(true));
}

#[test]
fn test_json_array_is_all_or_nothing() {
    let text = format!("[{}, {{\"kind\": \"Pod\"}}]", WORKER);
    let result = ManifestParser::parse_json(&text);
    assert!(result.resources.is_empty());
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].document_index, 1);
}

#[test]
fn test_malformed_json_reports_line() {
    let result = ManifestParser::parse_json("[\n  {\"kind\": \"Pod\",\n");
    assert!(result.resources.is_empty());
    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.diagnostics[0].line.is_some());
}

#[test]
fn test_format_from_extension() {
    assert_eq!(ManifestFormat::from_path(Path::new("a/web.yaml")), Some(ManifestFormat::Yaml));
    assert_eq!(ManifestFormat::from_path(Path::new("web.yml")), Some(ManifestFormat::Yaml));
    assert_eq!(ManifestFormat::from_path(Path::new("web.json")), Some(ManifestFormat::Json));
    assert_eq!(ManifestFormat::from_path(Path::new("Chart.lock")), None);
}

#[test]
fn test_grouping_and_filters() {
    let mut resources = ManifestParser::parse_yaml(WEB).resources;
    resources.extend(ManifestParser::parse_json(WORKER).resources);

    let by_namespace = ManifestParser::group_by_namespace(&resources);
    assert_eq!(by_namespace["shop"].len(), 2);
    assert_eq!(by_namespace["default"].len(), 1);

    let by_kind = ManifestParser::group_by_kind(&resources);
    assert_eq!(by_kind.keys().collect::<Vec<_>>(), vec!["Deployment", "Service", "StatefulSet"]);

    assert_eq!(ManifestParser::filter_by_kind(&resources, "Service").len(), 1);
    assert_eq!(ManifestParser::filter_by_namespace(&resources, "shop").len(), 2);
}

#[test]
fn test_container_extraction_from_deployment() {
    let result = ManifestParser::parse_yaml(WEB);
    let deployment = &result.resources[0];

    let containers = extract::containers(deployment.as_value()).unwrap();
    let names: Vec<&str> = containers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["app", "sidecar"]);
    assert!(containers[0].uses_latest_tag());
    assert!(containers[0].allows_privilege_escalation());
    assert!(!containers[0].has_limits());
    assert!(containers[1].has_limits());
    assert!(!containers[1].uses_latest_tag());

    // Services carry no containers.
    assert!(extract::containers(result.resources[1].as_value()).unwrap().is_empty());
}
