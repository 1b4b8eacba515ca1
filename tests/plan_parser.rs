use iac_explain::analyzer::PlanParser;
use iac_explain::analyzer::model::Action;
use iac_explain::analyzer::plan::PlanError;
use serde_json::json;

const WEB_STACK: &str = include_str!("fixtures/plans/web_stack.json");

#[test]
fn test_summary_counts_each_action() {
    let plan = PlanParser::parse(WEB_STACK).unwrap();
    let summary = plan.summary();

    // The replaced database counts as one add and one destroy.
    assert_eq!(summary.adds, 2);
    assert_eq!(summary.changes, 1);
    assert_eq!(summary.destroys, 2);
    assert_eq!(summary.total_resources, 5);
    assert_eq!(plan.terraform_version(), "1.6.6");
    assert_eq!(plan.format_version(), "1.2");
}

#[test]
fn test_classification_is_single_action() {
    let plan = PlanParser::parse(WEB_STACK).unwrap();
    let actions: Vec<(String, Action)> = plan
        .resource_changes()
        .into_iter()
        .map(|r| (r.address, r.action))
        .collect();

    assert_eq!(
        actions,
        vec![
            ("aws_s3_bucket.logs".to_string(), Action::Create),
            ("aws_security_group.web".to_string(), Action::Update),
            ("aws_db_instance.main".to_string(), Action::Create),
            ("module.assets.google_storage_bucket.assets".to_string(), Action::Delete),
            ("azurerm_storage_account.archive".to_string(), Action::NoOp),
        ]
    );
}

#[test]
fn test_filters() {
    let plan = PlanParser::parse(WEB_STACK).unwrap();

    assert_eq!(plan.by_provider("aws").len(), 3);
    assert_eq!(plan.by_provider("registry.terraform.io/hashicorp/google").len(), 1);
    assert_eq!(plan.by_type("azurerm_storage_account").len(), 1);
    assert_eq!(plan.by_action(Action::Delete).len(), 1);
    assert!(plan.by_type("aws_lambda_function").is_empty());
}

#[test]
fn test_drift_of_updated_security_group() {
    let plan = PlanParser::parse(WEB_STACK).unwrap();
    let drift = plan.drift();

    assert_eq!(drift.changed_resources, 1);
    let fields: Vec<&str> = drift.details.iter().map(|d| d.field.as_str()).collect();
    assert_eq!(fields, vec!["egress", "ingress"]);
    assert!(drift.details.iter().all(|d| d.addr == "aws_security_group.web"));
}

#[test]
fn test_rejects_malformed_json() {
    assert!(matches!(PlanParser::parse("{\"format_version\": "), Err(PlanError::Json(_))));
}

#[test]
fn test_rejects_invalid_structure_with_field_paths() {
    let raw = json!({
        "format_version": "1.2",
        "terraform_version": "1.6.6",
        "resource_changes": [
            {
                "address": "aws_s3_bucket.a",
                "mode": "managed",
                "type": "aws_s3_bucket",
                "name": "a",
                "provider_name": "aws",
                "change": {"actions": ["create"], "before": {"acl": "private"}, "after": {}}
            },
            {
                "address": "aws_s3_bucket.b",
                "mode": "managed",
                "type": "aws_s3_bucket",
                "name": "b",
                "provider_name": "aws",
                "change": {"actions": ["rebuild"]}
            }
        ]
    });

    let err = PlanParser::from_value(&raw).unwrap_err();
    let PlanError::Validation(validation) = err else {
        panic!("expected a validation error");
    };
    let paths = validation.paths();
    assert!(paths.contains(&"resource_changes[0].change.before"));
    assert!(paths.contains(&"resource_changes[1].change.actions[0]"));
}

#[test]
fn test_empty_plan() {
    let plan = PlanParser::from_value(&json!({
        "format_version": "1.2",
        "terraform_version": "1.6.6",
        "resource_changes": []
    }))
    .unwrap();
    assert_eq!(plan.summary().total_resources, 0);
    assert!(plan.resource_changes().is_empty());
}
