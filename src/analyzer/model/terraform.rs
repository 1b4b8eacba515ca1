//! Typed records for Terraform plan JSON (`terraform show -json`).
//!
//! Only the fields the analyzers need are typed. Provider-specific state
//! (`before`, `after`, `after_unknown`, ...) stays as dynamic values.

use crate::analyzer::model::validate::{ValidationError, Validator, index, join};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// A raw action as it appears in `change.actions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    #[serde(rename = "no-op")]
    NoOp,
    Create,
    Read,
    Update,
    Delete,
}

impl ChangeAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "no-op" => Some(Self::NoOp),
            "create" => Some(Self::Create),
            "read" => Some(Self::Read),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Whether a resource is managed or a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Managed,
    Data,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "managed" => Some(Self::Managed),
            "data" => Some(Self::Data),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub actions: Vec<ChangeAction>,
    pub before: Option<Value>,
    pub after: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_unknown: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_sensitive: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_sensitive: Option<Value>,
}

impl Change {
    pub fn has(&self, action: ChangeAction) -> bool {
        self.actions.contains(&action)
    }
}

/// One entry of `resource_changes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceChange {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_address: Option<String>,
    pub mode: Mode,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub provider_name: String,
    pub change: Change,
}

/// A validated Terraform plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerraformPlan {
    pub format_version: String,
    pub terraform_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_values: Option<Map<String, Value>>,
    pub resource_changes: Vec<ResourceChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_state: Option<Map<String, Value>>,
}

impl TerraformPlan {
    /// Validate a raw plan document. Fails with every offending field path;
    /// never returns a partially built plan.
    pub fn from_value(raw: &Value) -> Result<Self, ValidationError> {
        let mut v = Validator::new();
        if v.object(raw, "").is_none() {
            return Err(v.into_error());
        }

        let format_version = v.require_str(raw, "format_version", "");
        let terraform_version = v.require_str(raw, "terraform_version", "");

        let variables = v.optional_object(raw, "variables", "");
        if let Some(vars) = &variables {
            for (name, entry) in vars {
                if !entry.is_object() {
                    v.issue(join("variables", name), "expected object with a `value` field");
                }
            }
        }
        let planned_values = v.optional_object(raw, "planned_values", "");
        let configuration = v.optional_object(raw, "configuration", "");
        let prior_state = v.optional_object(raw, "prior_state", "");
        if let Some(prior) = raw.get("prior_state").filter(|p| p.is_object()) {
            v.require_str(prior, "format_version", "prior_state");
            v.require_str(prior, "terraform_version", "prior_state");
        }

        let mut resource_changes = Vec::new();
        let mut seen = HashSet::new();
        if let Some(items) = v.require_array(raw, "resource_changes", "") {
            for (i, item) in items.iter().enumerate() {
                let path = index("resource_changes", i);
                if let Some(rc) = validate_resource_change(&mut v, item, &path) {
                    if !seen.insert(rc.address.clone()) {
                        v.issue(join(&path, "address"), format!("duplicate address `{}`", rc.address));
                    }
                    resource_changes.push(rc);
                }
            }
        }

        v.finish(|| TerraformPlan {
            format_version: format_version.unwrap_or_default().to_string(),
            terraform_version: terraform_version.unwrap_or_default().to_string(),
            variables,
            planned_values,
            resource_changes,
            configuration,
            prior_state,
        })
    }
}

fn validate_resource_change(v: &mut Validator, item: &Value, path: &str) -> Option<ResourceChange> {
    v.object(item, path)?;

    let address = v.require_str(item, "address", path);
    let module_address = v.optional_str(item, "module_address", path);
    let mode = v.require_str(item, "mode", path).and_then(|m| {
        let parsed = Mode::parse(m);
        if parsed.is_none() {
            v.issue(join(path, "mode"), format!("expected `managed` or `data`, received `{}`", m));
        }
        parsed
    });
    let resource_type = v.require_str(item, "type", path);
    let name = v.require_str(item, "name", path);
    let provider_name = v.require_str(item, "provider_name", path);
    let change = v
        .require_object(item, "change", path)
        .and_then(|change| validate_change(v, change, &join(path, "change")));

    Some(ResourceChange {
        address: address?.to_string(),
        module_address: module_address.map(str::to_string),
        mode: mode?,
        resource_type: resource_type?.to_string(),
        name: name?.to_string(),
        provider_name: provider_name?.to_string(),
        change: change?,
    })
}

fn validate_change(v: &mut Validator, change: &Value, path: &str) -> Option<Change> {
    let mut actions = Vec::new();
    let mut actions_ok = true;
    if let Some(raw_actions) = v.require_array(change, "actions", path) {
        let actions_path = join(path, "actions");
        for (i, raw) in raw_actions.iter().enumerate() {
            match raw.as_str().and_then(ChangeAction::parse) {
                Some(action) => actions.push(action),
                None => {
                    actions_ok = false;
                    v.issue(
                        index(&actions_path, i),
                        format!("unknown action {}", raw),
                    );
                }
            }
        }
    } else {
        actions_ok = false;
    }

    let before = change.get("before").filter(|b| !b.is_null()).cloned();
    let after = change.get("after").filter(|a| !a.is_null()).cloned();

    // Creation starts from nothing and destruction ends in nothing.
    if actions == [ChangeAction::Create] && before.is_some() {
        v.issue(join(path, "before"), "must be null for a create-only change");
    }
    if actions == [ChangeAction::Delete] && after.is_some() {
        v.issue(join(path, "after"), "must be null for a delete-only change");
    }

    if !actions_ok {
        return None;
    }

    Some(Change {
        actions,
        before,
        after,
        after_unknown: change.get("after_unknown").cloned(),
        before_sensitive: change.get("before_sensitive").cloned(),
        after_sensitive: change.get("after_sensitive").cloned(),
    })
}

/// The single classified action of a resource change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
    #[serde(rename = "no-op")]
    NoOp,
}

impl Action {
    /// Priority: create > delete > update, anything else is a no-op.
    /// A replace (`["delete", "create"]`) therefore classifies as `Create`.
    pub fn classify(actions: &[ChangeAction]) -> Self {
        if actions.contains(&ChangeAction::Create) {
            Self::Create
        } else if actions.contains(&ChangeAction::Delete) {
            Self::Delete
        } else if actions.contains(&ChangeAction::Update) {
            Self::Update
        } else {
            Self::NoOp
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "no-op" | "noop" => Some(Self::NoOp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::NoOp => "no-op",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Flattened, classified view of a `ResourceChange`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub address: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub provider: String,
    pub action: Action,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl ResourceInfo {
    pub(crate) fn from_change(change: &ResourceChange) -> Self {
        Self {
            address: change.address.clone(),
            resource_type: change.resource_type.clone(),
            name: change.name.clone(),
            provider: change.provider_name.clone(),
            action: Action::classify(&change.change.actions),
            before: change.change.before.clone(),
            after: change.change.after.clone(),
        }
    }

    /// Last segment of the provider address:
    /// `registry.terraform.io/hashicorp/aws` -> `aws`.
    pub fn provider_short_name(&self) -> &str {
        provider_short_name(&self.provider)
    }
}

pub fn provider_short_name(provider: &str) -> &str {
    provider.rsplit('/').next().unwrap_or(provider)
}

/// Counts derived from raw action lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub adds: usize,
    pub changes: usize,
    pub destroys: usize,
    pub total_resources: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(actions: &[ChangeAction]) -> Action {
        Action::classify(actions)
    }

    #[test]
    fn test_classification_priority() {
        use ChangeAction::*;
        assert_eq!(change(&[Create]), Action::Create);
        assert_eq!(change(&[Update]), Action::Update);
        assert_eq!(change(&[Delete]), Action::Delete);
        assert_eq!(change(&[Delete, Create]), Action::Create);
        assert_eq!(change(&[Create, Delete]), Action::Create);
        assert_eq!(change(&[Read]), Action::NoOp);
        assert_eq!(change(&[NoOp]), Action::NoOp);
        assert_eq!(change(&[]), Action::NoOp);
    }

    #[test]
    fn test_action_serde_names() {
        assert_eq!(serde_json::to_value(Action::NoOp).unwrap(), json!("no-op"));
        assert_eq!(
            serde_json::to_value(ChangeAction::NoOp).unwrap(),
            json!("no-op")
        );
        assert_eq!(serde_json::to_value(Mode::Data).unwrap(), json!("data"));
    }

    #[test]
    fn test_provider_short_name() {
        assert_eq!(provider_short_name("registry.terraform.io/hashicorp/aws"), "aws");
        assert_eq!(provider_short_name("aws"), "aws");
    }

    #[test]
    fn test_from_value_reports_all_missing_top_level_fields() {
        let err = TerraformPlan::from_value(&json!({})).unwrap_err();
        assert_eq!(
            err.paths(),
            vec!["format_version", "terraform_version", "resource_changes"]
        );
    }

    #[test]
    fn test_from_value_rejects_non_object_root() {
        let err = TerraformPlan::from_value(&json!([1, 2])).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(err.issues[0].message.contains("expected object"));
    }

    #[test]
    fn test_nested_field_paths() {
        let raw = json!({
            "format_version": "1.2",
            "terraform_version": "1.6.0",
            "resource_changes": [
                {
                    "address": "aws_s3_bucket.a",
                    "mode": "managed",
                    "type": "aws_s3_bucket",
                    "name": "a",
                    "provider_name": "aws",
                    "change": {"actions": ["create"], "before": null, "after": {}}
                },
                {
                    "address": "aws_s3_bucket.b",
                    "mode": "resource",
                    "type": "aws_s3_bucket",
                    "name": "b",
                    "provider_name": "aws",
                    "change": {"actions": ["explode"], "before": null, "after": {}}
                }
            ]
        });
        let err = TerraformPlan::from_value(&raw).unwrap_err();
        assert_eq!(
            err.paths(),
            vec!["resource_changes[1].mode", "resource_changes[1].change.actions[0]"]
        );
    }

    #[test]
    fn test_create_with_before_state_is_rejected() {
        let raw = json!({
            "format_version": "1.2",
            "terraform_version": "1.6.0",
            "resource_changes": [{
                "address": "aws_s3_bucket.a",
                "mode": "managed",
                "type": "aws_s3_bucket",
                "name": "a",
                "provider_name": "aws",
                "change": {"actions": ["create"], "before": {"acl": "private"}, "after": {}}
            }]
        });
        let err = TerraformPlan::from_value(&raw).unwrap_err();
        assert_eq!(err.paths(), vec!["resource_changes[0].change.before"]);
    }

    #[test]
    fn test_duplicate_addresses_rejected() {
        let rc = json!({
            "address": "aws_s3_bucket.a",
            "mode": "managed",
            "type": "aws_s3_bucket",
            "name": "a",
            "provider_name": "aws",
            "change": {"actions": ["no-op"], "before": {}, "after": {}}
        });
        let raw = json!({
            "format_version": "1.2",
            "terraform_version": "1.6.0",
            "resource_changes": [rc.clone(), rc]
        });
        let err = TerraformPlan::from_value(&raw).unwrap_err();
        assert_eq!(err.paths(), vec!["resource_changes[1].address"]);
    }

    #[test]
    fn test_unknown_keys_are_accepted() {
        let raw = json!({
            "format_version": "1.2",
            "terraform_version": "1.6.0",
            "output_changes": {"x": 1},
            "resource_changes": [{
                "address": "aws_s3_bucket.a",
                "mode": "managed",
                "type": "aws_s3_bucket",
                "name": "a",
                "provider_name": "aws",
                "index": 0,
                "change": {
                    "actions": ["update"],
                    "before": {"tags": {}},
                    "after": {"tags": {"env": "prod"}, "anything": [1, 2]},
                    "after_unknown": {"id": true, "versioning": [{"enabled": false}]},
                    "replace_paths": []
                }
            }]
        });
        let plan = TerraformPlan::from_value(&raw).unwrap();
        assert_eq!(plan.resource_changes.len(), 1);
        assert!(plan.resource_changes[0].change.has(ChangeAction::Update));
    }
}
