//! Terraform plan parsing.
//!
//! `PlanParser` wraps a validated [`TerraformPlan`] and exposes the summary,
//! the classified resource view and simple filters over it.

use crate::analyzer::model::terraform::provider_short_name;
use crate::analyzer::model::{
    Action, ChangeAction, PlanSummary, ResourceInfo, TerraformPlan, ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plan does not match the expected structure: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone)]
pub struct PlanParser {
    plan: TerraformPlan,
}

impl PlanParser {
    /// Parse raw `terraform show -json` output.
    pub fn parse(raw: &str) -> Result<Self, PlanError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, PlanError> {
        let plan = TerraformPlan::from_value(value)?;
        log::debug!(
            "Parsed plan (format {}, terraform {}) with {} resource changes",
            plan.format_version,
            plan.terraform_version,
            plan.resource_changes.len()
        );
        Ok(Self { plan })
    }

    /// Counts each action independently: a replace (`["delete", "create"]`)
    /// adds one to both `adds` and `destroys`.
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary {
            total_resources: self.plan.resource_changes.len(),
            ..PlanSummary::default()
        };
        for rc in &self.plan.resource_changes {
            if rc.change.has(ChangeAction::Create) {
                summary.adds += 1;
            }
            if rc.change.has(ChangeAction::Delete) {
                summary.destroys += 1;
            }
            if rc.change.has(ChangeAction::Update) {
                summary.changes += 1;
            }
        }
        summary
    }

    pub fn resource_changes(&self) -> Vec<ResourceInfo> {
        self.plan
            .resource_changes
            .iter()
            .map(ResourceInfo::from_change)
            .collect()
    }

    pub fn by_action(&self, action: Action) -> Vec<ResourceInfo> {
        self.filtered(|r| r.action == action)
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<ResourceInfo> {
        self.filtered(|r| r.resource_type == resource_type)
    }

    /// Matches either the full provider address or its short name.
    pub fn by_provider(&self, provider: &str) -> Vec<ResourceInfo> {
        let wanted = provider_short_name(provider);
        self.filtered(|r| r.provider == provider || r.provider_short_name() == wanted)
    }

    fn filtered(&self, keep: impl Fn(&ResourceInfo) -> bool) -> Vec<ResourceInfo> {
        self.resource_changes().into_iter().filter(|r| keep(r)).collect()
    }

    pub fn terraform_version(&self) -> &str {
        &self.plan.terraform_version
    }

    pub fn format_version(&self) -> &str {
        &self.plan.format_version
    }

    pub fn raw(&self) -> &TerraformPlan {
        &self.plan
    }

    /// Top-level attribute differences for every resource classified as an
    /// in-place update.
    pub fn drift(&self) -> DriftReport {
        let mut report = DriftReport::default();
        for resource in self.by_action(Action::Update) {
            let details = diff_top_level(&resource);
            if !details.is_empty() {
                report.changed_resources += 1;
                report.details.extend(details);
            }
        }
        report
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub changed_resources: usize,
    pub details: Vec<DriftDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftDetail {
    pub addr: String,
    pub field: String,
    pub before: Value,
    pub after: Value,
}

fn diff_top_level(resource: &ResourceInfo) -> Vec<DriftDetail> {
    let empty = serde_json::Map::new();
    let before = resource
        .before
        .as_ref()
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let after = resource
        .after
        .as_ref()
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut keys: Vec<&String> = before.keys().chain(after.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter_map(|key| {
            let old = before.get(key).cloned().unwrap_or(Value::Null);
            let new = after.get(key).cloned().unwrap_or(Value::Null);
            (old != new).then(|| DriftDetail {
                addr: resource.address.clone(),
                field: key.clone(),
                before: old,
                after: new,
            })
        })
        .collect()
}
