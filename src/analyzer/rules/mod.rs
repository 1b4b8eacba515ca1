//! Rule system framework.
//!
//! Provides the infrastructure for defining and running security rules:
//! - `SecurityRule` trait for all rules
//! - `SimpleRule` for rules defined by metadata plus an evaluate function
//! - `RuleEngine` (in [`engine`]) to register rules and evaluate resources

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

pub mod container;
pub mod engine;
pub mod network;
pub mod storage;
pub mod types;

pub use engine::{
    EngineError, EvaluationReport, EvaluationTarget, RuleEngine, RuleFailure, RuleFilter,
};
pub use types::{Finding, ResourceRef, RuleCategory, Severity};

/// Why a rule could not evaluate a resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("malformed resource at `{field}`: {reason}")]
    MalformedResource { field: String, reason: String },

    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

impl RuleError {
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResource {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome of one rule against one resource: a finding, nothing, or a
/// structured failure the engine records without stopping.
pub type RuleResult = Result<Option<Finding>, RuleError>;

/// Read-only view of the resource being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub resource: &'a Value,
    pub resource_type: &'a str,
    pub resource_name: &'a str,
    pub resource_path: Option<&'a str>,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        resource: &'a Value,
        resource_type: &'a str,
        resource_name: &'a str,
        resource_path: Option<&'a str>,
    ) -> Self {
        Self {
            resource,
            resource_type,
            resource_name,
            resource_path,
        }
    }

    pub fn resource_ref(&self) -> ResourceRef {
        ResourceRef {
            resource_type: self.resource_type.to_string(),
            name: self.resource_name.to_string(),
            path: self.resource_path.map(str::to_string),
        }
    }
}

/// Static description of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMeta {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub category: RuleCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub resource_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl RuleMeta {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        category: RuleCategory,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            severity,
            category,
            provider: None,
            resource_types: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_resource_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_references<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = references.into_iter().map(Into::into).collect();
        self
    }

    pub fn applies_to(&self, resource_type: &str) -> bool {
        self.resource_types.iter().any(|t| t == resource_type)
    }
}

/// A rule that can evaluate plan resources or cluster objects.
pub trait SecurityRule: Send + Sync {
    fn meta(&self) -> &RuleMeta;

    /// Evaluate one resource. Only called for types in `resource_types`.
    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleResult;

    fn id(&self) -> &str {
        &self.meta().id
    }

    fn severity(&self) -> Severity {
        self.meta().severity
    }

    fn category(&self) -> RuleCategory {
        self.meta().category
    }
}

/// Base implementation for a stateless rule.
pub struct SimpleRule<F>
where
    F: Fn(&RuleMeta, &RuleContext<'_>) -> RuleResult + Send + Sync,
{
    meta: RuleMeta,
    evaluate_fn: F,
}

impl<F> SimpleRule<F>
where
    F: Fn(&RuleMeta, &RuleContext<'_>) -> RuleResult + Send + Sync,
{
    pub fn new(meta: RuleMeta, evaluate_fn: F) -> Self {
        Self { meta, evaluate_fn }
    }
}

impl<F> SecurityRule for SimpleRule<F>
where
    F: Fn(&RuleMeta, &RuleContext<'_>) -> RuleResult + Send + Sync,
{
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleResult {
        (self.evaluate_fn)(&self.meta, ctx)
    }
}

/// Helper to create a finding for a rule, attributed to the context's
/// resource and carrying the rule's references.
pub fn make_finding(
    meta: &RuleMeta,
    ctx: &RuleContext<'_>,
    description: impl Into<String>,
    recommendation: impl Into<String>,
) -> Finding {
    Finding::new(
        meta.id.clone(),
        meta.severity,
        meta.title.clone(),
        description,
        recommendation,
    )
    .with_resource(ctx.resource_ref())
    .with_references(meta.references.iter().cloned())
}

/// All built-in rules, in evaluation order.
pub fn builtin_rules() -> Vec<Arc<dyn SecurityRule>> {
    vec![
        Arc::new(storage::public_access()),
        Arc::new(storage::no_encryption()),
        Arc::new(storage::no_versioning()),
        Arc::new(network::open_ingress()),
        Arc::new(network::open_egress()),
        Arc::new(network::ssh_open()),
        Arc::new(container::no_limits()),
        Arc::new(container::privilege_escalation()),
        Arc::new(container::run_as_root()),
        Arc::new(container::latest_tag()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_count() {
        assert_eq!(builtin_rules().len(), 10, "Expected 10 rules");
    }

    #[test]
    fn test_rule_ids_unique() {
        let mut ids: Vec<String> = builtin_rules().iter().map(|r| r.id().to_string()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10, "Rule ids should be unique");
    }

    #[test]
    fn test_builtin_rules_declare_resource_types() {
        for rule in builtin_rules() {
            assert!(!rule.meta().resource_types.is_empty(), "{}", rule.id());
        }
    }

    #[test]
    fn test_make_finding_attributes_resource() {
        let meta = RuleMeta::new("r", "T", "D", Severity::Med, RuleCategory::Compliance)
            .with_references(["https://example.com"]);
        let resource = serde_json::json!({});
        let ctx = RuleContext::new(&resource, "aws_s3_bucket", "logs", Some("main.tf"));
        let finding = make_finding(&meta, &ctx, "desc", "fix");
        assert_eq!(finding.severity, Severity::Med);
        assert_eq!(finding.resource.unwrap().path.as_deref(), Some("main.tf"));
        assert_eq!(finding.references, vec!["https://example.com"]);
    }
}
