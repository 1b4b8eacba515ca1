//! Rule registry and evaluation.
//!
//! Registration needs `&mut RuleEngine`, evaluation only `&RuleEngine`: build
//! the engine once, then share it (behind an `Arc` if needed) for any number
//! of concurrent evaluations.

use crate::analyzer::rules::types::{Finding, RuleCategory, Severity};
use crate::analyzer::rules::{RuleContext, SecurityRule, builtin_rules};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid rule `{id}`: {reason}")]
    InvalidRule { id: String, reason: String },
}

/// Subset filter for [`RuleEngine::list`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFilter {
    pub provider: Option<String>,
    pub resource_type: Option<String>,
    pub severity: Option<Severity>,
    pub category: Option<RuleCategory>,
}

impl RuleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn category(mut self, category: RuleCategory) -> Self {
        self.category = Some(category);
        self
    }

    fn matches(&self, rule: &dyn SecurityRule) -> bool {
        let meta = rule.meta();
        let provider_ok = match &self.provider {
            Some(provider) => meta.provider.as_deref() == Some(provider.as_str()),
            None => true,
        };
        let type_ok = match &self.resource_type {
            Some(resource_type) => meta.applies_to(resource_type),
            None => true,
        };
        provider_ok
            && type_ok
            && self.severity.is_none_or(|s| s == meta.severity)
            && self.category.is_none_or(|c| c == meta.category)
    }
}

/// A rule that failed on a resource. Recorded instead of a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFailure {
    pub rule_id: String,
    pub resource_type: String,
    pub resource_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RuleFailure>,
}

impl EvaluationReport {
    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    pub fn extend(&mut self, other: EvaluationReport) {
        self.findings.extend(other.findings);
        self.failures.extend(other.failures);
    }
}

/// One item of a batch evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationTarget<'a> {
    pub resource: &'a Value,
    pub resource_type: &'a str,
    pub resource_name: &'a str,
    pub resource_path: Option<&'a str>,
}

impl<'a> EvaluationTarget<'a> {
    pub fn new(resource: &'a Value, resource_type: &'a str, resource_name: &'a str) -> Self {
        Self {
            resource,
            resource_type,
            resource_name,
            resource_path: None,
        }
    }

    pub fn with_path(mut self, path: &'a str) -> Self {
        self.resource_path = Some(path);
        self
    }
}

#[derive(Default)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn SecurityRule>>,
    index: HashMap<String, usize>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine holding every built-in rule.
    pub fn with_builtin_rules() -> Self {
        let mut engine = Self::new();
        for rule in builtin_rules() {
            // Built-in rules always carry an id and resource types.
            if let Err(e) = engine.register(rule) {
                log::error!("Skipping built-in rule: {}", e);
            }
        }
        engine
    }

    /// Add a rule, or replace the rule with the same id in place.
    pub fn register(&mut self, rule: Arc<dyn SecurityRule>) -> Result<(), EngineError> {
        let meta = rule.meta();
        if meta.id.trim().is_empty() {
            return Err(EngineError::InvalidRule {
                id: meta.id.clone(),
                reason: "rule id must not be empty".to_string(),
            });
        }
        if meta.resource_types.is_empty() {
            return Err(EngineError::InvalidRule {
                id: meta.id.clone(),
                reason: "rule must declare at least one resource type".to_string(),
            });
        }

        let id = meta.id.clone();
        match self.index.get(&id) {
            Some(&slot) => {
                log::debug!("Replacing rule {}", id);
                self.rules[slot] = rule;
            }
            None => {
                log::debug!("Registering rule {}", id);
                self.index.insert(id, self.rules.len());
                self.rules.push(rule);
            }
        }
        Ok(())
    }

    /// Register rules in order, stopping at the first invalid one.
    pub fn register_all<I>(&mut self, rules: I) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = Arc<dyn SecurityRule>>,
    {
        for rule in rules {
            self.register(rule)?;
        }
        Ok(())
    }

    pub fn list(&self, filter: &RuleFilter) -> Vec<&dyn SecurityRule> {
        self.rules
            .iter()
            .map(|r| r.as_ref())
            .filter(|r| filter.matches(*r))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&dyn SecurityRule> {
        self.index.get(id).map(|&slot| self.rules[slot].as_ref())
    }

    pub fn count(&self) -> usize {
        self.rules.len()
    }

    /// Run every rule that applies to `resource_type` against one resource.
    /// A failing rule is recorded in `failures` and the others still run.
    pub fn evaluate_one(
        &self,
        resource: &Value,
        resource_type: &str,
        resource_name: &str,
        resource_path: Option<&str>,
    ) -> EvaluationReport {
        let ctx = RuleContext::new(resource, resource_type, resource_name, resource_path);
        let mut report = EvaluationReport::default();

        for rule in self
            .rules
            .iter()
            .filter(|r| r.meta().applies_to(resource_type))
        {
            match rule.evaluate(&ctx) {
                Ok(Some(finding)) => report.findings.push(finding),
                Ok(None) => {}
                Err(e) => {
                    log::warn!(
                        "Rule {} failed on {} {}: {}",
                        rule.id(),
                        resource_type,
                        resource_name,
                        e
                    );
                    report.failures.push(RuleFailure {
                        rule_id: rule.id().to_string(),
                        resource_type: resource_type.to_string(),
                        resource_name: resource_name.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Evaluate a batch, keeping input order.
    pub fn evaluate_many(&self, targets: &[EvaluationTarget<'_>]) -> EvaluationReport {
        let mut report = EvaluationReport::default();
        for target in targets {
            report.extend(self.evaluate_one(
                target.resource,
                target.resource_type,
                target.resource_name,
                target.resource_path,
            ));
        }
        report
    }
}
