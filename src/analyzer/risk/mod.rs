//! Heuristic risk triage for planned resources.
//!
//! Independent of the rule engine: the analyzer looks at a resource's planned
//! `after` state and produces a coarse [`RiskLevel`] with human-readable
//! concerns. `RiskLevel` is a different scale from finding `Severity` and the
//! two are never converted into each other.

mod aws;
mod azure;
mod gcp;

use crate::analyzer::model::ResourceInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Upgrade to `level` if it is higher. Never downgrades.
    pub fn raise(&mut self, level: RiskLevel) {
        if level > *self {
            *self = level;
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAnalysis {
    pub address: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
    pub risk_level: RiskLevel,
}

impl ResourceAnalysis {
    fn new(resource: &ResourceInfo) -> Self {
        Self {
            address: resource.address.clone(),
            resource_type: resource.resource_type.clone(),
            concerns: Vec::new(),
            recommendations: Vec::new(),
            risk_level: RiskLevel::Low,
        }
    }

    /// Record a concern and raise the risk level. A concern already recorded
    /// is not repeated.
    pub(crate) fn flag(&mut self, concern: &str, recommendation: &str, level: RiskLevel) {
        self.risk_level.raise(level);
        if self.concerns.iter().any(|c| c == concern) {
            return;
        }
        self.concerns.push(concern.to_string());
        self.recommendations.push(recommendation.to_string());
    }

    pub fn has_concerns(&self) -> bool {
        !self.concerns.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceAnalyzer;

impl ResourceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, resource: &ResourceInfo) -> ResourceAnalysis {
        let mut analysis = ResourceAnalysis::new(resource);
        let Some(after) = resource.after.as_ref().filter(|a| !a.is_null()) else {
            return analysis;
        };

        let checked = match resource.provider_short_name() {
            "aws" => aws::analyze(&resource.resource_type, after, &mut analysis),
            "google" => gcp::analyze(&resource.resource_type, after, &mut analysis),
            "azurerm" => azure::analyze(&resource.resource_type, after, &mut analysis),
            _ => false,
        };
        if !checked {
            log::trace!(
                "No risk checks for {} ({})",
                resource.address,
                resource.provider
            );
        }
        analysis
    }

    pub fn analyze_all(&self, resources: &[ResourceInfo]) -> Vec<ResourceAnalysis> {
        resources.iter().map(|r| self.analyze(r)).collect()
    }
}

/// `key` is a list of strings containing any of `needles`.
pub(crate) fn list_contains_any(value: &Value, key: &str, needles: &[&str]) -> bool {
    crate::analyzer::model::value::entries(value, key)
        .iter()
        .filter_map(Value::as_str)
        .any(|item| needles.contains(&item))
}
