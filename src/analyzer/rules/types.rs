//! Core rule types:
//! - `Severity` - Finding severity levels
//! - `RuleCategory` - Category of the rule (security, compliance, ...)
//! - `Finding` - A single rule match against a resource

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Severity levels for findings.
///
/// Ordered from least to most severe: `Low < Med < High < Crit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    #[serde(alias = "medium")]
    #[value(alias = "medium")]
    Med,
    High,
    #[serde(alias = "critical")]
    #[value(alias = "critical")]
    Crit,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Med => "med",
            Self::High => "high",
            Self::Crit => "crit",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Med => 1,
            Self::High => 2,
            Self::Crit => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Category of a security rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    Security,
    Compliance,
    BestPractice,
    Performance,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Security => "security",
            Self::Compliance => "compliance",
            Self::BestPractice => "best-practice",
            Self::Performance => "performance",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The resource a finding is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// A rule match against one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl Finding {
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            title: title.into(),
            description: description.into(),
            resource: None,
            evidence: None,
            recommendation: recommendation.into(),
            references: Vec::new(),
        }
    }

    pub fn with_resource(mut self, resource: ResourceRef) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Crit > Severity::High);
        assert!(Severity::High > Severity::Med);
        assert!(Severity::Med > Severity::Low);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!(Severity::from_str("crit", true), Ok(Severity::Crit));
        assert_eq!(Severity::from_str("CRITICAL", true), Ok(Severity::Crit));
        assert_eq!(Severity::from_str("medium", false), Ok(Severity::Med));
        assert!(Severity::from_str("urgent", false).is_err());
        assert_eq!(Severity::default(), Severity::Low);
    }

    #[test]
    fn test_severity_serde_accepts_long_forms() {
        let sev: Severity = serde_json::from_value(json!("critical")).unwrap();
        assert_eq!(sev, Severity::Crit);
        assert_eq!(serde_json::to_value(Severity::Med).unwrap(), json!("med"));
    }

    #[test]
    fn test_category_serde() {
        assert_eq!(
            serde_json::to_value(RuleCategory::BestPractice).unwrap(),
            json!("best-practice")
        );
        assert_eq!(
            RuleCategory::from_str("best-practice", false),
            Ok(RuleCategory::BestPractice)
        );
    }

    #[test]
    fn test_finding_json_shape() {
        let finding = Finding::new("r", Severity::High, "T", "D", "R")
            .with_resource(ResourceRef {
                resource_type: "aws_s3_bucket".to_string(),
                name: "logs".to_string(),
                path: None,
            })
            .with_evidence("E");
        let value = serde_json::to_value(&finding).unwrap();
        assert_eq!(
            value,
            json!({
                "ruleId": "r",
                "severity": "high",
                "title": "T",
                "description": "D",
                "resource": {"type": "aws_s3_bucket", "name": "logs"},
                "evidence": "E",
                "recommendation": "R"
            })
        );
    }
}
