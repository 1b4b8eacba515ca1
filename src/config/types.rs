use crate::analyzer::formatter::OutputFormat;
use crate::analyzer::rules::{Finding, SecurityRule, Severity};
use crate::error::ConfigError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    pub rules: RulesConfig,
    pub policy_sets: BTreeMap<String, PolicySetConfig>,
}

/// Analysis configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub depth: AnalysisDepth,
}

/// How much work `explain-plan` does beyond rule evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    /// Rules only.
    #[default]
    Fast,
    /// Rules plus per-resource risk triage and attribute drift.
    Full,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default().as_str().to_string(),
        }
    }
}

/// Crate-wide rule selection, also the policy used when no set is named.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub exclude: Vec<String>,
    pub min_severity: Option<Severity>,
}

/// A named policy set under `[policy_sets.NAME]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySetConfig {
    /// Rule ids to keep. Empty keeps every rule.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub min_severity: Option<Severity>,
}

/// A resolved policy: which rules run and which findings are reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    pub name: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub min_severity: Severity,
}

impl Policy {
    pub fn allows_rule(&self, rule: &dyn SecurityRule) -> bool {
        let id = rule.id();
        if self.exclude.iter().any(|e| e == id) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|i| i == id)
    }

    pub fn allows_finding(&self, finding: &Finding) -> bool {
        finding.severity >= self.min_severity
    }
}

impl Config {
    /// Resolve a policy. `None` uses the `[rules]` section alone; a name
    /// selects a policy set, layered on top of `[rules]`.
    pub fn policy(&self, name: Option<&str>) -> Result<Policy, ConfigError> {
        let base_min = self.rules.min_severity.unwrap_or_default();
        let Some(name) = name else {
            return Ok(Policy {
                name: None,
                include: Vec::new(),
                exclude: self.rules.exclude.clone(),
                min_severity: base_min,
            });
        };

        let set = self
            .policy_sets
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPolicySet(name.to_string()))?;

        let mut exclude = self.rules.exclude.clone();
        for id in &set.exclude {
            if !exclude.contains(id) {
                exclude.push(id.clone());
            }
        }

        Ok(Policy {
            name: Some(name.to_string()),
            include: set.include.clone(),
            exclude,
            min_severity: set.min_severity.unwrap_or(base_min),
        })
    }

    /// The configured output format, falling back to plain text for an
    /// unrecognized value.
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::parse(&self.output.format).unwrap_or_else(|| {
            log::warn!(
                "Unknown output format '{}' in configuration, using plain",
                self.output.format
            );
            OutputFormat::default()
        })
    }
}
