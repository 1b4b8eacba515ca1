use crate::analyzer::formatter::{Reportable, ReportView, markdown};
use crate::analyzer::model::{Action, ResourceInfo};
use crate::analyzer::plan::{DriftReport, PlanParser};
use crate::analyzer::risk::{ResourceAnalysis, ResourceAnalyzer};
use crate::analyzer::rules::{EvaluationReport, Finding, RuleFailure};
use crate::config::{AnalysisDepth, Config};
use crate::error::Result;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_PLAN_FILE: &str = "tfplan.json";

/// Cloud targeted by an explain-plan request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Cloud {
    Aws,
    #[serde(alias = "google")]
    #[value(alias = "google")]
    Gcp,
    #[serde(alias = "azurerm")]
    #[value(alias = "azurerm")]
    Azure,
}

impl Cloud {
    /// The Terraform provider short name for this cloud.
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Gcp => "google",
            Self::Azure => "azurerm",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainPlanInput {
    pub workspace: PathBuf,
    /// Plan JSON to read. Defaults to `<workspace>/tfplan.json`.
    pub plan_path: Option<PathBuf>,
    pub cloud: Option<Cloud>,
    pub policy_set: Option<String>,
    /// Overrides `[analysis] depth` from the configuration.
    pub depth: Option<AnalysisDepth>,
}

impl ExplainPlanInput {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            ..Self::default()
        }
    }

    fn plan_file(&self) -> PathBuf {
        self.plan_path
            .clone()
            .unwrap_or_else(|| self.workspace.join(DEFAULT_PLAN_FILE))
    }
}

/// A changed resource as listed in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub action: Action,
    /// The plan file the change was read from.
    pub path: String,
    pub addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainPlanOutput {
    pub summary: String,
    pub adds: usize,
    pub changes: usize,
    pub destroys: usize,
    pub resources: Vec<PlanResource>,
    pub risks: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_failures: Vec<RuleFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyses: Option<Vec<ResourceAnalysis>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift: Option<DriftReport>,
    pub evidence_md: String,
    pub analyzed_at: DateTime<Utc>,
}

impl Reportable for ExplainPlanOutput {
    fn view(&self) -> ReportView<'_> {
        ReportView {
            title: "Terraform plan",
            summary: vec![
                ("Summary", self.summary.clone()),
                ("Resources", self.resources.len().to_string()),
                ("Risks", self.risks.len().to_string()),
            ],
            findings: &self.risks,
            rule_failures: &self.rule_failures,
            diagnostics: &[],
            analyses: self.analyses.as_deref().unwrap_or(&[]),
            drift: self.drift.as_ref(),
        }
    }
}

/// Evaluate a Terraform plan against the rules of the selected policy.
pub fn handle_explain_plan(input: &ExplainPlanInput, config: &Config) -> Result<ExplainPlanOutput> {
    let plan_file = input.plan_file();
    log::info!("Explaining plan {}", plan_file.display());

    let raw = fs::read_to_string(&plan_file)?;
    let parser = PlanParser::parse(&raw)?;
    let policy = config.policy(input.policy_set.as_deref())?;
    let engine = super::policy_engine(&policy)?;
    let depth = input.depth.unwrap_or(config.analysis.depth);

    let resources = match input.cloud {
        Some(cloud) => parser.by_provider(cloud.provider()),
        None => parser.resource_changes(),
    };

    let mut report = EvaluationReport::default();
    for resource in &resources {
        // Pure deletions have no planned state to check.
        let Some(after) = resource.after.as_ref().filter(|a| !a.is_null()) else {
            continue;
        };
        report.extend(engine.evaluate_one(
            after,
            &resource.resource_type,
            &resource.name,
            Some(resource.address.as_str()),
        ));
    }
    report.findings.retain(|f| policy.allows_finding(f));

    let (analyses, drift) = match depth {
        AnalysisDepth::Full => {
            let analyzer = ResourceAnalyzer::new();
            (Some(analyzer.analyze_all(&resources)), Some(parser.drift()))
        }
        AnalysisDepth::Fast => (None, None),
    };

    let summary = parser.summary();
    let path = plan_file.display().to_string();
    let mut output = ExplainPlanOutput {
        summary: format!(
            "Plan: {} to add, {} to change, {} to destroy.",
            summary.adds, summary.changes, summary.destroys
        ),
        adds: summary.adds,
        changes: summary.changes,
        destroys: summary.destroys,
        resources: resources
            .iter()
            .filter(|r| r.action != Action::NoOp)
            .map(|r| plan_resource(r, &path))
            .collect(),
        risks: report.findings,
        rule_failures: report.failures,
        analyses,
        drift,
        evidence_md: String::new(),
        analyzed_at: Utc::now(),
    };
    output.evidence_md = markdown::format(&output.view());

    log::info!(
        "{} finding(s) across {} changed resource(s)",
        output.risks.len(),
        output.resources.len()
    );
    Ok(output)
}

fn plan_resource(resource: &ResourceInfo, path: &str) -> PlanResource {
    PlanResource {
        resource_type: resource.resource_type.clone(),
        name: resource.name.clone(),
        action: resource.action,
        path: path.to_string(),
        addr: resource.address.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::Severity;
    use crate::error::{ConfigError, IacExplainError};
    use serde_json::json;
    use tempfile::TempDir;

    fn write_plan(dir: &TempDir) {
        let plan = json!({
            "format_version": "1.2",
            "terraform_version": "1.6.0",
            "resource_changes": [
                {
                    "address": "aws_s3_bucket.logs",
                    "mode": "managed",
                    "type": "aws_s3_bucket",
                    "name": "logs",
                    "provider_name": "registry.terraform.io/hashicorp/aws",
                    "change": {"actions": ["create"], "before": null, "after": {"acl": "public-read"}}
                },
                {
                    "address": "google_storage_bucket.old",
                    "mode": "managed",
                    "type": "google_storage_bucket",
                    "name": "old",
                    "provider_name": "registry.terraform.io/hashicorp/google",
                    "change": {"actions": ["delete"], "before": {"name": "old"}, "after": null}
                }
            ]
        });
        fs::write(dir.path().join("tfplan.json"), plan.to_string()).unwrap();
    }

    #[test]
    fn test_explain_default_plan_file() {
        let dir = TempDir::new().unwrap();
        write_plan(&dir);

        let output = handle_explain_plan(&ExplainPlanInput::new(dir.path()), &Config::default()).unwrap();
        assert_eq!((output.adds, output.changes, output.destroys), (1, 0, 1));
        assert_eq!(output.summary, "Plan: 1 to add, 0 to change, 1 to destroy.");
        assert_eq!(output.resources.len(), 2);

        let ids: Vec<&str> = output.risks.iter().map(|f| f.rule_id.as_str()).collect();
        assert!(ids.contains(&"storage-public-access"));
        assert!(ids.contains(&"storage-no-encryption"));
        assert!(output.analyses.is_none());
        assert!(output.evidence_md.contains("storage-public-access"));
    }

    #[test]
    fn test_cloud_filter_and_full_depth() {
        let dir = TempDir::new().unwrap();
        write_plan(&dir);

        let input = ExplainPlanInput {
            cloud: Some(Cloud::Gcp),
            depth: Some(AnalysisDepth::Full),
            ..ExplainPlanInput::new(dir.path())
        };
        let output = handle_explain_plan(&input, &Config::default()).unwrap();
        assert_eq!(output.resources.len(), 1);
        assert_eq!(output.resources[0].addr, "google_storage_bucket.old");
        assert!(output.risks.is_empty());
        assert_eq!(output.analyses.as_ref().map(Vec::len), Some(1));
        assert!(output.drift.is_some());
    }

    #[test]
    fn test_policy_min_severity() {
        let dir = TempDir::new().unwrap();
        write_plan(&dir);
        let config: Config = toml::from_str("[rules]\nmin_severity = \"crit\"\n").unwrap();

        let output = handle_explain_plan(&ExplainPlanInput::new(dir.path()), &config).unwrap();
        assert!(output.risks.iter().all(|f| f.severity == Severity::Crit));
    }

    #[test]
    fn test_missing_plan_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = handle_explain_plan(&ExplainPlanInput::new(dir.path()), &Config::default()).unwrap_err();
        assert!(matches!(err, IacExplainError::Io(_)));
    }

    #[test]
    fn test_unknown_policy_set() {
        let dir = TempDir::new().unwrap();
        write_plan(&dir);
        let input = ExplainPlanInput {
            policy_set: Some("strict".to_string()),
            ..ExplainPlanInput::new(dir.path())
        };
        let err = handle_explain_plan(&input, &Config::default()).unwrap_err();
        assert!(matches!(err, IacExplainError::Config(ConfigError::UnknownPolicySet(_))));
    }

    #[test]
    fn test_input_from_json() {
        let input: ExplainPlanInput = serde_json::from_value(json!({
            "workspace": "infra",
            "planPath": "infra/plan.json",
            "cloud": "azurerm",
            "depth": "full"
        }))
        .unwrap();
        assert_eq!(input.plan_file(), PathBuf::from("infra/plan.json"));
        assert_eq!(input.cloud, Some(Cloud::Azure));
        assert_eq!(input.depth, Some(AnalysisDepth::Full));
    }
}
