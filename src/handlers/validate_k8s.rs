use crate::analyzer::formatter::{Reportable, ReportView, markdown};
use crate::analyzer::manifest::{ManifestFormat, ManifestParser, ParseDiagnostic};
use crate::analyzer::rules::{EvaluationReport, Finding, RuleFailure};
use crate::config::Config;
use crate::error::{IacExplainError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateK8sInput {
    pub manifests_dir: Option<PathBuf>,
    /// Chart directory; its `templates/` are checked as written.
    pub helm_chart: Option<PathBuf>,
    /// Helm values files. Templates are not rendered, so these are only
    /// reported.
    #[serde(default)]
    pub values: Vec<PathBuf>,
    pub policy_set: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateK8sOutput {
    pub findings: Vec<Finding>,
    pub parse_diagnostics: Vec<ParseDiagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_failures: Vec<RuleFailure>,
    pub resources_analyzed: usize,
    pub report_md: String,
    pub analyzed_at: DateTime<Utc>,
}

impl Reportable for ValidateK8sOutput {
    fn view(&self) -> ReportView<'_> {
        ReportView {
            title: "Kubernetes manifests",
            summary: vec![
                ("Resources analyzed", self.resources_analyzed.to_string()),
                ("Findings", self.findings.len().to_string()),
            ],
            findings: &self.findings,
            rule_failures: &self.rule_failures,
            diagnostics: &self.parse_diagnostics,
            ..ReportView::default()
        }
    }
}

/// Check every manifest under the given directories.
pub fn handle_validate_k8s(input: &ValidateK8sInput, config: &Config) -> Result<ValidateK8sOutput> {
    let mut roots = Vec::new();
    if let Some(dir) = &input.manifests_dir {
        roots.push(existing_dir(dir)?);
    }
    if let Some(chart) = &input.helm_chart {
        roots.push(existing_dir(&chart.join("templates"))?);
    }
    if roots.is_empty() {
        return Err(IacExplainError::InvalidInput(
            "either a manifests directory or a Helm chart is required".to_string(),
        ));
    }

    let policy = config.policy(input.policy_set.as_deref())?;
    let engine = super::policy_engine(&policy)?;

    let mut report = EvaluationReport::default();
    let mut diagnostics = Vec::new();
    let mut resources_analyzed = 0;

    for values in &input.values {
        log::warn!("Helm values file {} is not rendered", values.display());
        diagnostics.push(ParseDiagnostic {
            file: Some(values.display().to_string()),
            document_index: 0,
            line: None,
            message: "values file not applied; chart templates are checked unrendered".to_string(),
        });
    }

    for (path, format) in roots.iter().flat_map(|root| manifest_files(root)) {
        let file = path.display().to_string();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Failed to read {}: {}", file, e);
                diagnostics.push(ParseDiagnostic {
                    file: Some(file),
                    document_index: 0,
                    line: None,
                    message: format!("failed to read file: {}", e),
                });
                continue;
            }
        };

        let parsed = ManifestParser::parse_file_content(&text, format);
        log::debug!("{}: {} resource(s)", file, parsed.resources.len());
        diagnostics.extend(parsed.diagnostics.into_iter().map(|d| d.with_file(&file)));

        for resource in &parsed.resources {
            resources_analyzed += 1;
            report.extend(engine.evaluate_one(
                resource.as_value(),
                &resource.kind,
                resource.name(),
                Some(file.as_str()),
            ));
        }
    }
    report.findings.retain(|f| policy.allows_finding(f));

    let mut output = ValidateK8sOutput {
        findings: report.findings,
        parse_diagnostics: diagnostics,
        rule_failures: report.failures,
        resources_analyzed,
        report_md: String::new(),
        analyzed_at: Utc::now(),
    };
    output.report_md = markdown::format(&output.view());

    log::info!(
        "{} finding(s) across {} resource(s)",
        output.findings.len(),
        output.resources_analyzed
    );
    Ok(output)
}

fn existing_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_dir() {
        Ok(dir.to_path_buf())
    } else {
        Err(IacExplainError::InvalidInput(format!(
            "not a directory: {}",
            dir.display()
        )))
    }
}

/// Manifest files under `root`, in a stable order.
fn manifest_files(root: &Path) -> Vec<(PathBuf, ManifestFormat)> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let format = ManifestFormat::from_path(e.path())?;
            Some((e.into_path(), format))
        })
        .collect()
}
