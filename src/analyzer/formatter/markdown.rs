//! Markdown formatter, used for the evidence and report bodies returned by
//! the host operations.

use crate::analyzer::formatter::ReportView;
use crate::analyzer::rules::Finding;

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn resource_cell(finding: &Finding) -> String {
    match &finding.resource {
        Some(resource) => match &resource.path {
            Some(path) => format!("`{}.{}` ({})", resource.resource_type, resource.name, path),
            None => format!("`{}.{}`", resource.resource_type, resource.name),
        },
        None => "-".to_string(),
    }
}

/// Format a report as Markdown.
pub fn format(view: &ReportView<'_>) -> String {
    let mut md = String::new();

    if !view.title.is_empty() {
        md.push_str(&format!("## {}\n\n", view.title));
    }

    if !view.summary.is_empty() {
        md.push_str("| Metric | Value |\n|---|---|\n");
        for (label, value) in &view.summary {
            md.push_str(&format!("| {} | {} |\n", cell(label), cell(value)));
        }
        md.push('\n');
    }

    md.push_str("### Findings\n\n");
    if view.findings.is_empty() {
        md.push_str("No findings.\n\n");
    } else {
        md.push_str("| Severity | Rule | Resource | Evidence | Recommendation |\n");
        md.push_str("|---|---|---|---|---|\n");
        for finding in view.sorted_findings() {
            md.push_str(&format!(
                "| {} | `{}` | {} | {} | {} |\n",
                finding.severity.as_str().to_uppercase(),
                finding.rule_id,
                resource_cell(finding),
                cell(finding.evidence.as_deref().unwrap_or("-")),
                cell(&finding.recommendation),
            ));
        }
        md.push('\n');
    }

    let risky: Vec<_> = view.analyses.iter().filter(|a| a.has_concerns()).collect();
    if !risky.is_empty() {
        md.push_str("### Risk analysis\n\n");
        for analysis in risky {
            md.push_str(&format!(
                "- `{}` ({}): {}\n",
                analysis.address,
                analysis.risk_level,
                analysis.concerns.join("; ")
            ));
        }
        md.push('\n');
    }

    if let Some(drift) = view.drift.filter(|d| !d.details.is_empty()) {
        md.push_str(&format!(
            "### Changed attributes ({} resource(s))\n\n",
            drift.changed_resources
        ));
        md.push_str("| Resource | Field | Before | After |\n|---|---|---|---|\n");
        for detail in &drift.details {
            md.push_str(&format!(
                "| `{}` | `{}` | `{}` | `{}` |\n",
                detail.addr,
                detail.field,
                cell(&detail.before.to_string()),
                cell(&detail.after.to_string())
            ));
        }
        md.push('\n');
    }

    if !view.rule_failures.is_empty() || !view.diagnostics.is_empty() {
        md.push_str("### Warnings\n\n");
        for failure in view.rule_failures {
            md.push_str(&format!(
                "- rule `{}` could not evaluate `{} {}`: {}\n",
                failure.rule_id, failure.resource_type, failure.resource_name, failure.message
            ));
        }
        for diagnostic in view.diagnostics {
            md.push_str(&format!("- {}\n", diagnostic));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::{RuleFailure, Severity};

    #[test]
    fn test_findings_table() {
        let findings = vec![
            Finding::new("container-latest-tag", Severity::Med, "T", "D", "Pin | tags")
                .with_evidence("Containers with :latest tag: app"),
        ];
        let md = format(&ReportView {
            title: "Kubernetes manifests",
            findings: &findings,
            ..ReportView::default()
        });
        assert!(md.starts_with("## Kubernetes manifests\n"));
        assert!(md.contains("| MED | `container-latest-tag` | - | Containers with :latest tag: app | Pin \\| tags |"));
    }

    #[test]
    fn test_warnings_section() {
        let failures = vec![RuleFailure {
            rule_id: "network-open-ingress".to_string(),
            resource_type: "aws_security_group".to_string(),
            resource_name: "web".to_string(),
            message: "boom".to_string(),
        }];
        let md = format(&ReportView {
            rule_failures: &failures,
            ..ReportView::default()
        });
        assert!(md.contains("No findings."));
        assert!(md.contains("- rule `network-open-ingress` could not evaluate `aws_security_group web`: boom"));
    }
}
