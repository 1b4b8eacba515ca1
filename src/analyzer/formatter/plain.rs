//! Plain text formatter.

use crate::analyzer::formatter::ReportView;
use crate::analyzer::risk::RiskLevel;
use crate::analyzer::rules::{Finding, Severity};
use colored::*;

fn severity_label(severity: Severity) -> ColoredString {
    let label = format!("[{}]", severity.as_str().to_uppercase());
    match severity {
        Severity::Crit => label.red().bold(),
        Severity::High => label.red(),
        Severity::Med => label.yellow(),
        Severity::Low => label.blue(),
    }
}

fn risk_label(level: RiskLevel) -> ColoredString {
    match level {
        RiskLevel::Critical => level.as_str().red().bold(),
        RiskLevel::High => level.as_str().red(),
        RiskLevel::Medium => level.as_str().yellow(),
        RiskLevel::Low => level.as_str().normal(),
    }
}

fn location(finding: &Finding) -> String {
    match &finding.resource {
        Some(resource) => match &resource.path {
            Some(path) => format!("{} {} ({})", resource.resource_type, resource.name, path),
            None => format!("{} {}", resource.resource_type, resource.name),
        },
        None => "-".to_string(),
    }
}

/// Format a report as plain text.
pub fn format(view: &ReportView<'_>) -> String {
    let mut output = String::new();

    if !view.title.is_empty() {
        output.push_str(&format!("{}\n", view.title.bold()));
    }
    for (label, value) in &view.summary {
        output.push_str(&format!("  {}: {}\n", label, value));
    }
    if !view.title.is_empty() || !view.summary.is_empty() {
        output.push('\n');
    }

    for finding in view.sorted_findings() {
        output.push_str(&format!(
            "{} {} {} - {}\n",
            severity_label(finding.severity),
            finding.rule_id,
            location(finding),
            finding.description,
        ));
        if let Some(ref evidence) = finding.evidence {
            output.push_str(&format!("  Evidence: {}\n", evidence));
        }
        output.push_str(&format!("  Recommendation: {}\n", finding.recommendation));
    }

    let risky: Vec<_> = view.analyses.iter().filter(|a| a.has_concerns()).collect();
    if !risky.is_empty() {
        output.push_str(&format!("\n{}\n", "Risk analysis".bold()));
        for analysis in risky {
            output.push_str(&format!(
                "  {} [{}]\n",
                analysis.address,
                risk_label(analysis.risk_level)
            ));
            for concern in &analysis.concerns {
                output.push_str(&format!("    - {}\n", concern));
            }
        }
    }

    if let Some(drift) = view.drift.filter(|d| !d.details.is_empty()) {
        output.push_str(&format!("\n{}\n", "Changed attributes".bold()));
        for detail in &drift.details {
            output.push_str(&format!(
                "  {}.{}: {} -> {}\n",
                detail.addr, detail.field, detail.before, detail.after
            ));
        }
    }

    for failure in view.rule_failures {
        output.push_str(&format!(
            "{} rule {} could not evaluate {} {}: {}\n",
            "warning:".yellow(),
            failure.rule_id,
            failure.resource_type,
            failure.resource_name,
            failure.message
        ));
    }
    for diagnostic in view.diagnostics {
        output.push_str(&format!("{} {}\n", "warning:".yellow(), diagnostic));
    }

    if view.findings.is_empty() {
        output.push_str("No findings.\n");
    } else {
        output.push_str(&format!("\nFound {} finding(s).\n", view.findings.len()));
    }

    output
}
