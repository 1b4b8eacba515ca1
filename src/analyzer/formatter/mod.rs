//! Output formatters for analysis reports.

pub mod json;
pub mod markdown;
pub mod plain;

use crate::analyzer::manifest::ParseDiagnostic;
use crate::analyzer::plan::DriftReport;
use crate::analyzer::risk::ResourceAnalysis;
use crate::analyzer::rules::{Finding, RuleFailure};
use clap::ValueEnum;
use serde::Serialize;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output.
    #[default]
    #[value(alias = "text")]
    Plain,
    /// JSON output.
    Json,
    /// Markdown report.
    #[value(alias = "md")]
    Markdown,
}

impl OutputFormat {
    /// Parse from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Some(Self::Plain),
            "json" => Some(Self::Json),
            "markdown" | "md" => Some(Self::Markdown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Json => "json",
            Self::Markdown => "markdown",
        }
    }
}

/// Borrowed view of a report, shared by the text and Markdown renderers.
#[derive(Debug, Clone, Default)]
pub struct ReportView<'a> {
    pub title: &'a str,
    /// Ordered `(label, value)` pairs shown at the top of the report.
    pub summary: Vec<(&'static str, String)>,
    pub findings: &'a [Finding],
    pub rule_failures: &'a [RuleFailure],
    pub diagnostics: &'a [ParseDiagnostic],
    pub analyses: &'a [ResourceAnalysis],
    pub drift: Option<&'a DriftReport>,
}

impl<'a> ReportView<'a> {
    /// Findings ordered most severe first; equal severities keep their order.
    pub fn sorted_findings(&self) -> Vec<&'a Finding> {
        let mut findings: Vec<&Finding> = self.findings.iter().collect();
        findings.sort_by(|a, b| b.severity.cmp(&a.severity));
        findings
    }
}

/// A report that can be rendered in any [`OutputFormat`].
pub trait Reportable: Serialize {
    fn view(&self) -> ReportView<'_>;
}

/// Format a report to a string.
pub fn format_report_to_string<R: Reportable>(report: &R, format: OutputFormat) -> String {
    match format {
        OutputFormat::Plain => plain::format(&report.view()),
        OutputFormat::Json => json::format(report),
        OutputFormat::Markdown => markdown::format(&report.view()),
    }
}

/// Format and print a report.
pub fn format_report<R: Reportable>(report: &R, format: OutputFormat) {
    print!("{}", format_report_to_string(report, format));
}
