//! # Analyzer Module
//!
//! The evaluation core. Everything here is synchronous and performs no I/O:
//! - Typed Terraform plan and Kubernetes manifest models with validation
//! - Plan and manifest parsers
//! - The security rule registry, engine and builtin rules
//! - Heuristic per-resource risk triage
//! - Report formatters

pub mod formatter;
pub mod manifest;
pub mod model;
pub mod plan;
pub mod risk;
pub mod rules;

pub use formatter::{OutputFormat, Reportable, format_report, format_report_to_string};
pub use manifest::{ManifestFormat, ManifestParseResult, ManifestParser, ParseDiagnostic};
pub use model::{ClusterResource, ResourceInfo, TerraformPlan};
pub use plan::{DriftDetail, DriftReport, PlanError, PlanParser};
pub use risk::{ResourceAnalysis, ResourceAnalyzer, RiskLevel};
pub use rules::{
    EvaluationReport, EvaluationTarget, Finding, RuleEngine, RuleFailure, RuleFilter, SecurityRule,
    Severity, builtin_rules,
};
