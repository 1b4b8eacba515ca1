//! # iac-explain
//!
//! Evaluates Terraform plan JSON and Kubernetes manifests against a registry
//! of security and compliance rules and produces structured findings.
//!
//! ## Features
//!
//! - **Plan Parsing**: Validates `terraform show -json` output and classifies each change
//! - **Manifest Parsing**: Multi-document YAML and JSON manifests with per-document diagnostics
//! - **Rule Engine**: Pluggable rules with per-rule failure isolation
//! - **Risk Triage**: Heuristic per-resource risk levels for AWS, GCP and Azure
//!
//! ## Example
//!
//! ```rust,no_run
//! use iac_explain::analyzer::{PlanParser, RuleEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = std::fs::read_to_string("tfplan.json")?;
//! let plan = PlanParser::parse(&raw)?;
//! let engine = RuleEngine::with_builtin_rules();
//! for resource in plan.resource_changes() {
//!     if let Some(after) = &resource.after {
//!         let report = engine.evaluate_one(after, &resource.resource_type, &resource.name, None);
//!         for finding in report.findings {
//!             println!("{} {}", finding.rule_id, resource.address);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;

pub use error::{IacExplainError, Result};
pub use handlers::*;

use analyzer::formatter::format_report;
use analyzer::rules::{Finding, RuleEngine, RuleFilter, Severity};
use cli::{Cli, Commands};
use colored::*;
use std::path::Path;

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit status when `--fail-on` finds a finding at or above the threshold.
pub const EXIT_THRESHOLD_EXCEEDED: i32 = 2;

/// Run a parsed command line and return the process exit status.
pub fn run_command(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::ExplainPlan {
            workspace,
            plan,
            cloud,
            policy_set,
            depth,
            format,
            fail_on,
        } => {
            let config = config::load_config(cli.config.as_deref(), Some(workspace.as_path()))?;
            let input = ExplainPlanInput {
                workspace,
                plan_path: plan,
                cloud,
                policy_set,
                depth,
            };
            let output = handle_explain_plan(&input, &config)?;
            format_report(&output, format.unwrap_or_else(|| config.output_format()));
            Ok(exit_status(&output.risks, fail_on))
        }
        Commands::ValidateK8s {
            manifests,
            helm_chart,
            values,
            policy_set,
            format,
            fail_on,
        } => {
            let workspace = manifests.clone().or_else(|| helm_chart.clone());
            let config = config::load_config(cli.config.as_deref(), workspace.as_deref())?;
            let input = ValidateK8sInput {
                manifests_dir: manifests,
                helm_chart,
                values,
                policy_set,
            };
            let output = handle_validate_k8s(&input, &config)?;
            format_report(&output, format.unwrap_or_else(|| config.output_format()));
            Ok(exit_status(&output.findings, fail_on))
        }
        Commands::Rules {
            provider,
            resource_type,
            severity,
            category,
            json,
        } => {
            let filter = RuleFilter {
                provider,
                resource_type,
                severity,
                category,
            };
            print_rules(&filter, json);
            Ok(0)
        }
        Commands::Tools => {
            for tool in TOOLS {
                let name = format!("{:<14}", tool.name);
                let name = if tool.supported { name.bold() } else { name.dimmed() };
                println!("{} {}", name, tool.description);
            }
            Ok(0)
        }
        Commands::Call { tool, args } => {
            let args: serde_json::Value = serde_json::from_str(&args)?;
            let workspace = args
                .get("workspace")
                .and_then(|w| w.as_str())
                .map(Path::new);
            let config = config::load_config(cli.config.as_deref(), workspace)?;
            let output = dispatch(&tool, args, &config)?;
            print!("{}", analyzer::formatter::json::format(&output));
            Ok(0)
        }
    }
}

fn print_rules(filter: &RuleFilter, json: bool) {
    let engine = RuleEngine::with_builtin_rules();
    let rules = engine.list(filter);

    if json {
        let metas: Vec<_> = rules.iter().map(|r| r.meta()).collect();
        print!("{}", analyzer::formatter::json::format(&metas));
        return;
    }

    for rule in &rules {
        let meta = rule.meta();
        println!(
            "{} {:<5} {:<14} {}",
            format!("{:<28}", meta.id).bold(),
            meta.severity.as_str(),
            meta.category.as_str(),
            meta.title
        );
        println!("{:<28} applies to: {}", "", meta.resource_types.join(", "));
    }
    println!("\n{} rule(s)", rules.len());
}

fn exit_status(findings: &[Finding], fail_on: Option<Severity>) -> i32 {
    match fail_on {
        Some(threshold) if findings.iter().any(|f| f.severity >= threshold) => {
            EXIT_THRESHOLD_EXCEEDED
        }
        _ => 0,
    }
}
