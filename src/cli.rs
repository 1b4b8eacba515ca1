use crate::analyzer::formatter::OutputFormat;
use crate::analyzer::rules::{RuleCategory, Severity};
use crate::config::AnalysisDepth;
use crate::handlers::Cloud;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iac-explain")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explain Terraform plans and check Kubernetes manifests against security rules")]
#[command(long_about = "Evaluates Terraform plan JSON (terraform show -json) and Kubernetes manifests against a registry of security and compliance rules, and reports findings with evidence and recommendations.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize a Terraform plan and evaluate the planned resources
    ExplainPlan {
        /// Terraform workspace directory
        #[arg(value_name = "WORKSPACE", default_value = ".")]
        workspace: PathBuf,

        /// Plan JSON file (defaults to WORKSPACE/tfplan.json)
        #[arg(long, value_name = "FILE")]
        plan: Option<PathBuf>,

        /// Only consider resources of one cloud (aws, gcp, azure)
        #[arg(long, value_enum)]
        cloud: Option<Cloud>,

        /// Named policy set from the configuration file
        #[arg(long)]
        policy_set: Option<String>,

        /// Analysis depth (fast, full)
        #[arg(long, value_enum)]
        depth: Option<AnalysisDepth>,

        /// Output format (plain, json, markdown)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Exit with status 2 when a finding at or above this severity exists
        #[arg(long, value_enum, value_name = "SEVERITY")]
        fail_on: Option<Severity>,
    },

    /// Check Kubernetes manifests and Helm chart templates
    ValidateK8s {
        /// Directory containing manifests
        #[arg(long, value_name = "DIR")]
        manifests: Option<PathBuf>,

        /// Helm chart directory; its templates are checked unrendered
        #[arg(long, value_name = "DIR")]
        helm_chart: Option<PathBuf>,

        /// Helm values files
        #[arg(long, value_name = "FILE")]
        values: Vec<PathBuf>,

        /// Named policy set from the configuration file
        #[arg(long)]
        policy_set: Option<String>,

        /// Output format (plain, json, markdown)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Exit with status 2 when a finding at or above this severity exists
        #[arg(long, value_enum, value_name = "SEVERITY")]
        fail_on: Option<Severity>,
    },

    /// List the builtin rules
    Rules {
        /// Only rules for this provider (e.g. aws)
        #[arg(long)]
        provider: Option<String>,

        /// Only rules that apply to this resource type or kind
        #[arg(long)]
        resource_type: Option<String>,

        /// Only rules with this severity (low, med, high, crit)
        #[arg(long, value_enum)]
        severity: Option<Severity>,

        /// Only rules in this category
        #[arg(long, value_enum)]
        category: Option<RuleCategory>,

        /// Output rule metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the tool operations available to `call`
    Tools,

    /// Run a tool operation with JSON arguments and print its JSON output
    Call {
        /// Tool name (e.g. explainPlan, validateK8s)
        #[arg(value_name = "TOOL")]
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, value_name = "JSON", default_value = "{}")]
        args: String,
    },
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
