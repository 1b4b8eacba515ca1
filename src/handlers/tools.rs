//! JSON tool surface over the host operations.

use super::explain_plan::{ExplainPlanInput, handle_explain_plan};
use super::validate_k8s::{ValidateK8sInput, handle_validate_k8s};
use crate::config::Config;
use crate::error::{IacExplainError, Result};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
    /// Recognized but not provided by this build.
    pub supported: bool,
}

pub const TOOLS: &[ToolInfo] = &[
    ToolInfo {
        name: "explainPlan",
        description: "Analyzes Terraform plans and provides a summary with risk assessment",
        supported: true,
    },
    ToolInfo {
        name: "validateK8s",
        description: "Validates Kubernetes manifests and Helm chart templates for security and best practices",
        supported: true,
    },
    ToolInfo {
        name: "hardening",
        description: "Generates remediation patches for findings",
        supported: false,
    },
    ToolInfo {
        name: "costDelta",
        description: "Estimates the monthly cost change of a plan",
        supported: false,
    },
];

/// Run a tool by name with JSON arguments and return its JSON output.
pub fn dispatch(name: &str, args: Value, config: &Config) -> Result<Value> {
    log::debug!("Dispatching tool {}", name);
    let output = match name {
        "explainPlan" => {
            let input: ExplainPlanInput = parse_args(name, args)?;
            serde_json::to_value(handle_explain_plan(&input, config)?)?
        }
        "validateK8s" => {
            let input: ValidateK8sInput = parse_args(name, args)?;
            serde_json::to_value(handle_validate_k8s(&input, config)?)?
        }
        _ => {
            return match TOOLS.iter().find(|t| t.name == name) {
                Some(_) => Err(IacExplainError::Unsupported(name.to_string())),
                None => Err(IacExplainError::UnknownOperation(name.to_string())),
            };
        }
    };
    Ok(output)
}

fn parse_args<T: serde::de::DeserializeOwned>(name: &str, args: Value) -> Result<T> {
    // A tool called without arguments gets an empty object.
    let args = if args.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| IacExplainError::InvalidInput(format!("{}: {}", name, e)))
}
