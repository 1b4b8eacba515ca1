// Handler modules
pub mod explain_plan;
pub mod tools;
pub mod validate_k8s;

// Re-export all handler functions
pub use explain_plan::{Cloud, ExplainPlanInput, ExplainPlanOutput, PlanResource, handle_explain_plan};
pub use tools::{TOOLS, ToolInfo, dispatch};
pub use validate_k8s::{ValidateK8sInput, ValidateK8sOutput, handle_validate_k8s};

use crate::analyzer::rules::{RuleEngine, builtin_rules};
use crate::config::Policy;
use crate::error::{IacExplainError, Result};

/// Build an engine holding the builtin rules the policy keeps.
pub fn policy_engine(policy: &Policy) -> Result<RuleEngine> {
    let mut engine = RuleEngine::new();
    engine
        .register_all(
            builtin_rules()
                .into_iter()
                .filter(|rule| policy.allows_rule(rule.as_ref())),
        )
        .map_err(|e| IacExplainError::InvalidInput(e.to_string()))?;
    log::info!(
        "Loaded {} rule(s) for policy {}",
        engine.count(),
        policy.name.as_deref().unwrap_or("default")
    );
    Ok(engine)
}
