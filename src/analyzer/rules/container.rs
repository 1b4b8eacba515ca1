//! Workload container posture: resource limits, privilege escalation,
//! root users and unpinned image tags.

use crate::analyzer::manifest::extract::{self, WORKLOAD_KINDS};
use crate::analyzer::model::Container;
use crate::analyzer::rules::types::{RuleCategory, Severity};
use crate::analyzer::rules::{
    RuleContext, RuleMeta, RuleResult, SecurityRule, SimpleRule, make_finding,
};

pub const NO_LIMITS: &str = "container-no-limits";
pub const PRIVILEGE_ESCALATION: &str = "container-priv-escalation";
pub const RUN_AS_ROOT: &str = "container-run-as-root";
pub const LATEST_TAG: &str = "container-latest-tag";

const POD_SECURITY_STANDARDS: &str = "https://kubernetes.io/docs/concepts/security/pod-security-standards/";

fn workload_meta(
    id: &str,
    title: &str,
    description: &str,
    severity: Severity,
    category: RuleCategory,
    reference: &str,
) -> RuleMeta {
    RuleMeta::new(id, title, description, severity, category)
        .with_resource_types(WORKLOAD_KINDS.iter().copied())
        .with_references([reference])
}

/// Names of the containers matching `offending`.
fn offenders<'a>(
    containers: &'a [Container],
    offending: impl Fn(&Container) -> bool,
) -> Vec<&'a str> {
    containers
        .iter()
        .filter(|&c| offending(c))
        .map(|c| c.name.as_str())
        .collect()
}

pub fn no_limits() -> impl SecurityRule {
    let meta = workload_meta(
        NO_LIMITS,
        "Missing Resource Limits",
        "Containers should have resource limits defined",
        Severity::High,
        RuleCategory::BestPractice,
        "https://kubernetes.io/docs/concepts/configuration/manage-resources-containers/",
    );
    SimpleRule::new(meta, check_limits)
}

fn check_limits(meta: &RuleMeta, ctx: &RuleContext<'_>) -> RuleResult {
    let containers = extract::containers(ctx.resource)?;
    let missing = offenders(&containers, |c| !c.has_limits());
    if missing.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        make_finding(
            meta,
            ctx,
            "Containers are missing resource limits",
            "Add resource limits (CPU and memory) to prevent resource exhaustion",
        )
        .with_evidence(format!("Containers without limits: {}", missing.join(", "))),
    ))
}

pub fn privilege_escalation() -> impl SecurityRule {
    let meta = workload_meta(
        PRIVILEGE_ESCALATION,
        "Privilege Escalation Allowed",
        "Containers should not allow privilege escalation",
        Severity::Crit,
        RuleCategory::Security,
        POD_SECURITY_STANDARDS,
    );
    SimpleRule::new(meta, check_privilege_escalation)
}

fn check_privilege_escalation(meta: &RuleMeta, ctx: &RuleContext<'_>) -> RuleResult {
    let containers = extract::containers(ctx.resource)?;
    let escalating = offenders(&containers, Container::allows_privilege_escalation);
    if escalating.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        make_finding(
            meta,
            ctx,
            "Containers allow privilege escalation",
            "Set allowPrivilegeEscalation to false in securityContext",
        )
        .with_evidence(format!(
            "Containers with allowPrivilegeEscalation: {}",
            escalating.join(", ")
        )),
    ))
}

pub fn run_as_root() -> impl SecurityRule {
    let meta = workload_meta(
        RUN_AS_ROOT,
        "Running as Root",
        "Containers should not run as root user",
        Severity::High,
        RuleCategory::Security,
        POD_SECURITY_STANDARDS,
    );
    SimpleRule::new(meta, check_run_as_root)
}

fn check_run_as_root(meta: &RuleMeta, ctx: &RuleContext<'_>) -> RuleResult {
    let containers = extract::containers(ctx.resource)?;
    let pod = extract::pod_security_context(ctx.resource)?;
    let root = offenders(&containers, |c| {
        c.effective_run_as_non_root(pod.as_ref()) != Some(true)
    });
    if root.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        make_finding(
            meta,
            ctx,
            "Containers may be running as root user",
            "Set runAsNonRoot to true in securityContext or specify a non-root runAsUser",
        )
        .with_evidence(format!("Containers without runAsNonRoot=true: {}", root.join(", "))),
    ))
}

pub fn latest_tag() -> impl SecurityRule {
    let meta = workload_meta(
        LATEST_TAG,
        "Using Latest Image Tag",
        "Containers should not use :latest tag",
        Severity::Med,
        RuleCategory::BestPractice,
        "https://kubernetes.io/docs/concepts/containers/images/#image-names",
    );
    SimpleRule::new(meta, check_latest_tag)
}

fn check_latest_tag(meta: &RuleMeta, ctx: &RuleContext<'_>) -> RuleResult {
    let containers = extract::containers(ctx.resource)?;
    let unpinned = offenders(&containers, Container::uses_latest_tag);
    if unpinned.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        make_finding(
            meta,
            ctx,
            "Containers are using :latest or untagged images",
            "Use specific version tags for better reproducibility and security",
        )
        .with_evidence(format!("Containers with :latest tag: {}", unpinned.join(", "))),
    ))
}
