//! Security group exposure: sensitive ports and unrestricted egress open to
//! the whole internet.

use crate::analyzer::model::value::{contains_str, get_str};
use crate::analyzer::rules::types::{RuleCategory, Severity};
use crate::analyzer::rules::{
    RuleContext, RuleError, RuleMeta, RuleResult, SecurityRule, SimpleRule, make_finding,
};
use serde_json::Value;

const SECURITY_GROUP_TYPES: &[&str] = &["aws_security_group", "aws_security_group_rule"];
const SG_REFERENCE: &str = "https://docs.aws.amazon.com/vpc/latest/userguide/VPC_SecurityGroups.html";

/// Ports whose exposure to the internet is flagged.
pub const SENSITIVE_PORTS: &[i64] = &[22, 3389, 1433, 3306, 5432, 6379, 27017];

const ANY_IPV4: &str = "0.0.0.0/0";
const ANY_IPV6: &str = "::/0";
const MIN_PORT: i64 = 0;
const MAX_PORT: i64 = 65535;
const SSH_PORT: i64 = 22;

pub const OPEN_INGRESS: &str = "network-open-ingress";
pub const OPEN_EGRESS: &str = "network-open-egress";
pub const SSH_OPEN: &str = "network-ssh-open";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Ingress,
    Egress,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Ingress => "ingress",
            Self::Egress => "egress",
        }
    }
}

pub fn open_ingress() -> impl SecurityRule {
    let meta = RuleMeta::new(
        OPEN_INGRESS,
        "Security Group Open to All",
        "Security group should not allow unrestricted access from 0.0.0.0/0",
        Severity::Crit,
        RuleCategory::Security,
    )
    .with_provider("aws")
    .with_resource_types(SECURITY_GROUP_TYPES.iter().copied())
    .with_references([SG_REFERENCE]);
    SimpleRule::new(meta, check_open_ingress)
}

fn check_open_ingress(meta: &RuleMeta, ctx: &RuleContext<'_>) -> RuleResult {
    for entry in rule_entries(ctx, Direction::Ingress)? {
        let Some(cidr) = open_cidr(entry) else {
            continue;
        };
        let (from, to) = port_range(entry)?;
        let exposed: Vec<String> = SENSITIVE_PORTS
            .iter()
            .filter(|&&port| from <= port && port <= to)
            .map(ToString::to_string)
            .collect();
        if exposed.is_empty() {
            continue;
        }

        return Ok(Some(
            make_finding(
                meta,
                ctx,
                "Security group allows unrestricted access to sensitive ports",
                "Restrict source CIDR blocks to specific IP ranges and limit port access",
            )
            .with_evidence(format!(
                "Ingress rule allows {} access to ports: {}",
                cidr,
                exposed.join(", ")
            )),
        ));
    }
    Ok(None)
}

pub fn open_egress() -> impl SecurityRule {
    let meta = RuleMeta::new(
        OPEN_EGRESS,
        "Security Group Open to All",
        "Security group should not allow unrestricted outbound access to 0.0.0.0/0",
        Severity::Crit,
        RuleCategory::Security,
    )
    .with_provider("aws")
    .with_resource_types(SECURITY_GROUP_TYPES.iter().copied())
    .with_references([SG_REFERENCE]);
    SimpleRule::new(meta, check_open_egress)
}

fn check_open_egress(meta: &RuleMeta, ctx: &RuleContext<'_>) -> RuleResult {
    for entry in rule_entries(ctx, Direction::Egress)? {
        let Some(cidr) = open_cidr(entry) else {
            continue;
        };
        let (from, to) = port_range(entry)?;
        if from > MIN_PORT || to < MAX_PORT {
            continue;
        }

        // Outbound exposure is reported one level below the declared severity.
        return Ok(Some(
            make_finding(
                meta,
                ctx,
                "Security group allows unrestricted outbound access",
                "Limit outbound traffic to specific destinations and ports",
            )
            .with_severity(Severity::High)
            .with_evidence(format!("Egress rule allows {} access to all ports", cidr)),
        ));
    }
    Ok(None)
}

pub fn ssh_open() -> impl SecurityRule {
    let meta = RuleMeta::new(
        SSH_OPEN,
        "SSH Access Open to Internet",
        "Security group should not allow SSH access from 0.0.0.0/0",
        Severity::Crit,
        RuleCategory::Security,
    )
    .with_provider("aws")
    .with_resource_types(SECURITY_GROUP_TYPES.iter().copied())
    .with_references(["https://docs.aws.amazon.com/systems-manager/latest/userguide/session-manager.html"]);
    SimpleRule::new(meta, check_ssh_open)
}

fn check_ssh_open(meta: &RuleMeta, ctx: &RuleContext<'_>) -> RuleResult {
    for entry in rule_entries(ctx, Direction::Ingress)? {
        if !contains_str(entry, "cidr_blocks", ANY_IPV4) {
            continue;
        }
        let (from, to) = port_range(entry)?;
        if from <= SSH_PORT && SSH_PORT <= to {
            return Ok(Some(
                make_finding(
                    meta,
                    ctx,
                    "Security group allows SSH access from anywhere on the internet",
                    "Restrict SSH access to specific IP addresses or use AWS Systems Manager Session Manager",
                )
                .with_evidence("SSH port (22) is accessible from 0.0.0.0/0"),
            ));
        }
    }
    Ok(None)
}

/// The rule entries of one direction.
///
/// `aws_security_group` carries nested `ingress`/`egress` lists, while an
/// `aws_security_group_rule` is itself a single entry whose `type` names the
/// direction.
fn rule_entries<'a>(ctx: &RuleContext<'a>, direction: Direction) -> Result<Vec<&'a Value>, RuleError> {
    let resource = ctx.resource;
    if ctx.resource_type == "aws_security_group_rule" {
        return Ok(match get_str(resource, "type") {
            Some(t) if t == direction.as_str() => vec![resource],
            _ => Vec::new(),
        });
    }

    match resource.get(direction.as_str()) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().collect()),
        Some(_) => Err(RuleError::malformed(
            direction.as_str(),
            "expected a list of rule blocks",
        )),
    }
}

fn open_cidr(entry: &Value) -> Option<&'static str> {
    if contains_str(entry, "cidr_blocks", ANY_IPV4) {
        Some(ANY_IPV4)
    } else if contains_str(entry, "ipv6_cidr_blocks", ANY_IPV6) {
        Some(ANY_IPV6)
    } else {
        None
    }
}

/// Inclusive port range of an entry. A missing `from_port` starts at 0 and a
/// missing or zero `to_port` ends at 65535; protocol `-1` covers every port.
fn port_range(entry: &Value) -> Result<(i64, i64), RuleError> {
    if matches!(get_str(entry, "protocol"), Some("-1") | Some("all")) {
        return Ok((MIN_PORT, MAX_PORT));
    }
    let from = port(entry, "from_port")?.unwrap_or(MIN_PORT);
    let to = port(entry, "to_port")?.filter(|p| *p != 0).unwrap_or(MAX_PORT);
    Ok((from, to))
}

fn port(entry: &Value, key: &str) -> Result<Option<i64>, RuleError> {
    match entry.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| RuleError::malformed(key, format!("expected a port number, got {}", value))),
    }
}
