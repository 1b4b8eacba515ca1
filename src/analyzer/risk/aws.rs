use super::{RiskLevel, ResourceAnalysis};
use crate::analyzer::model::value::{contains_str, entries, first_entry, get_str, is_absent, is_truthy};
use serde_json::Value;

/// Returns false when the resource type has no checks.
pub(super) fn analyze(resource_type: &str, after: &Value, analysis: &mut ResourceAnalysis) -> bool {
    match resource_type {
        "aws_s3_bucket" => s3_bucket(after, analysis),
        "aws_security_group" => {
            let mut rules: Vec<&Value> = entries(after, "ingress").iter().collect();
            rules.extend(entries(after, "egress"));
            security_group(&rules, analysis);
        }
        "aws_security_group_rule" => security_group(&[after], analysis),
        "aws_instance" => ec2_instance(after, analysis),
        "aws_db_instance" => rds_instance(after, analysis),
        _ => return false,
    }
    true
}

fn s3_bucket(after: &Value, analysis: &mut ResourceAnalysis) {
    if matches!(get_str(after, "acl"), Some("public-read") | Some("public-read-write")) {
        analysis.flag(
            "S3 bucket has public ACL",
            "Use private ACL and configure public access block",
            RiskLevel::High,
        );
    }

    if is_absent(after, "server_side_encryption_configuration") {
        analysis.flag(
            "S3 bucket lacks server-side encryption",
            "Enable server-side encryption with KMS",
            RiskLevel::Medium,
        );
    }

    let versioned = first_entry(after, "versioning").is_some_and(|v| is_truthy(v, "enabled"));
    if !versioned {
        analysis.flag(
            "S3 bucket versioning is disabled",
            "Enable versioning for data protection",
            RiskLevel::Low,
        );
    }
}

fn security_group(rules: &[&Value], analysis: &mut ResourceAnalysis) {
    for rule in rules {
        if !contains_str(rule, "cidr_blocks", "0.0.0.0/0") {
            continue;
        }
        let (from, to) = if matches!(get_str(rule, "protocol"), Some("-1") | Some("all")) {
            (0, 65535)
        } else {
            (
                rule.get("from_port").and_then(Value::as_i64).unwrap_or(0),
                rule.get("to_port")
                    .and_then(Value::as_i64)
                    .filter(|p| *p != 0)
                    .unwrap_or(65535),
            )
        };
        let reaches = |port: i64| from <= port && port <= to;
        if reaches(22) || reaches(3389) || (from <= 0 && to >= 65535) {
            analysis.flag(
                "Security group allows unrestricted access to sensitive ports",
                "Restrict source IP ranges and limit port access",
                RiskLevel::Critical,
            );
        }
    }
}

fn ec2_instance(after: &Value, analysis: &mut ResourceAnalysis) {
    if is_truthy(after, "associate_public_ip_address") {
        analysis.flag(
            "EC2 instance has public IP address",
            "Use NAT Gateway or VPC endpoints instead of direct internet access",
            RiskLevel::Medium,
        );
    }

    let tokens = first_entry(after, "metadata_options").and_then(|m| get_str(m, "http_tokens"));
    if tokens != Some("required") {
        analysis.flag(
            "EC2 instance does not require IMDSv2",
            "Enable IMDSv2 requirement for enhanced security",
            RiskLevel::Medium,
        );
    }
}

fn rds_instance(after: &Value, analysis: &mut ResourceAnalysis) {
    if is_truthy(after, "publicly_accessible") {
        analysis.flag(
            "RDS instance is publicly accessible",
            "Disable public accessibility and use VPC endpoints",
            RiskLevel::High,
        );
    }

    if !is_truthy(after, "storage_encrypted") {
        analysis.flag(
            "RDS instance storage is not encrypted",
            "Enable storage encryption",
            RiskLevel::Medium,
        );
    }
}
