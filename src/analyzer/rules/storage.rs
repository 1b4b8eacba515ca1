//! Storage bucket posture: public ACLs, server-side encryption, versioning.

use crate::analyzer::model::value::{first_entry, get_str, is_absent};
use crate::analyzer::rules::types::{RuleCategory, Severity};
use crate::analyzer::rules::{
    RuleContext, RuleMeta, RuleResult, SecurityRule, SimpleRule, make_finding,
};

const BUCKET_TYPES: &[&str] = &["aws_s3_bucket"];
const PUBLIC_ACLS: &[&str] = &["public-read", "public-read-write"];

pub const PUBLIC_ACCESS: &str = "storage-public-access";
pub const NO_ENCRYPTION: &str = "storage-no-encryption";
pub const NO_VERSIONING: &str = "storage-no-versioning";

pub fn public_access() -> impl SecurityRule {
    let meta = RuleMeta::new(
        PUBLIC_ACCESS,
        "S3 Bucket Public Access",
        "S3 bucket should not allow public access",
        Severity::High,
        RuleCategory::Security,
    )
    .with_provider("aws")
    .with_resource_types(BUCKET_TYPES.iter().copied())
    .with_references([
        "https://docs.aws.amazon.com/AmazonS3/latest/userguide/access-control-block-public-access.html",
    ]);
    SimpleRule::new(meta, check_public_access)
}

fn check_public_access(meta: &RuleMeta, ctx: &RuleContext<'_>) -> RuleResult {
    let Some(acl) = get_str(ctx.resource, "acl") else {
        return Ok(None);
    };
    if !PUBLIC_ACLS.contains(&acl) {
        return Ok(None);
    }

    Ok(Some(
        make_finding(
            meta,
            ctx,
            "S3 bucket has public ACL configuration",
            "Set ACL to \"private\" and configure aws_s3_bucket_public_access_block resource",
        )
        .with_evidence(format!("ACL is set to \"{}\"", acl)),
    ))
}

pub fn no_encryption() -> impl SecurityRule {
    let meta = RuleMeta::new(
        NO_ENCRYPTION,
        "S3 Bucket Encryption",
        "S3 bucket should have server-side encryption configured",
        Severity::High,
        RuleCategory::Security,
    )
    .with_provider("aws")
    .with_resource_types(BUCKET_TYPES.iter().copied())
    .with_references(["https://docs.aws.amazon.com/AmazonS3/latest/userguide/serv-side-encryption.html"]);
    SimpleRule::new(meta, check_encryption)
}

fn check_encryption(meta: &RuleMeta, ctx: &RuleContext<'_>) -> RuleResult {
    if !is_absent(ctx.resource, "server_side_encryption_configuration") {
        return Ok(None);
    }

    Ok(Some(
        make_finding(
            meta,
            ctx,
            "S3 bucket does not have server-side encryption configured",
            "Add server_side_encryption_configuration block with AES256 or aws:kms encryption",
        )
        .with_evidence("Missing server_side_encryption_configuration block"),
    ))
}

pub fn no_versioning() -> impl SecurityRule {
    let meta = RuleMeta::new(
        NO_VERSIONING,
        "S3 Bucket Versioning",
        "S3 bucket should have versioning enabled",
        Severity::Med,
        RuleCategory::BestPractice,
    )
    .with_provider("aws")
    .with_resource_types(BUCKET_TYPES.iter().copied())
    .with_references(["https://docs.aws.amazon.com/AmazonS3/latest/userguide/Versioning.html"]);
    SimpleRule::new(meta, check_versioning)
}

fn check_versioning(meta: &RuleMeta, ctx: &RuleContext<'_>) -> RuleResult {
    let evidence = if is_absent(ctx.resource, "versioning") {
        "Missing versioning configuration"
    } else {
        // Terraform renders the block as a list; a bare object is accepted too.
        let block = first_entry(ctx.resource, "versioning").or_else(|| {
            ctx.resource
                .get("versioning")
                .filter(|v| v.is_object())
        });
        let enabled = block.and_then(|b| b.get("enabled")).and_then(|e| e.as_bool());
        if enabled == Some(true) {
            return Ok(None);
        }
        "Versioning is disabled"
    };

    Ok(Some(
        make_finding(
            meta,
            ctx,
            "S3 bucket does not have versioning enabled",
            "Enable versioning to protect against accidental deletion and modification",
        )
        .with_evidence(evidence),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::Finding;
    use serde_json::{Value, json};

    fn run(rule: &impl SecurityRule, resource: Value) -> Option<Finding> {
        let ctx = RuleContext::new(&resource, "aws_s3_bucket", "logs", None);
        rule.evaluate(&ctx).unwrap()
    }

    #[test]
    fn test_public_acl() {
        let finding = run(&public_access(), json!({"acl": "public-read"})).unwrap();
        assert_eq!(finding.rule_id, PUBLIC_ACCESS);
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.evidence.as_deref(), Some("ACL is set to \"public-read\""));

        let finding = run(&public_access(), json!({"acl": "public-read-write"})).unwrap();
        assert!(finding.evidence.unwrap().contains("public-read-write"));
    }

    #[test]
    fn test_private_acl() {
        assert!(run(&public_access(), json!({"acl": "private"})).is_none());
        assert!(run(&public_access(), json!({})).is_none());
    }

    #[test]
    fn test_encryption() {
        assert!(run(&no_encryption(), json!({})).is_some());
        assert!(run(&no_encryption(), json!({"server_side_encryption_configuration": null})).is_some());
        let configured = json!({
            "server_side_encryption_configuration": [{
                "rule": [{"apply_server_side_encryption_by_default": [{"sse_algorithm": "AES256"}]}]
            }]
        });
        assert!(run(&no_encryption(), configured).is_none());
    }

    #[test]
    fn test_empty_blocks_count_as_configured() {
        let bucket = json!({"server_side_encryption_configuration": [], "versioning": []});
        assert!(run(&no_encryption(), bucket.clone()).is_none());

        let versioning = run(&no_versioning(), bucket).unwrap();
        assert_eq!(versioning.evidence.as_deref(), Some("Versioning is disabled"));
    }

    #[test]
    fn test_versioning_missing_vs_disabled() {
        let missing = run(&no_versioning(), json!({})).unwrap();
        assert_eq!(missing.severity, Severity::Med);
        assert_eq!(missing.evidence.as_deref(), Some("Missing versioning configuration"));

        let null = run(&no_versioning(), json!({"versioning": null})).unwrap();
        assert_eq!(null.evidence.as_deref(), Some("Missing versioning configuration"));

        let disabled = run(&no_versioning(), json!({"versioning": [{"enabled": false}]})).unwrap();
        assert_eq!(disabled.evidence.as_deref(), Some("Versioning is disabled"));

        assert!(run(&no_versioning(), json!({"versioning": [{"enabled": true}]})).is_none());
        assert!(run(&no_versioning(), json!({"versioning": {"enabled": true}})).is_none());
    }
}
