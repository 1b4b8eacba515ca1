use super::{ResourceAnalysis, RiskLevel, list_contains_any};
use crate::analyzer::model::value::entries;
use serde_json::Value;

const PUBLIC_MEMBERS: &[&str] = &["allUsers", "allAuthenticatedUsers"];

pub(super) fn analyze(resource_type: &str, after: &Value, analysis: &mut ResourceAnalysis) -> bool {
    match resource_type {
        "google_storage_bucket" => storage_bucket(after, analysis),
        "google_compute_firewall" => firewall(after, analysis),
        _ => return false,
    }
    true
}

fn storage_bucket(after: &Value, analysis: &mut ResourceAnalysis) {
    let public = entries(after, "iam_binding")
        .iter()
        .any(|binding| list_contains_any(binding, "members", PUBLIC_MEMBERS));
    if public {
        analysis.flag(
            "GCS bucket has public IAM bindings",
            "Remove public IAM bindings and use specific principals",
            RiskLevel::High,
        );
    }
}

fn firewall(after: &Value, analysis: &mut ResourceAnalysis) {
    if list_contains_any(after, "source_ranges", &["0.0.0.0/0"]) {
        analysis.flag(
            "GCP firewall rule allows traffic from anywhere",
            "Restrict source ranges to specific IP blocks",
            RiskLevel::High,
        );
    }
}
