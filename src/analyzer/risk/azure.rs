use super::{ResourceAnalysis, RiskLevel};
use crate::analyzer::model::value::{entries, get_str, is_truthy};
use serde_json::Value;

const ANY_SOURCE: &[&str] = &["*", "0.0.0.0/0"];

pub(super) fn analyze(resource_type: &str, after: &Value, analysis: &mut ResourceAnalysis) -> bool {
    match resource_type {
        "azurerm_storage_account" => storage_account(after, analysis),
        "azurerm_network_security_group" => network_security_group(after, analysis),
        _ => return false,
    }
    true
}

fn storage_account(after: &Value, analysis: &mut ResourceAnalysis) {
    if get_str(after, "min_tls_version") != Some("TLS1_2") {
        analysis.flag(
            "Azure Storage Account allows weak TLS versions",
            "Set minimum TLS version to TLS1_2",
            RiskLevel::Medium,
        );
    }

    // Provider 4.x renamed the attribute to `https_traffic_only_enabled`.
    let https_only =
        is_truthy(after, "https_traffic_only") || is_truthy(after, "https_traffic_only_enabled");
    if !https_only {
        analysis.flag(
            "Azure Storage Account allows HTTP traffic",
            "Enable HTTPS-only traffic",
            RiskLevel::High,
        );
    }
}

fn network_security_group(after: &Value, analysis: &mut ResourceAnalysis) {
    let open = entries(after, "security_rule").iter().any(|rule| {
        get_str(rule, "source_address_prefix").is_some_and(|prefix| ANY_SOURCE.contains(&prefix))
    });
    if open {
        analysis.flag(
            "Azure NSG rule allows traffic from any source",
            "Restrict source address prefixes",
            RiskLevel::High,
        );
    }
}
