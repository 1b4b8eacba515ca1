//! Kubernetes object records.
//!
//! `ClusterResource` is validated at the boundary; `spec` and `status` stay
//! open maps. Container-level records are typed because the container rules
//! read them field by field, but only those fields are modelled.

use crate::analyzer::manifest::extract;
use crate::analyzer::model::validate::{ValidationError, Validator, join};
use crate::analyzer::rules::RuleError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Namespace used when a resource does not declare one.
pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

/// A validated manifest document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResource {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Map<String, Value>>,
    #[serde(skip)]
    raw: Value,
}

impl ClusterResource {
    pub fn from_value(raw: &Value) -> Result<Self, ValidationError> {
        let mut v = Validator::new();
        if v.object(raw, "").is_none() {
            return Err(v.into_error());
        }

        let api_version = v.require_str(raw, "apiVersion", "");
        let kind = v.require_str(raw, "kind", "");

        let mut metadata = None;
        if let Some(meta) = v.require_object(raw, "metadata", "") {
            let name = v.require_str(meta, "name", "metadata");
            let namespace = v.optional_str(meta, "namespace", "metadata");
            let labels = v.optional_string_map(meta, "labels", "metadata");
            let annotations = v.optional_string_map(meta, "annotations", "metadata");
            metadata = name.map(|name| ObjectMeta {
                name: name.to_string(),
                namespace: namespace.map(str::to_string),
                labels,
                annotations,
            });
        }

        let spec = v.optional_object(raw, "spec", "");
        let status = v.optional_object(raw, "status", "");

        if let Some(kind) = kind.filter(|k| k.trim().is_empty()) {
            v.issue(join("", "kind"), format!("must not be blank, received `{}`", kind));
        }

        v.finish(|| ClusterResource {
            api_version: api_version.unwrap_or_default().to_string(),
            kind: kind.unwrap_or_default().to_string(),
            metadata: metadata.unwrap_or_default(),
            spec,
            status,
            raw: raw.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref()
    }

    pub fn namespace_or_default(&self) -> &str {
        self.namespace().unwrap_or(DEFAULT_NAMESPACE)
    }

    /// The document exactly as it was parsed, including unmodelled keys.
    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    /// Containers declared by this resource's pod template.
    pub fn containers(&self) -> Result<Vec<Container>, RuleError> {
        extract::containers_for(&self.kind, self.spec.as_ref())
    }

    pub fn pod_security_context(&self) -> Result<Option<PodSecurityContext>, RuleError> {
        extract::pod_security_context_for(&self.kind, self.spec.as_ref())
    }
}

/// Decode an optional field, treating a value of the wrong shape as unset.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub allow_privilege_escalation: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub run_as_non_root: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSecurityContext {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub run_as_non_root: Option<bool>,
}

/// The parts of a container spec the container rules inspect. Other keys
/// (`env`, `ports`, `volumeMounts`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,
}

impl Container {
    pub fn has_limits(&self) -> bool {
        self.resources
            .as_ref()
            .and_then(|r| r.limits.as_ref())
            .is_some()
    }

    /// `runAsNonRoot` from the container, falling back to the pod.
    pub fn effective_run_as_non_root(&self, pod: Option<&PodSecurityContext>) -> Option<bool> {
        self.security_context
            .as_ref()
            .and_then(|sc| sc.run_as_non_root)
            .or_else(|| pod.and_then(|p| p.run_as_non_root))
    }

    pub fn allows_privilege_escalation(&self) -> bool {
        self.security_context
            .as_ref()
            .and_then(|sc| sc.allow_privilege_escalation)
            == Some(true)
    }

    /// Images without an explicit tag resolve to `latest`. A container with
    /// no image at all has no pinned tag either.
    pub fn uses_latest_tag(&self) -> bool {
        match self.image.as_deref() {
            Some(image) => image.ends_with(":latest") || !image.contains(':'),
            None => true,
        }
    }
}
