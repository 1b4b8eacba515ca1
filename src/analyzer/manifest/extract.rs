//! Container and pod security context extraction, dispatched on kind.

use crate::analyzer::model::{Container, PodSecurityContext};
use crate::analyzer::rules::RuleError;
use serde_json::{Map, Value};

/// Kinds that carry a pod template the container rules can inspect.
pub const WORKLOAD_KINDS: &[&str] = &["Pod", "Deployment", "StatefulSet", "DaemonSet"];

/// Containers of a raw manifest document. Unknown kinds have none.
pub fn containers(resource: &Value) -> Result<Vec<Container>, RuleError> {
    let kind = resource.get("kind").and_then(Value::as_str).unwrap_or_default();
    containers_for(kind, spec_of(resource)?)
}

/// Pod-level security context of a raw manifest document, if any.
pub fn pod_security_context(resource: &Value) -> Result<Option<PodSecurityContext>, RuleError> {
    let kind = resource.get("kind").and_then(Value::as_str).unwrap_or_default();
    pod_security_context_for(kind, spec_of(resource)?)
}

pub(crate) fn containers_for(
    kind: &str,
    spec: Option<&Map<String, Value>>,
) -> Result<Vec<Container>, RuleError> {
    let Some((pod, field)) = pod_spec(kind, spec) else {
        return Ok(Vec::new());
    };

    let items = match pod.get("containers") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(RuleError::malformed(
                format!("{}.containers", field),
                "expected a list of containers",
            ));
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<Container>(item.clone()).map_err(|e| {
                RuleError::malformed(format!("{}.containers[{}]", field, i), e.to_string())
            })
        })
        .collect()
}

pub(crate) fn pod_security_context_for(
    kind: &str,
    spec: Option<&Map<String, Value>>,
) -> Result<Option<PodSecurityContext>, RuleError> {
    let Some((pod, field)) = pod_spec(kind, spec) else {
        return Ok(None);
    };

    match pod.get("securityContext") {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => serde_json::from_value::<PodSecurityContext>(raw.clone())
            .map(Some)
            .map_err(|e| RuleError::malformed(format!("{}.securityContext", field), e.to_string())),
    }
}

/// The pod spec for a kind, with the field path it was found at.
fn pod_spec<'a>(
    kind: &str,
    spec: Option<&'a Map<String, Value>>,
) -> Option<(&'a Map<String, Value>, &'static str)> {
    let spec = spec?;
    match kind {
        "Pod" => Some((spec, "spec")),
        "Deployment" | "StatefulSet" | "DaemonSet" => spec
            .get("template")?
            .get("spec")?
            .as_object()
            .map(|pod| (pod, "spec.template.spec")),
        _ => None,
    }
}

fn spec_of(resource: &Value) -> Result<Option<&Map<String, Value>>, RuleError> {
    match resource.get("spec") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(spec)) => Ok(Some(spec)),
        Some(_) => Err(RuleError::malformed("spec", "expected an object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pod_containers() {
        let pod = json!({
            "kind": "Pod",
            "spec": {"containers": [{"name": "a", "image": "nginx"}]}
        });
        let found = containers(&pod).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "a");
    }

    #[test]
    fn test_workload_containers() {
        for kind in ["Deployment", "StatefulSet", "DaemonSet"] {
            let workload = json!({
                "kind": kind,
                "spec": {"template": {"spec": {
                    "securityContext": {"runAsNonRoot": true, "fsGroup": 2000},
                    "containers": [{"name": "a"}, {"name": "b"}]
                }}}
            });
            assert_eq!(containers(&workload).unwrap().len(), 2, "{}", kind);
            let pod = pod_security_context(&workload).unwrap().unwrap();
            assert_eq!(pod.run_as_non_root, Some(true));
        }
    }

    #[test]
    fn test_other_kinds_have_no_containers() {
        let svc = json!({"kind": "Service", "spec": {"containers": [{"name": "x"}]}});
        assert!(containers(&svc).unwrap().is_empty());
        assert!(pod_security_context(&svc).unwrap().is_none());
    }

    #[test]
    fn test_malformed_containers() {
        let pod = json!({"kind": "Pod", "spec": {"containers": {"name": "a"}}});
        match containers(&pod) {
            Err(RuleError::MalformedResource { field, .. }) => assert_eq!(field, "spec.containers"),
            other => panic!("expected malformed resource, got {:?}", other),
        }

        let pod = json!({"kind": "Pod", "spec": {"containers": [{"image": "nginx"}]}});
        match containers(&pod) {
            Err(RuleError::MalformedResource { field, .. }) => {
                assert_eq!(field, "spec.containers[0]")
            }
            other => panic!("expected malformed resource, got {:?}", other),
        }
    }
}
