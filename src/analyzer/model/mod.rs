//! Typed configuration model shared by the parsers, rules and analyzers.

pub mod kubernetes;
pub mod terraform;
pub mod validate;
pub mod value;

pub use kubernetes::{
    ClusterResource, Container, DEFAULT_NAMESPACE, ObjectMeta, PodSecurityContext,
    ResourceRequirements, SecurityContext,
};
pub use terraform::{
    Action, Change, ChangeAction, Mode, PlanSummary, ResourceChange, ResourceInfo, TerraformPlan,
    provider_short_name,
};
pub use validate::{FieldIssue, ValidationError};
