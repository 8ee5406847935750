use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(
    CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema,
)]
#[kube(
    group = "maistra.io",
    version = "v2",
    kind = "ServiceMeshControlPlane",
    plural = "servicemeshcontrolplanes",
    shortname = "smcp",
    namespaced,
    status = "ControlPlaneStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneSpec {
    /// Release line of the control plane (e.g. "v2.6")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Installation profiles applied before the rest of the spec
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Version reconciled most recently
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_version: Option<String>,
}
