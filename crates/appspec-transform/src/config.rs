//! Transformation settings
//!
//! Defaults reproduce what a cluster would assume for the equivalent fields
//! left unset, so an unconfigured [`crate::Transformer`] needs no setup.

use serde::{Deserialize, Serialize};

/// Default path type for synthesized ingress paths
pub const DEFAULT_INGRESS_PATH_TYPE: &str = "ImplementationSpecific";

/// Default access mode for volume claims that declare none
pub const DEFAULT_ACCESS_MODE: &str = "ReadWriteOnce";

/// Settings that shape generated objects without being part of the App spec
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformConfig {
    /// `pathType` of ingress paths synthesized from port endpoints
    pub ingress_path_type: String,
    /// Access modes applied to volume claims that declare none
    pub default_access_modes: Vec<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            ingress_path_type: DEFAULT_INGRESS_PATH_TYPE.to_string(),
            default_access_modes: vec![DEFAULT_ACCESS_MODE.to_string()],
        }
    }
}
