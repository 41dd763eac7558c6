//! App spec data model
//!
//! The App spec is a compact description of one application. Most descriptors
//! embed a full Kubernetes structure (flattened, so its fields sit next to the
//! shorthand ones) and add a few shorthand fields that the pipeline expands:
//!
//! - `health` on a container becomes both liveness and readiness probes
//! - `envFrom` on a container becomes explicit `valueFrom` env vars
//! - `endpoint` on a service port becomes an Ingress
//! - `size` on a volume claim becomes a storage request
//!
//! An external loader produces these values; nothing here reads files.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::core::v1::{
    Container, PersistentVolumeClaimSpec, PodSpec, Probe, ServicePort, ServiceSpec, Volume,
    VolumeMount,
};
use k8s_openapi::api::networking::v1::IngressSpec;
use k8s_openapi::ByteString;
use serde::{Deserialize, Serialize};

// =============================================================================
// App
// =============================================================================

/// Root of an App spec
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    /// App name, used for the Deployment and as the default `app` label
    pub name: String,

    /// App-wide labels; defaults to `{"app": name}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    /// Containers of the root-level pod template
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<ContainerDescriptor>,

    /// Remaining root-level pod template attributes (scheduling, security, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_spec: Option<PodSpec>,

    /// Explicit pod-level volumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,

    /// Deployment settings; may embed its own pod template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentSpec>,

    /// Services, each optionally exposing ports through an endpoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceDescriptor>,

    /// Explicit ingresses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingresses: Vec<IngressDescriptor>,

    /// Root-level persistent volume claims
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_claims: Vec<VolumeClaimDescriptor>,

    /// Root-level config maps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config_maps: Vec<ConfigMapDescriptor>,

    /// Root-level secrets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<SecretDescriptor>,

    /// Files with additional manifests, passed through untouched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_resources: Vec<String>,
}

impl App {
    /// Create an empty App with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Look up a root-level config map by name
    pub fn config_map(&self, name: &str) -> Option<&ConfigMapDescriptor> {
        self.config_maps.iter().find(|cm| cm.name == name)
    }

    /// Look up a root-level secret by name
    pub fn secret(&self, name: &str) -> Option<&SecretDescriptor> {
        self.secrets.iter().find(|s| s.name == name)
    }

    /// Whether a root-level volume claim with this name exists
    pub fn has_volume_claim(&self, name: &str) -> bool {
        self.volume_claims.iter().any(|vc| vc.name == name)
    }
}

// =============================================================================
// Containers
// =============================================================================

/// A container plus its shorthand fields
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDescriptor {
    /// Base container definition
    #[serde(flatten)]
    pub container: Container,

    /// Probe used for both liveness and readiness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<Probe>,

    /// Config maps and secrets whose keys become env vars
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_from: Vec<EnvFromReference>,
}

impl ContainerDescriptor {
    /// Create a container with a name and image
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            container: Container {
                name: name.into(),
                image: Some(image.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Set the health shorthand
    pub fn with_health(mut self, probe: Probe) -> Self {
        self.health = Some(probe);
        self
    }

    /// Mount a volume (pod volume or root-level claim) at `mount_path`
    pub fn with_mount(mut self, name: impl Into<String>, mount_path: impl Into<String>) -> Self {
        self.container
            .volume_mounts
            .get_or_insert_with(Vec::new)
            .push(VolumeMount {
                name: name.into(),
                mount_path: mount_path.into(),
                ..Default::default()
            });
        self
    }

    /// Add an env-from reference
    pub fn with_env_from(mut self, reference: EnvFromReference) -> Self {
        self.env_from.push(reference);
        self
    }
}

/// Named reference to a root-level config map and/or secret
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvFromReference {
    /// Config map whose data keys become env vars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_ref: Option<NameReference>,

    /// Secret whose data and stringData keys become env vars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<NameReference>,
}

impl EnvFromReference {
    /// Reference a config map
    pub fn config_map(name: impl Into<String>) -> Self {
        Self {
            config_map_ref: Some(NameReference { name: name.into() }),
            secret_ref: None,
        }
    }

    /// Reference a secret
    pub fn secret(name: impl Into<String>) -> Self {
        Self {
            config_map_ref: None,
            secret_ref: Some(NameReference { name: name.into() }),
        }
    }
}

/// Reference to a root-level object by name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameReference {
    /// Object name
    pub name: String,
}

// =============================================================================
// Services and ingresses
// =============================================================================

/// A service and its ports
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// Service name
    pub name: String,

    /// Base service spec; `ports` is taken from the descriptor's own list
    #[serde(flatten)]
    pub spec: ServiceSpec,

    /// Ports, each optionally exposed through an endpoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ServicePortDescriptor>,
}

impl ServiceDescriptor {
    /// Create a service with no ports
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a port, optionally exposed at `endpoint` (`host` or `host/path`)
    pub fn with_port(mut self, port: i32, endpoint: Option<&str>) -> Self {
        self.ports.push(ServicePortDescriptor {
            port: ServicePort {
                port,
                ..Default::default()
            },
            endpoint: endpoint.map(str::to_string),
        });
        self
    }
}

/// A service port plus the endpoint shorthand
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePortDescriptor {
    /// Base port definition
    #[serde(flatten)]
    pub port: ServicePort,

    /// `host` or `host/path` to expose this port at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// An explicit ingress
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressDescriptor {
    /// Ingress name
    pub name: String,

    /// Ingress spec, used as-is
    #[serde(flatten)]
    pub spec: IngressSpec,
}

// =============================================================================
// Storage
// =============================================================================

/// A root-level persistent volume claim
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeClaimDescriptor {
    /// Claim name; container mounts with this name bind to it
    pub name: String,

    /// Storage size shorthand (e.g. `1Gi`), exclusive with `resources.requests`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Base claim spec
    #[serde(flatten)]
    pub spec: PersistentVolumeClaimSpec,
}

impl VolumeClaimDescriptor {
    /// Create a claim using the size shorthand
    pub fn with_size(name: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: Some(size.into()),
            ..Default::default()
        }
    }
}

// =============================================================================
// Configuration data
// =============================================================================

/// A root-level config map
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMapDescriptor {
    /// Config map name
    pub name: String,

    /// String data
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl ConfigMapDescriptor {
    /// Create an empty config map
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: BTreeMap::new(),
        }
    }

    /// Add a data entry
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// A root-level secret
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretDescriptor {
    /// Secret name
    pub name: String,

    /// Base64-encoded data
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, ByteString>,

    /// Plain-text data
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_data: BTreeMap<String, String>,

    /// Secret type (e.g. `Opaque`)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

impl SecretDescriptor {
    /// Create an empty secret
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a binary data entry
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.data.insert(key.into(), ByteString(value.into()));
        self
    }

    /// Add a plain-text data entry
    pub fn with_string_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.string_data.insert(key.into(), value.into());
        self
    }
}
