//! App spec → Kubernetes object compiler
//!
//! Compiles a compact, user-facing [`App`] description into the Kubernetes
//! objects that run it: a Deployment, Services, Ingresses, PVCs, ConfigMaps
//! and Secrets. Shorthand fields are expanded along the way:
//!
//! - **health**: one probe becomes liveness and readiness probes
//! - **envFrom**: config map / secret references become `valueFrom` env vars
//! - **endpoint**: a service port's `host/path` becomes an Ingress
//! - **volume claims**: a `size` becomes a PVC, and mounts naming the claim
//!   get a matching pod volume
//!
//! The transformation is pure: the App is only borrowed, and the same input
//! always yields the same objects in the same order.
//!
//! # Usage
//!
//! ```rust,ignore
//! let transformed = appspec_transform::transform(&app)?;
//! for object in &transformed.objects {
//!     println!("{}", serde_json::to_string(object)?);
//! }
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod object;
pub mod quantity;
pub mod registry;
pub mod spec;

mod pipeline;

pub use compiler::{Transformed, Transformer};
pub use config::TransformConfig;
pub use error::{Result, TransformError};
pub use object::{K8sObject, ResourceObject};
pub use pipeline::service::{parse_endpoint, Endpoint};
pub use registry::{BuiltinRegistry, RegistryError, TypeLookup, TypeRegistry};
pub use spec::{
    App, ConfigMapDescriptor, ContainerDescriptor, EnvFromReference, IngressDescriptor,
    NameReference, SecretDescriptor, ServiceDescriptor, ServicePortDescriptor,
    VolumeClaimDescriptor,
};

/// Compile and stamp `app` with default settings and the builtin registry
pub fn transform(app: &App) -> Result<Transformed> {
    Transformer::new().transform(app)
}
