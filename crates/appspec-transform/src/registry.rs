//! Kind/version resolution
//!
//! The stamper never decides on its own which API version an object is
//! serialized as; it asks a [`TypeRegistry`]. [`BuiltinRegistry`] answers from
//! the `k8s_openapi::Resource` constants of the compiled-in API version.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::Resource;
use kube::core::GroupVersionKind;
use thiserror::Error;

use crate::object::K8sObject;

/// Outcome of a registry lookup
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeLookup {
    /// The object has a concrete group/version/kind
    Versioned(GroupVersionKind),
    /// The kind is known but has no serializable version
    Unversioned,
}

/// A registry could not resolve an object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The object's kind is not registered
    #[error("no kind registered for {variant} {name:?}")]
    NotRegistered {
        /// Object variant
        variant: &'static str,
        /// Object name
        name: String,
    },
}

impl RegistryError {
    /// Create a not-registered error for an object
    pub fn not_registered(object: &K8sObject) -> Self {
        Self::NotRegistered {
            variant: object.variant(),
            name: object.name().to_string(),
        }
    }
}

/// Maps generated objects to their group/version/kind
pub trait TypeRegistry: Send + Sync {
    /// Resolve the kind and version of `object`
    fn lookup(&self, object: &K8sObject) -> Result<TypeLookup, RegistryError>;
}

/// Registry backed by the `k8s_openapi` resource constants
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinRegistry;

fn gvk_of<K: Resource>() -> GroupVersionKind {
    GroupVersionKind::gvk(K::GROUP, K::VERSION, K::KIND)
}

impl TypeRegistry for BuiltinRegistry {
    fn lookup(&self, object: &K8sObject) -> Result<TypeLookup, RegistryError> {
        let gvk = match object {
            K8sObject::Deployment(_) => gvk_of::<Deployment>(),
            K8sObject::Service(_) => gvk_of::<Service>(),
            K8sObject::Ingress(_) => gvk_of::<Ingress>(),
            K8sObject::PersistentVolumeClaim(_) => gvk_of::<PersistentVolumeClaim>(),
            K8sObject::ConfigMap(_) => gvk_of::<ConfigMap>(),
            K8sObject::Secret(_) => gvk_of::<Secret>(),
        };
        Ok(TypeLookup::Versioned(gvk))
    }
}
