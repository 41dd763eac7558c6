//! Generated Kubernetes objects
//!
//! The pipeline produces typed `k8s_openapi` objects wrapped in
//! [`ResourceObject`]. Type metadata starts out empty and is filled in by the
//! version stamper once the registry has resolved it.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::TypeMeta;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

/// One generated Kubernetes object
#[derive(Clone, Debug, PartialEq)]
pub enum K8sObject {
    /// apps/v1 Deployment
    Deployment(Deployment),
    /// v1 Service
    Service(Service),
    /// networking.k8s.io/v1 Ingress
    Ingress(Ingress),
    /// v1 PersistentVolumeClaim
    PersistentVolumeClaim(PersistentVolumeClaim),
    /// v1 ConfigMap
    ConfigMap(ConfigMap),
    /// v1 Secret
    Secret(Secret),
}

impl K8sObject {
    /// Object metadata
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Deployment(o) => &o.metadata,
            Self::Service(o) => &o.metadata,
            Self::Ingress(o) => &o.metadata,
            Self::PersistentVolumeClaim(o) => &o.metadata,
            Self::ConfigMap(o) => &o.metadata,
            Self::Secret(o) => &o.metadata,
        }
    }

    /// Object name (empty if unset)
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// Short variant label, used in logs and error messages
    pub fn variant(&self) -> &'static str {
        match self {
            Self::Deployment(_) => "Deployment",
            Self::Service(_) => "Service",
            Self::Ingress(_) => "Ingress",
            Self::PersistentVolumeClaim(_) => "PersistentVolumeClaim",
            Self::ConfigMap(_) => "ConfigMap",
            Self::Secret(_) => "Secret",
        }
    }
}

impl Serialize for K8sObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Deployment(o) => o.serialize(serializer),
            Self::Service(o) => o.serialize(serializer),
            Self::Ingress(o) => o.serialize(serializer),
            Self::PersistentVolumeClaim(o) => o.serialize(serializer),
            Self::ConfigMap(o) => o.serialize(serializer),
            Self::Secret(o) => o.serialize(serializer),
        }
    }
}

macro_rules! impl_from_object {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for K8sObject {
                fn from(o: $variant) -> Self {
                    Self::$variant(o)
                }
            }
        )*
    };
}

impl_from_object!(
    Deployment,
    Service,
    Ingress,
    PersistentVolumeClaim,
    ConfigMap,
    Secret,
);

/// A generated object plus the type metadata resolved for it
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceObject {
    /// `apiVersion`/`kind`, set by the version stamper
    pub types: Option<TypeMeta>,
    /// The object itself
    pub object: K8sObject,
}

impl ResourceObject {
    /// Wrap an unstamped object
    pub fn new(object: impl Into<K8sObject>) -> Self {
        Self {
            types: None,
            object: object.into(),
        }
    }

    /// Object name
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Whether type metadata has been attached
    pub fn is_stamped(&self) -> bool {
        self.types.is_some()
    }
}

impl Serialize for ResourceObject {
    /// Serializes the object with the stamped `apiVersion`/`kind` taking
    /// precedence over whatever the typed object would emit on its own.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.object).map_err(S::Error::custom)?;
        if let (Some(types), Some(map)) = (&self.types, value.as_object_mut()) {
            map.insert("apiVersion".to_string(), types.api_version.clone().into());
            map.insert("kind".to_string(), types.kind.clone().into());
        }
        value.serialize(serializer)
    }
}
