//! Service and ingress compilation
//!
//! Services are labeled with the app labels and select the app's pods unless
//! they declare their own selector. A port with an `endpoint` additionally
//! gets an Ingress named `<service>-<port>` that routes the endpoint's host
//! and path to that port.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use tracing::debug;

use super::object_meta;
use crate::config::TransformConfig;
use crate::error::{Result, TransformError};
use crate::object::ResourceObject;
use crate::spec::{App, ServiceDescriptor};

/// Host and path an endpoint shorthand routes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Ingress rule host; `None` matches every host
    pub host: Option<String>,
    /// Ingress path, always starting with `/`
    pub path: String,
}

/// Parse an endpoint of the form `host` or `host/path`.
///
/// `host` maps to path `/`, `host/path` to `/path`. An empty host (`/path`)
/// leaves the rule host unset. Anything with more than one `/` is rejected.
pub fn parse_endpoint(endpoint: &str, field: &str) -> Result<Endpoint> {
    let segments: Vec<&str> = endpoint.split('/').collect();
    let (host, path) = match segments.as_slice() {
        [host] => (*host, "/".to_string()),
        [host, path] => (*host, format!("/{}", path)),
        _ => {
            return Err(TransformError::malformed(
                field,
                endpoint,
                "invalid endpoint syntax, expected host or host/path",
            ))
        }
    };
    Ok(Endpoint {
        host: Some(host).filter(|h| !h.is_empty()).map(str::to_string),
        path,
    })
}

/// Compile every service, each followed by the ingresses its ports expose
pub fn compile(
    app: &App,
    labels: &BTreeMap<String, String>,
    config: &TransformConfig,
) -> Result<Vec<ResourceObject>> {
    let mut objects = Vec::new();
    for (index, descriptor) in app.services.iter().enumerate() {
        objects.push(ResourceObject::new(build_service(descriptor, labels)));

        for (port_index, port) in descriptor.ports.iter().enumerate() {
            let Some(endpoint) = port.endpoint.as_deref().filter(|e| !e.is_empty()) else {
                continue;
            };
            let field = format!("app.services[{}].ports[{}].endpoint", index, port_index);
            let endpoint = parse_endpoint(endpoint, &field)?;
            let ingress = endpoint_ingress(
                &descriptor.name,
                port.port.port,
                &endpoint,
                labels,
                config,
            );
            debug!(
                service = %descriptor.name,
                host = endpoint.host.as_deref().unwrap_or("*"),
                path = %endpoint.path,
                "synthesized ingress from port endpoint"
            );
            objects.push(ResourceObject::new(ingress));
        }
    }
    Ok(objects)
}

/// Materialize explicitly declared ingresses
pub fn compile_ingresses(app: &App, labels: &BTreeMap<String, String>) -> Vec<ResourceObject> {
    app.ingresses
        .iter()
        .map(|descriptor| {
            ResourceObject::new(Ingress {
                metadata: object_meta(&descriptor.name, labels),
                spec: Some(descriptor.spec.clone()),
                ..Default::default()
            })
        })
        .collect()
}

fn build_service(descriptor: &ServiceDescriptor, labels: &BTreeMap<String, String>) -> Service {
    let mut spec = descriptor.spec.clone();
    spec.ports
        .get_or_insert_with(Vec::new)
        .extend(descriptor.ports.iter().map(|p| p.port.clone()));
    if spec.selector.as_ref().is_none_or(BTreeMap::is_empty) {
        spec.selector = Some(labels.clone());
    }

    Service {
        metadata: object_meta(&descriptor.name, labels),
        spec: Some(spec),
        ..Default::default()
    }
}

fn endpoint_ingress(
    service_name: &str,
    port: i32,
    endpoint: &Endpoint,
    labels: &BTreeMap<String, String>,
    config: &TransformConfig,
) -> Ingress {
    Ingress {
        metadata: object_meta(&format!("{}-{}", service_name, port), labels),
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: endpoint.host.clone(),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some(endpoint.path.clone()),
                        path_type: config.ingress_path_type.clone(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: service_name.to_string(),
                                port: Some(ServiceBackendPort {
                                    number: Some(port),
                                    name: None,
                                }),
                            }),
                            resource: None,
                        },
                    }],
                }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
