//! Transformer: runs the pipeline and stamps the result
//!
//! Stage order is fixed and visible in [`Transformer::compile`]:
//!
//! ```text
//! labels → services + endpoint ingresses → explicit ingresses → secrets
//!        → health → env-from → volume claims + binding → config maps
//!        → deployment
//! ```
//!
//! Output order differs from run order: deployment, config maps, services
//! (each followed by its ingresses), explicit ingresses, PVCs, secrets.

use k8s_openapi::api::core::v1::{Container, PodSpec, Volume};
use kube::core::TypeMeta;
use tracing::{debug, instrument};

use crate::config::TransformConfig;
use crate::error::{Result, TransformError};
use crate::object::ResourceObject;
use crate::pipeline::{config_data, deployment, env_from, health, labels, service, volumes};
use crate::registry::{BuiltinRegistry, TypeLookup, TypeRegistry};
use crate::spec::App;

/// Objects generated for one App plus its passthrough extra-resource files
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transformed {
    /// Generated objects in output order
    pub objects: Vec<ResourceObject>,
    /// `extraResources` of the App, unchanged
    pub extra_resources: Vec<String>,
}

impl Transformed {
    /// Whether nothing was generated
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Names of the generated objects, in output order
    pub fn names(&self) -> Vec<&str> {
        self.objects.iter().map(ResourceObject::name).collect()
    }
}

/// Compiles App specs into Kubernetes objects.
///
/// ```rust,ignore
/// let transformed = Transformer::new()
///     .with_config(config)
///     .with_registry(&registry)
///     .transform(&app)?;
/// ```
pub struct Transformer<'a> {
    config: TransformConfig,
    registry: &'a dyn TypeRegistry,
}

impl Default for Transformer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Transformer<'a> {
    /// Transformer with default settings and the builtin registry
    pub fn new() -> Self {
        Self {
            config: TransformConfig::default(),
            registry: &BuiltinRegistry,
        }
    }

    /// Use the given settings
    pub fn with_config(mut self, config: TransformConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve kinds and versions through `registry`
    pub fn with_registry(mut self, registry: &'a dyn TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Compile and stamp in one go
    pub fn transform(&self, app: &App) -> Result<Transformed> {
        let compiled = self.compile(app)?;
        self.stamp(compiled).map_err(|e| e.in_app(&app.name))
    }

    /// Run the pipeline without stamping.
    ///
    /// Any stage failure aborts the run; the error carries the app name.
    #[instrument(skip_all, fields(app = %app.name))]
    pub fn compile(&self, app: &App) -> Result<Transformed> {
        self.compile_stages(app).map_err(|e| e.in_app(&app.name))
    }

    fn compile_stages(&self, app: &App) -> Result<Transformed> {
        let labels = labels::resolve(app);

        let services = service::compile(app, &labels, &self.config)?;
        let ingresses = service::compile_ingresses(app, &labels);
        let secrets = config_data::compile_secrets(app, &labels);

        let containers = health::normalize(&app.containers)?;
        let containers = env_from::expand(containers, &app.containers, app)?;

        let pvcs = volumes::compile_claims(app, &labels, &self.config)?;
        let bound = volumes::bind(&containers, app)?;

        let config_maps = config_data::compile_config_maps(app, &labels);

        let root_pod = root_pod_spec(app, containers, bound);
        let deployment = deployment::merge(app, &labels, root_pod)?;

        debug!(
            deployment = deployment.is_some(),
            config_maps = config_maps.len(),
            services = services.len(),
            ingresses = ingresses.len(),
            pvcs = pvcs.len(),
            secrets = secrets.len(),
            "compiled app"
        );

        let mut objects = Vec::new();
        objects.extend(deployment.map(ResourceObject::new));
        objects.extend(config_maps.into_iter().map(ResourceObject::new));
        objects.extend(services);
        objects.extend(ingresses);
        objects.extend(pvcs.into_iter().map(ResourceObject::new));
        objects.extend(secrets.into_iter().map(ResourceObject::new));

        Ok(Transformed {
            objects,
            extra_resources: app.extra_resources.clone(),
        })
    }

    /// Attach `apiVersion`/`kind` to every object.
    ///
    /// An empty object list means the App had nothing to generate. An object
    /// the registry cannot version is a bug in the pipeline, not in the App.
    pub fn stamp(&self, mut compiled: Transformed) -> Result<Transformed> {
        if compiled.objects.is_empty() {
            return Err(TransformError::InsufficientInput);
        }

        for resource in &mut compiled.objects {
            let gvk = match self.registry.lookup(&resource.object) {
                Ok(TypeLookup::Versioned(gvk)) => gvk,
                Ok(TypeLookup::Unversioned) => {
                    return Err(TransformError::internal(
                        "stamp",
                        format!(
                            "can't output unversioned type {} {:?}",
                            resource.object.variant(),
                            resource.name()
                        ),
                    ))
                }
                Err(e) => {
                    return Err(TransformError::internal(
                        "stamp",
                        format!("kind lookup failed: {}", e),
                    ))
                }
            };
            resource.types = Some(TypeMeta {
                api_version: gvk.api_version(),
                kind: gvk.kind,
            });
        }

        Ok(compiled)
    }
}

/// The root pod template: `podSpec` with the canonical containers appended,
/// followed by explicit and claim-bound volumes.
fn root_pod_spec(app: &App, containers: Vec<Container>, bound: Vec<Volume>) -> PodSpec {
    let mut pod = app.pod_spec.clone().unwrap_or_default();
    pod.containers.extend(containers);

    let mut pod_volumes = pod.volumes.take().unwrap_or_default();
    pod_volumes.extend(app.volumes.iter().cloned());
    pod_volumes.extend(bound);
    if !pod_volumes.is_empty() {
        pod.volumes = Some(pod_volumes);
    }
    pod
}
