//! Deployment merge
//!
//! A pod template can come from the root of the App (containers, volumes,
//! `podSpec`) or from `deployment.template.spec`. Exactly one of them may be
//! set; with neither there is nothing to deploy.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::PodSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use tracing::debug;

use super::object_meta;
use crate::error::{Result, TransformError};
use crate::spec::App;

fn is_empty_pod(spec: Option<&PodSpec>) -> bool {
    spec.is_none_or(|s| *s == PodSpec::default())
}

/// Merge the root pod template into the deployment.
///
/// Returns `Ok(None)` when neither template has content, and a conflict when
/// both do. The pod template's name and labels are always the app's.
pub fn merge(
    app: &App,
    labels: &BTreeMap<String, String>,
    root_pod: PodSpec,
) -> Result<Option<Deployment>> {
    let mut spec: DeploymentSpec = app.deployment.clone().unwrap_or_default();
    let root_empty = root_pod == PodSpec::default();
    let embedded_empty = is_empty_pod(spec.template.spec.as_ref());

    match (root_empty, embedded_empty) {
        (true, true) => {
            debug!(app = %app.name, "no pod template given, not enough data to create a deployment");
            return Ok(None);
        }
        (false, false) => {
            return Err(TransformError::conflict(
                "app.deployment.template.spec",
                "pod can't be specified in two places, use the top level pod fields or \
                 deployment.template.spec, not both",
            ))
        }
        (false, true) => spec.template.spec = Some(root_pod),
        (true, false) => {}
    }

    let template_meta = spec.template.metadata.get_or_insert_with(ObjectMeta::default);
    template_meta.name = Some(app.name.clone());
    template_meta.labels = Some(labels.clone());

    if spec.selector == LabelSelector::default() {
        spec.selector = LabelSelector {
            match_labels: Some(labels.clone()),
            ..Default::default()
        };
    }

    Ok(Some(Deployment {
        metadata: object_meta(&app.name, labels),
        spec: Some(spec),
        ..Default::default()
    }))
}
