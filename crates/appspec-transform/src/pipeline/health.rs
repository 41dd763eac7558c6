//! Container health normalization
//!
//! Turns the `health` shorthand into explicit probes and produces the
//! canonical container list every later stage works on.

use k8s_openapi::api::core::v1::Container;

use crate::error::{Result, TransformError};
use crate::spec::ContainerDescriptor;

/// Build the canonical container list.
///
/// `health` is copied into both `livenessProbe` and `readinessProbe`; setting
/// it next to either explicit probe is a conflict.
pub fn normalize(descriptors: &[ContainerDescriptor]) -> Result<Vec<Container>> {
    descriptors
        .iter()
        .enumerate()
        .map(|(index, descriptor)| {
            let mut container = descriptor.container.clone();
            if let Some(health) = &descriptor.health {
                if container.liveness_probe.is_some() || container.readiness_probe.is_some() {
                    return Err(TransformError::conflict(
                        format!("app.containers[{}]", index),
                        "cannot define field health and livenessProbe or readinessProbe together",
                    ));
                }
                container.liveness_probe = Some(health.clone());
                container.readiness_probe = Some(health.clone());
            }
            Ok(container)
        })
        .collect()
}
