//! Volume claim compilation and pod volume binding
//!
//! Root-level volume claims become PVCs. A container mount whose name matches
//! a claim, and no explicit pod volume, gets a pod volume bound to that claim
//! so the pod spec is complete without the user writing the volume twice.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container, PersistentVolumeClaim, PersistentVolumeClaimVolumeSource, Volume,
    VolumeResourceRequirements,
};
use tracing::debug;

use super::object_meta;
use crate::config::TransformConfig;
use crate::error::{Result, TransformError};
use crate::quantity::parse_quantity;
use crate::spec::{App, VolumeClaimDescriptor};

/// Resource name PVC sizes are requested under
pub const STORAGE_RESOURCE: &str = "storage";

/// Build a PVC for every root-level volume claim
pub fn compile_claims(
    app: &App,
    labels: &BTreeMap<String, String>,
    config: &TransformConfig,
) -> Result<Vec<PersistentVolumeClaim>> {
    app.volume_claims
        .iter()
        .enumerate()
        .map(|(index, claim)| compile_claim(claim, index, labels, config))
        .collect()
}

fn compile_claim(
    claim: &VolumeClaimDescriptor,
    index: usize,
    labels: &BTreeMap<String, String>,
    config: &TransformConfig,
) -> Result<PersistentVolumeClaim> {
    let field = format!("app.volumeClaims[{}]", index);
    let size = claim.size.as_deref().filter(|s| !s.is_empty());
    let has_requests = claim
        .spec
        .resources
        .as_ref()
        .is_some_and(|r| r.requests.is_some());

    let mut spec = claim.spec.clone();
    match (size, has_requests) {
        (Some(_), true) => {
            return Err(TransformError::conflict(
                field,
                format!(
                    "volume claim {:?} cannot provide size and resources at the same time",
                    claim.name
                ),
            ))
        }
        (None, false) => {
            return Err(TransformError::conflict(
                field,
                format!(
                    "volume claim {:?} must provide size or resources, none given",
                    claim.name
                ),
            ))
        }
        (Some(size), false) => {
            let quantity = parse_quantity(size)
                .map_err(|e| TransformError::malformed_quantity(format!("{}.size", field), e))?;
            let resources = spec
                .resources
                .get_or_insert_with(VolumeResourceRequirements::default);
            resources.requests = Some(BTreeMap::from([(
                STORAGE_RESOURCE.to_string(),
                quantity,
            )]));
        }
        (None, true) => {}
    }

    if spec.access_modes.as_ref().is_none_or(Vec::is_empty) {
        spec.access_modes = Some(config.default_access_modes.clone());
    }

    Ok(PersistentVolumeClaim {
        metadata: object_meta(&claim.name, labels),
        spec: Some(spec),
        ..Default::default()
    })
}

/// Pod volumes for claim-backed mounts.
///
/// Returns only the volumes to add; a mount is satisfied by an explicit pod
/// volume (from `podSpec.volumes` or `volumes`), by a root-level claim, or by
/// a volume already bound for an earlier mount of the same name.
pub fn bind(containers: &[Container], app: &App) -> Result<Vec<Volume>> {
    let explicit: Vec<&str> = app
        .pod_spec
        .iter()
        .flat_map(|p| p.volumes.iter().flatten())
        .chain(app.volumes.iter())
        .map(|v| v.name.as_str())
        .collect();

    let mut bound: Vec<Volume> = Vec::new();
    for (container_index, container) in containers.iter().enumerate() {
        for (mount_index, mount) in container.volume_mounts.iter().flatten().enumerate() {
            let name = mount.name.as_str();
            if explicit.contains(&name) || bound.iter().any(|v| v.name == name) {
                continue;
            }
            if !app.has_volume_claim(name) {
                return Err(TransformError::missing_reference(
                    format!(
                        "app.containers[{}].volumeMounts[{}]",
                        container_index, mount_index
                    ),
                    format!(
                        "neither a root-level volume claim nor a pod-level volume is defined for mount {:?} in container {}, mount {}",
                        name, container_index, mount_index
                    ),
                ));
            }
            debug!(volume = %name, container = %container.name, "binding mount to volume claim");
            bound.push(Volume {
                name: name.to_string(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: name.to_string(),
                    read_only: None,
                }),
                ..Default::default()
            });
        }
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ContainerDescriptor;
    use k8s_openapi::api::core::v1::{EmptyDirVolumeSource, PodSpec};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

    fn labels() -> BTreeMap<String, String> {
        BTreeMap::from([("app".to_string(), "web".to_string())])
    }

    fn claims(app: &App) -> Result<Vec<PersistentVolumeClaim>> {
        compile_claims(app, &labels(), &TransformConfig::default())
    }

    fn containers(app: &App) -> Vec<Container> {
        app.containers.iter().map(|d| d.container.clone()).collect()
    }

    fn empty_dir(name: &str) -> Volume {
        Volume {
            name: name.to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        }
    }

    // =========================================================================
    // Claims
    // =========================================================================

    #[test]
    fn size_becomes_storage_request_with_default_access_mode() {
        let mut app = App::new("web");
        app.volume_claims
            .push(VolumeClaimDescriptor::with_size("data", "1Gi"));

        let pvcs = claims(&app).unwrap();

        assert_eq!(pvcs.len(), 1);
        assert_eq!(pvcs[0].metadata.name.as_deref(), Some("data"));
        assert_eq!(pvcs[0].metadata.labels, Some(labels()));
        let spec = pvcs[0].spec.as_ref().unwrap();
        assert_eq!(
            spec.resources.as_ref().unwrap().requests,
            Some(BTreeMap::from([(
                "storage".to_string(),
                Quantity("1Gi".to_string())
            )]))
        );
        assert_eq!(spec.access_modes, Some(vec!["ReadWriteOnce".to_string()]));
    }

    #[test]
    fn explicit_resources_and_access_modes_pass_through() {
        let mut claim = VolumeClaimDescriptor {
            name: "logs".to_string(),
            ..Default::default()
        };
        let requests = BTreeMap::from([("storage".to_string(), Quantity("5Gi".to_string()))]);
        claim.spec.resources = Some(VolumeResourceRequirements {
            requests: Some(requests.clone()),
            limits: None,
        });
        claim.spec.access_modes = Some(vec!["ReadWriteMany".to_string()]);
        let mut app = App::new("web");
        app.volume_claims.push(claim);

        let pvcs = claims(&app).unwrap();

        let spec = pvcs[0].spec.as_ref().unwrap();
        assert_eq!(spec.resources.as_ref().unwrap().requests, Some(requests));
        assert_eq!(spec.access_modes, Some(vec!["ReadWriteMany".to_string()]));
    }

    #[test]
    fn size_and_resources_conflict() {
        let mut claim = VolumeClaimDescriptor::with_size("data", "1Gi");
        claim.spec.resources = Some(VolumeResourceRequirements {
            requests: Some(BTreeMap::new()),
            limits: None,
        });
        let mut app = App::new("web");
        app.volume_claims.push(claim);

        let err = claims(&app).unwrap_err();

        assert!(matches!(err, TransformError::Conflict { ref field, .. } if field == "app.volumeClaims[0]"));
        assert!(err.to_string().contains("at the same time"));
    }

    #[test]
    fn neither_size_nor_resources_is_rejected() {
        let mut app = App::new("web");
        app.volume_claims.push(VolumeClaimDescriptor {
            name: "data".to_string(),
            size: Some(String::new()),
            ..Default::default()
        });

        let err = claims(&app).unwrap_err();

        assert!(err.to_string().contains("none given"));
    }

    #[test]
    fn malformed_size_is_rejected() {
        let mut app = App::new("web");
        app.volume_claims
            .push(VolumeClaimDescriptor::with_size("data", "1 GB"));

        let err = claims(&app).unwrap_err();

        match err {
            TransformError::Malformed { field, value, .. } => {
                assert_eq!(field, "app.volumeClaims[0].size");
                assert_eq!(value, "1 GB");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // =========================================================================
    // Binding
    // =========================================================================

    #[test]
    fn claim_backed_mount_gets_a_pod_volume_once() {
        let mut app = App::new("web");
        app.containers = vec![
            ContainerDescriptor::new("api", "api:1").with_mount("data", "/data"),
            ContainerDescriptor::new("backup", "backup:1").with_mount("data", "/backup"),
        ];
        app.volume_claims
            .push(VolumeClaimDescriptor::with_size("data", "1Gi"));

        let volumes = bind(&containers(&app), &app).unwrap();

        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].name, "data");
        assert_eq!(
            volumes[0].persistent_volume_claim.as_ref().unwrap().claim_name,
            "data"
        );
    }

    #[test]
    fn explicit_pod_volumes_are_left_alone() {
        let mut app = App::new("web");
        app.containers = vec![ContainerDescriptor::new("api", "api:1")
            .with_mount("cache", "/cache")
            .with_mount("tmp", "/tmp")];
        app.volumes.push(empty_dir("cache"));
        app.pod_spec = Some(PodSpec {
            volumes: Some(vec![empty_dir("tmp")]),
            ..Default::default()
        });

        assert!(bind(&containers(&app), &app).unwrap().is_empty());
    }

    #[test]
    fn explicit_volume_wins_over_claim_with_same_name() {
        let mut app = App::new("web");
        app.containers =
            vec![ContainerDescriptor::new("api", "api:1").with_mount("data", "/data")];
        app.volumes.push(empty_dir("data"));
        app.volume_claims
            .push(VolumeClaimDescriptor::with_size("data", "1Gi"));

        assert!(bind(&containers(&app), &app).unwrap().is_empty());
    }

    #[test]
    fn unresolved_mount_names_container_and_mount_index() {
        let mut app = App::new("web");
        app.containers = vec![
            ContainerDescriptor::new("api", "api:1"),
            ContainerDescriptor::new("worker", "worker:1")
                .with_mount("cache", "/cache")
                .with_mount("data", "/data"),
        ];
        app.volumes.push(empty_dir("cache"));

        let err = bind(&containers(&app), &app).unwrap_err();

        match err {
            TransformError::MissingReference { field, message } => {
                assert_eq!(field, "app.containers[1].volumeMounts[1]");
                assert!(message.contains("\"data\""));
                assert!(message.contains("container 1, mount 1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
