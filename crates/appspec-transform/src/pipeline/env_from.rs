//! Env-from expansion
//!
//! Generated manifests never carry `envFrom`. Each referenced config map or
//! secret is expanded into one `valueFrom` env var per key instead, so the
//! variables a container receives are visible in its own spec.

use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::{
    ConfigMapKeySelector, Container, EnvVar, EnvVarSource, SecretKeySelector,
};

use crate::error::{Result, TransformError};
use crate::spec::{App, ContainerDescriptor};

/// Expand env-from references into explicit env vars.
///
/// `containers` is the canonical list, aligned by position with
/// `descriptors`. Derived vars keep reference order and come before the
/// container's explicit env entries; keys within one config map or secret
/// are sorted. Names are not deduplicated against explicit entries. A
/// reference naming neither a config map nor a secret is an error.
pub fn expand(
    containers: Vec<Container>,
    descriptors: &[ContainerDescriptor],
    app: &App,
) -> Result<Vec<Container>> {
    containers
        .into_iter()
        .enumerate()
        .map(|(index, mut container)| {
            let references = descriptors
                .get(index)
                .map(|d| d.env_from.as_slice())
                .unwrap_or_default();

            let mut env = Vec::new();
            for (ref_index, reference) in references.iter().enumerate() {
                let field = format!("app.containers[{}].envFrom[{}]", index, ref_index);
                if reference.config_map_ref.is_none() && reference.secret_ref.is_none() {
                    return Err(TransformError::missing_reference(
                        field,
                        "reference names neither a configMap nor a secret",
                    ));
                }
                if let Some(cm_ref) = &reference.config_map_ref {
                    env.extend(config_map_env(app, &cm_ref.name, &field)?);
                }
                if let Some(secret_ref) = &reference.secret_ref {
                    env.extend(secret_env(app, &secret_ref.name, &field)?);
                }
            }

            if !env.is_empty() {
                env.extend(container.env.take().unwrap_or_default());
                container.env = Some(env);
            }
            container.env_from = None;
            Ok(container)
        })
        .collect()
}

fn config_map_env(app: &App, name: &str, field: &str) -> Result<Vec<EnvVar>> {
    let config_map = app.config_map(name).ok_or_else(|| {
        TransformError::missing_reference(
            format!("{}.configMapRef", field),
            format!("unable to get configMap {:?}: not defined", name),
        )
    })?;

    Ok(config_map
        .data
        .keys()
        .map(|key| EnvVar {
            name: key.clone(),
            value_from: Some(EnvVarSource {
                config_map_key_ref: Some(ConfigMapKeySelector {
                    name: name.to_string(),
                    key: key.clone(),
                    optional: None,
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect())
}

fn secret_env(app: &App, name: &str, field: &str) -> Result<Vec<EnvVar>> {
    let secret = app.secret(name).ok_or_else(|| {
        TransformError::missing_reference(
            format!("{}.secretRef", field),
            format!("unable to get secret {:?}: not defined", name),
        )
    })?;

    let keys: BTreeSet<&String> = secret.data.keys().chain(secret.string_data.keys()).collect();

    Ok(keys
        .into_iter()
        .map(|key| EnvVar {
            name: key.clone(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: name.to_string(),
                    key: key.clone(),
                    optional: None,
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ConfigMapDescriptor, EnvFromReference, SecretDescriptor};

    fn literal(name: &str, value: &str) -> EnvVar {
        EnvVar {
            name: name.to_string(),
            value: Some(value.to_string()),
            ..Default::default()
        }
    }

    fn names(container: &Container) -> Vec<&str> {
        container
            .env
            .iter()
            .flatten()
            .map(|e| e.name.as_str())
            .collect()
    }

    fn app_with(descriptors: Vec<ContainerDescriptor>) -> App {
        let mut app = App::new("web");
        app.containers = descriptors;
        app.config_maps.push(
            ConfigMapDescriptor::new("settings")
                .with_data("PORT", "8080")
                .with_data("HOST", "0.0.0.0"),
        );
        app.secrets.push(
            SecretDescriptor::new("creds")
                .with_data("TOKEN", b"abc".to_vec())
                .with_string_data("PASSWORD", "hunter2")
                .with_string_data("TOKEN", "dup"),
        );
        app
    }

    fn run(app: &App) -> Result<Vec<Container>> {
        let containers = app.containers.iter().map(|d| d.container.clone()).collect();
        expand(containers, &app.containers, app)
    }

    #[test]
    fn config_map_keys_become_sorted_env_vars() {
        let app = app_with(vec![ContainerDescriptor::new("api", "api:1")
            .with_env_from(EnvFromReference::config_map("settings"))]);

        let containers = run(&app).unwrap();

        assert_eq!(names(&containers[0]), vec!["HOST", "PORT"]);
        let selector = containers[0].env.as_ref().unwrap()[0]
            .value_from
            .as_ref()
            .and_then(|v| v.config_map_key_ref.as_ref())
            .unwrap();
        assert_eq!(selector.name, "settings");
        assert_eq!(selector.key, "HOST");
    }

    #[test]
    fn secret_keys_are_deduplicated_across_data_and_string_data() {
        let app = app_with(vec![ContainerDescriptor::new("api", "api:1")
            .with_env_from(EnvFromReference::secret("creds"))]);

        let containers = run(&app).unwrap();

        assert_eq!(names(&containers[0]), vec!["PASSWORD", "TOKEN"]);
        assert!(containers[0].env.as_ref().unwrap().iter().all(|e| e
            .value_from
            .as_ref()
            .and_then(|v| v.secret_key_ref.as_ref())
            .is_some_and(|s| s.name == "creds")));
    }

    #[test]
    fn derived_vars_precede_explicit_ones_in_reference_order() {
        let mut descriptor = ContainerDescriptor::new("api", "api:1")
            .with_env_from(EnvFromReference::secret("creds"))
            .with_env_from(EnvFromReference::config_map("settings"));
        descriptor.container.env = Some(vec![literal("PORT", "9090")]);
        let app = app_with(vec![descriptor]);

        let containers = run(&app).unwrap();

        assert_eq!(
            names(&containers[0]),
            vec!["PASSWORD", "TOKEN", "HOST", "PORT", "PORT"]
        );
        assert_eq!(
            containers[0].env.as_ref().unwrap().last(),
            Some(&literal("PORT", "9090"))
        );
    }

    #[test]
    fn reference_with_both_refs_expands_config_map_first() {
        let reference = EnvFromReference {
            config_map_ref: EnvFromReference::config_map("settings").config_map_ref,
            secret_ref: EnvFromReference::secret("creds").secret_ref,
        };
        let app = app_with(vec![
            ContainerDescriptor::new("api", "api:1").with_env_from(reference)
        ]);

        let containers = run(&app).unwrap();

        assert_eq!(
            names(&containers[0]),
            vec!["HOST", "PORT", "PASSWORD", "TOKEN"]
        );
    }

    #[test]
    fn missing_config_map_is_reported_with_location() {
        let app = app_with(vec![
            ContainerDescriptor::new("api", "api:1"),
            ContainerDescriptor::new("worker", "worker:1")
                .with_env_from(EnvFromReference::config_map("nope")),
        ]);

        let err = run(&app).unwrap_err();

        match err {
            TransformError::MissingReference { field, message } => {
                assert_eq!(field, "app.containers[1].envFrom[0].configMapRef");
                assert!(message.contains("\"nope\""));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_secret_is_reported() {
        let app = app_with(vec![ContainerDescriptor::new("api", "api:1")
            .with_env_from(EnvFromReference::secret("nope"))]);

        assert!(matches!(
            run(&app),
            Err(TransformError::MissingReference { .. })
        ));
    }

    #[test]
    fn empty_reference_is_reported_with_location() {
        let app = app_with(vec![ContainerDescriptor::new("api", "api:1")
            .with_env_from(EnvFromReference::config_map("settings"))
            .with_env_from(EnvFromReference::default())]);

        let err = run(&app).unwrap_err();

        match err {
            TransformError::MissingReference { field, .. } => {
                assert_eq!(field, "app.containers[0].envFrom[1]");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn env_from_is_cleared_everywhere() {
        let mut plain = ContainerDescriptor::new("api", "api:1");
        plain.container.env_from = Some(vec![Default::default()]);
        plain.container.env = Some(vec![literal("A", "1")]);
        let app = app_with(vec![plain]);

        let containers = run(&app).unwrap();

        assert!(containers[0].env_from.is_none());
        assert_eq!(containers[0].env, Some(vec![literal("A", "1")]));
    }
}
