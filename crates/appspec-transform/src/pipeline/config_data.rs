//! ConfigMap and Secret materialization

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{ConfigMap, Secret};

use super::object_meta;
use crate::spec::App;

/// One ConfigMap per root-level config map declaration
pub fn compile_config_maps(app: &App, labels: &BTreeMap<String, String>) -> Vec<ConfigMap> {
    app.config_maps
        .iter()
        .map(|cm| ConfigMap {
            metadata: object_meta(&cm.name, labels),
            data: (!cm.data.is_empty()).then(|| cm.data.clone()),
            ..Default::default()
        })
        .collect()
}

/// One Secret per root-level secret declaration
pub fn compile_secrets(app: &App, labels: &BTreeMap<String, String>) -> Vec<Secret> {
    app.secrets
        .iter()
        .map(|s| Secret {
            metadata: object_meta(&s.name, labels),
            data: (!s.data.is_empty()).then(|| s.data.clone()),
            string_data: (!s.string_data.is_empty()).then(|| s.string_data.clone()),
            type_: s.type_.clone(),
            ..Default::default()
        })
        .collect()
}
