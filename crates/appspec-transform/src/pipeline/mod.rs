//! Compilation pipeline stages
//!
//! Each stage borrows the App and returns fresh values; nothing here mutates
//! the input. [`crate::compiler`] fixes the order the stages run in.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

pub(crate) mod config_data;
pub(crate) mod deployment;
pub(crate) mod env_from;
pub(crate) mod health;
pub(crate) mod labels;
pub(crate) mod service;
pub(crate) mod volumes;

/// Metadata shared by every generated object: its name and the app labels
pub(crate) fn object_meta(name: &str, labels: &BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        labels: Some(labels.clone()),
        ..Default::default()
    }
}
