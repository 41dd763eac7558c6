//! App-wide label resolution

use std::collections::BTreeMap;

use crate::spec::App;

/// Label key used when the App declares no labels
pub const APP_LABEL: &str = "app";

/// App labels, or `{"app": <name>}` when none are declared
pub fn resolve(app: &App) -> BTreeMap<String, String> {
    app.labels
        .clone()
        .unwrap_or_else(|| BTreeMap::from([(APP_LABEL.to_string(), app.name.clone())]))
}
