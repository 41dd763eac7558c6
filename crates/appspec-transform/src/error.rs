//! Error types for App spec transformation
//!
//! Every user-facing variant carries a `field` path in the App spec
//! (e.g. `app.containers[0].volumeMounts[1]`) so the message points at the
//! exact declaration that needs fixing.

use thiserror::Error;

use crate::quantity::QuantityError;

/// Result type alias using [`TransformError`]
pub type Result<T> = std::result::Result<T, TransformError>;

/// Errors that can occur while turning an App spec into Kubernetes objects
#[derive(Debug, Error)]
pub enum TransformError {
    /// Two mutually exclusive fields are both set
    #[error("conflicting specification at {field}: {message}")]
    Conflict {
        /// Location of the conflict in the App spec
        field: String,
        /// What conflicts with what
        message: String,
    },

    /// A name does not resolve to any declared root-level object
    #[error("missing reference at {field}: {message}")]
    MissingReference {
        /// Location of the dangling reference
        field: String,
        /// What could not be resolved
        message: String,
    },

    /// A value could not be parsed
    #[error("malformed value {value:?} at {field}: {message}")]
    Malformed {
        /// Location of the malformed value
        field: String,
        /// The offending input
        value: String,
        /// Why it was rejected
        message: String,
        /// Quantity parse failure, when that is the cause
        #[source]
        source: Option<QuantityError>,
    },

    /// The pipeline ran but produced nothing to apply
    #[error("no objects created, possibly because not enough input data was passed")]
    InsufficientInput,

    /// An object reached version stamping without a resolvable kind/version
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Stage that detected the defect
        context: String,
        /// Description of the defect
        message: String,
    },

    /// Any of the above, annotated with the app it happened in
    #[error("app {app:?}: {source}")]
    App {
        /// App name
        app: String,
        /// Underlying failure
        #[source]
        source: Box<TransformError>,
    },
}

impl TransformError {
    /// Create a conflicting-specification error
    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a missing-reference error
    pub fn missing_reference(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MissingReference {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-value error without an underlying cause
    pub fn malformed(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Malformed {
            field: field.into(),
            value: value.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a malformed-value error caused by a quantity parse failure
    pub fn malformed_quantity(field: impl Into<String>, source: QuantityError) -> Self {
        Self::Malformed {
            field: field.into(),
            value: source.input().to_string(),
            message: "could not read volume size".to_string(),
            source: Some(source),
        }
    }

    /// Create an internal error
    pub fn internal(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Attach the app name as context
    pub fn in_app(self, app: impl Into<String>) -> Self {
        Self::App {
            app: app.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with any app context stripped
    pub fn root(&self) -> &TransformError {
        match self {
            Self::App { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error reflects a bug rather than a user input problem
    pub fn is_internal(&self) -> bool {
        matches!(self.root(), Self::Internal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::parse_quantity;

    #[test]
    fn test_conflict_display() {
        let err = TransformError::conflict("app.containers[0]", "health and probes set");
        let display = err.to_string();
        assert!(display.contains("app.containers[0]"));
        assert!(display.contains("health and probes set"));
    }

    #[test]
    fn test_missing_reference_display() {
        let err = TransformError::missing_reference("app.containers[1].envFrom[0]", "no db");
        let display = err.to_string();
        assert!(display.contains("envFrom[0]"));
        assert!(display.contains("no db"));
    }

    #[test]
    fn test_malformed_quantity_keeps_source() {
        let cause = parse_quantity("lots").unwrap_err();
        let err = TransformError::malformed_quantity("app.volumeClaims[0].size", cause);

        assert!(err.to_string().contains("\"lots\""));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_app_context_wraps_and_unwraps() {
        let err = TransformError::conflict("app.podSpec", "two pods").in_app("web");

        assert!(err.to_string().starts_with("app \"web\""));
        assert!(matches!(err.root(), TransformError::Conflict { .. }));
        assert!(!err.is_internal());
    }

    #[test]
    fn test_internal_is_flagged() {
        let err = TransformError::internal("stamp", "unversioned").in_app("web");
        assert!(err.is_internal());
    }
}
