#![forbid(unsafe_code)]

use std::fmt;

use bundles_core::BundleError;

/// Errors from encoding or decoding a bundle.
#[derive(Debug)]
pub enum SerializeError {
    /// Property resolution or value validation failed.
    Bundle(BundleError),
    /// A value could not be converted to or from JSON.
    Json(serde_json::Error),
    /// A simple-property record carries no `valueType`.
    MissingValueType { property: String },
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundle(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::MissingValueType { property } => {
                write!(f, "entry for simple property '{property}' has no valueType")
            }
        }
    }
}

impl std::error::Error for SerializeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bundle(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::MissingValueType { .. } => None,
        }
    }
}

impl From<BundleError> for SerializeError {
    fn from(err: BundleError) -> Self {
        Self::Bundle(err)
    }
}

impl From<serde_json::Error> for SerializeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn wraps_bundle_errors_with_source() {
        let err = SerializeError::from(BundleError::UnknownType {
            tag: "my::Thing".into(),
        });
        assert_eq!(err.to_string(), "unknown type tag: my::Thing");
        assert!(err.source().is_some());
    }

    #[test]
    fn missing_value_type_names_property() {
        let err = SerializeError::MissingValueType {
            property: "title".into(),
        };
        assert!(err.to_string().contains("'title'"));
        assert!(err.source().is_none());
    }
}
