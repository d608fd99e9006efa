//! Contract violations raised by pipelines and models.
//!
//! These are programmer or integration errors: a node fed a value of the wrong
//! shape, a leaf applied with nothing selected, a model sanitized before it was
//! normalized. They are never turned into field messages. Expected, per-field
//! data errors travel as [`Sentinel`](crate::Sentinel) values instead.

use thiserror::Error;

/// A broken contract between a caller and a pipeline component.
///
/// # Examples
///
/// ```
/// use taskbox_core::ContractError;
///
/// let error = ContractError::UnknownScheme("pdf".to_string());
/// assert_eq!(error.to_string(), "unknown sanitization scheme 'pdf'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// A node received a value it cannot structurally handle.
    #[error("{node} expects {expected}, got {found}")]
    TypeMismatch {
        /// The node that rejected the value
        node: &'static str,
        /// What the node accepts
        expected: &'static str,
        /// The JSON kind that was received
        found: &'static str,
    },

    /// A dispatching leaf was applied before any option was selected.
    #[error("{node} applied with no option selected")]
    NoOptionSelected {
        /// The leaf that was applied
        node: &'static str,
    },

    /// A selected option needs a parameter that was never set.
    #[error("{node} option requires parameter '{key}'")]
    MissingParameter {
        /// The leaf that was applied
        node: &'static str,
        /// The missing parameter key
        key: &'static str,
    },

    /// A multiplexer received something other than an array or object.
    #[error("multiplexer expects an array or object, got {found}")]
    NotASequence {
        /// The JSON kind that was received
        found: &'static str,
    },

    /// A sanitized copy was requested from a model that is not normalized.
    #[error("{entity} must be normalized before it can be sanitized")]
    NotNormalized {
        /// The entity type name
        entity: &'static str,
    },

    /// A sanitized copy was asked to sanitize itself again.
    #[error("{entity} is already sanitized for '{scheme}'")]
    AlreadySanitized {
        /// The entity type name
        entity: &'static str,
        /// The scheme the copy was sanitized for
        scheme: String,
    },

    /// A number cannot be represented by the target type.
    #[error("{node} cannot represent {value} as an integer")]
    OutOfRange {
        /// The node that rejected the value
        node: &'static str,
        /// The rejected value, as JSON
        value: String,
    },

    /// The requested sanitization scheme is not declared for the entity.
    #[error("unknown sanitization scheme '{0}'")]
    UnknownScheme(String),

    /// Array literal text produced by the store could not be parsed.
    #[error("malformed array literal at byte {position}")]
    MalformedLiteral {
        /// Byte offset where parsing stopped
        position: usize,
    },

    /// The password hashing backend failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// A sanitization chain produced a sentinel.
    ///
    /// Sanitizers run on already-normalized data, so a failure here is a bug
    /// in the scheme declaration rather than bad input.
    #[error("sanitizing '{property}' failed: {message}")]
    Sanitization {
        /// The property whose chain failed
        property: String,
        /// The sentinel message
        message: String,
    },
}

impl ContractError {
    /// Builds a [`ContractError::TypeMismatch`] for `value`.
    pub fn type_mismatch(
        node: &'static str,
        expected: &'static str,
        value: &serde_json::Value,
    ) -> Self {
        Self::TypeMismatch {
            node,
            expected,
            found: kind_of(value),
        }
    }
}

/// Returns the JSON kind name of a value, for diagnostics.
pub fn kind_of(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_mismatch_names_found_kind() {
        let error = ContractError::type_mismatch("TextTransformer", "a string", &json!([1]));

        assert_eq!(
            error,
            ContractError::TypeMismatch {
                node: "TextTransformer",
                expected: "a string",
                found: "array",
            }
        );
        assert_eq!(error.to_string(), "TextTransformer expects a string, got array");
    }

    #[test]
    fn kinds_display() {
        assert_eq!(kind_of(&json!(null)), "null");
        assert_eq!(kind_of(&json!(true)), "boolean");
        assert_eq!(kind_of(&json!(1.5)), "number");
        assert_eq!(kind_of(&json!("x")), "string");
        assert_eq!(kind_of(&json!({})), "object");
    }

    #[test]
    fn not_normalized_display() {
        let error = ContractError::NotNormalized { entity: "User" };
        assert_eq!(
            error.to_string(),
            "User must be normalized before it can be sanitized"
        );
    }
}
