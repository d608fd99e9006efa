use std::fmt;

use serde_json::Value;

/// An error-carrying value that travels through a chain in place of data.
///
/// A `Sentinel` is produced by a failing validator, or by a caller that wants
/// to force a failure. Its payload carries no semantics of its own; it is
/// usually a short message such as `"must be positive"`.
///
/// # Invariants
///
/// - Immutable once created
/// - Does NOT implement `Deref`, `From<Sentinel> for Value`, or any other
///   conversion that would let it pass for real data
///
/// # Examples
///
/// ```
/// use taskbox_core::Sentinel;
///
/// let sentinel = Sentinel::new("is invalid");
/// assert_eq!(sentinel.message(), "is invalid");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Sentinel {
    payload: Value,
}

impl Sentinel {
    /// Wraps a payload in a sentinel.
    pub fn new(payload: impl Into<Value>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Returns the payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Renders the payload as message text.
    ///
    /// String payloads are returned as-is; anything else is rendered as JSON.
    pub fn message(&self) -> String {
        match &self.payload {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// What flows between chain nodes: either data or a sentinel.
///
/// Validators return their input unchanged on success and a
/// [`Outcome::Sentinel`] on failure. Transformers map values and pass
/// sentinels through untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Real domain data
    Value(Value),
    /// A data error
    Sentinel(Sentinel),
}

impl Outcome {
    /// Shorthand for a sentinel outcome with the given payload.
    pub fn fail(payload: impl Into<Value>) -> Self {
        Self::Sentinel(Sentinel::new(payload))
    }

    /// Returns `true` if this outcome carries a sentinel.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Sentinel(_))
    }

    /// Returns the value, if this outcome is data.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Sentinel(_) => None,
        }
    }

    /// Returns the sentinel, if this outcome is a failure.
    pub fn sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Value(_) => None,
            Self::Sentinel(sentinel) => Some(sentinel),
        }
    }

    /// Converts into a `Result`, with the sentinel on the error side.
    pub fn into_result(self) -> Result<Value, Sentinel> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Sentinel(sentinel) => Err(sentinel),
        }
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Sentinel> for Outcome {
    fn from(sentinel: Sentinel) -> Self {
        Self::Sentinel(sentinel)
    }
}
