//! Entity models and their normalization lifecycle.
//!
//! A [`Model`] holds the raw property map of one entity and drives it through
//! three states:
//!
//! ```text
//! Unnormalized --normalize()--> Normalized --sanitized_copy(scheme)--> Sanitized (a new copy)
//!      ^                             |
//!      +------- any mutation --------+
//! ```
//!
//! The chains come from the entity type's [`Entity`] declarations, compiled
//! once per process and shared by every model of that type.

mod registry;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;

use serde_json::{Map, Value};

use crate::{Chain, ContractError, Outcome};

/// Property name to normalization chain.
pub type Matrix = HashMap<&'static str, Chain>;

/// Scheme name to the property chains that sanitize for it.
pub type Schemes = HashMap<&'static str, Matrix>;

/// Property name to a human-readable error sentence.
pub type ErrorMap = BTreeMap<String, String>;

/// Type-level declaration of how an entity is normalized and sanitized.
///
/// Both functions must be pure and independent of any instance: their output
/// is computed once per process and reused for every model of the type.
pub trait Entity: 'static {
    /// Name used in diagnostics.
    const NAME: &'static str;

    /// Chains that validate and canonicalize each property.
    fn normalization_matrix() -> Matrix;

    /// Chains that make normalized properties safe for an output context.
    fn sanitization_schemes() -> Schemes {
        Schemes::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Unnormalized,
    Normalized,
    Sanitized(String),
}

/// The property map of one entity, plus where it is in its lifecycle.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taskbox_core::{Chain, Description, Entity, Matrix, Model, StringValidator, TextTransformer};
///
/// struct Tag;
///
/// impl Entity for Tag {
///     const NAME: &'static str = "Tag";
///
///     fn normalization_matrix() -> Matrix {
///         Matrix::from([(
///             "label",
///             Chain::builder()
///                 .append(TextTransformer::trim())
///                 .append(StringValidator::length().from(1).up_to(12))
///                 .append(Description::new("Label"))
///                 .build(),
///         )])
///     }
/// }
///
/// let mut tag = Model::<Tag>::new();
/// tag.set("label", "  errands ");
/// assert_eq!(tag.normalize().unwrap(), None);
/// assert_eq!(tag.get("label"), Some(&json!("errands")));
/// ```
pub struct Model<E: Entity> {
    properties: Map<String, Value>,
    state: State,
    // Properties whose chain already succeeded; their values are canonical
    // and must not be fed through the chain a second time.
    settled: BTreeSet<String>,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Model<E> {
    /// Creates an empty, unnormalized model.
    pub fn new() -> Self {
        Self::from_map(Map::new())
    }

    /// Creates an unnormalized model from raw properties.
    pub fn from_map(properties: Map<String, Value>) -> Self {
        Self {
            properties,
            state: State::Unnormalized,
            settled: BTreeSet::new(),
            entity: PhantomData,
        }
    }

    /// Rebuilds a model from properties that were normalized before they were
    /// stored.
    pub(crate) fn restore(properties: Map<String, Value>) -> Self {
        Self {
            settled: properties.keys().cloned().collect(),
            properties,
            state: State::Normalized,
            entity: PhantomData,
        }
    }

    /// Creates an unnormalized model from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `ContractError::TypeMismatch` if `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self, ContractError> {
        match value {
            Value::Object(properties) => Ok(Self::from_map(properties)),
            other => Err(ContractError::type_mismatch(E::NAME, "an object", &other)),
        }
    }

    /// Sets one property and returns the model to the unnormalized state.
    ///
    /// The new value is treated as raw input by the next
    /// [`normalize`](Self::normalize).
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        self.settled.remove(&key);
        self.properties.insert(key, value.into());
        self.state = State::Unnormalized;
    }

    /// Removes one property and returns the model to the unnormalized state.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.settled.remove(key);
        self.state = State::Unnormalized;
        self.properties.remove(key)
    }

    /// Returns a property.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Returns a property as text.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns all properties in insertion order.
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Consumes the model, returning its properties.
    pub fn into_properties(self) -> Map<String, Value> {
        self.properties
    }

    /// Returns `true` once [`normalize`](Self::normalize) has succeeded and no
    /// mutation has happened since.
    pub fn is_normalized(&self) -> bool {
        !matches!(self.state, State::Unnormalized)
    }

    /// Returns `true` for copies produced by [`sanitized_copy`](Self::sanitized_copy).
    pub fn is_sanitized(&self) -> bool {
        matches!(self.state, State::Sanitized(_))
    }

    /// The scheme this copy was sanitized for, if any.
    pub fn sanitized_scheme(&self) -> Option<&str> {
        match &self.state {
            State::Sanitized(scheme) => Some(scheme),
            _ => None,
        }
    }

    /// Validates and canonicalizes every present property in place.
    ///
    /// Properties without a chain, and chains for absent properties, are
    /// skipped. Properties that pass are overwritten with their transformed
    /// value even when siblings fail, and are not run again by a later call
    /// unless they are [`set`](Self::set) in between. Calling this twice in a
    /// row therefore yields the same properties and result as calling it once.
    ///
    /// Returns `Ok(None)` on success, or `Ok(Some(errors))` with one sentence
    /// per failing property; the model stays unnormalized in that case.
    ///
    /// # Errors
    ///
    /// Returns `ContractError` if a chain hits a contract violation. The model
    /// may be partially rewritten when that happens.
    pub fn normalize(&mut self) -> Result<Option<ErrorMap>, ContractError> {
        if self.is_normalized() {
            return Ok(None);
        }

        let tables = registry::tables::<E>();
        let mut errors = ErrorMap::new();

        for (property, chain) in &tables.matrix {
            if self.settled.contains(*property) {
                continue;
            }
            let Some(raw) = self.properties.get(*property) else {
                continue;
            };
            match chain.execute(raw.clone())? {
                Outcome::Value(value) => {
                    self.properties.insert((*property).to_string(), value);
                    self.settled.insert((*property).to_string());
                }
                Outcome::Sentinel(sentinel) => {
                    errors.insert((*property).to_string(), sentinel.message());
                }
            }
        }

        tracing::debug!(entity = E::NAME, invalid = errors.len(), "normalized model");

        if errors.is_empty() {
            self.state = State::Normalized;
            Ok(None)
        } else {
            Ok(Some(errors))
        }
    }

    /// Returns a copy whose properties have been run through `scheme`.
    ///
    /// The source model is not modified. Properties are cloned by value, so
    /// the copy shares nothing with the source.
    ///
    /// # Errors
    ///
    /// Returns `ContractError::NotNormalized` if this model is not normalized,
    /// `ContractError::AlreadySanitized` if it is itself a sanitized copy,
    /// `ContractError::UnknownScheme` if `E` declares no such scheme, and
    /// `ContractError::Sanitization` if a scheme chain yields a sentinel.
    pub fn sanitized_copy(&self, scheme: &str) -> Result<Self, ContractError> {
        match &self.state {
            State::Normalized => {}
            State::Unnormalized => return Err(ContractError::NotNormalized { entity: E::NAME }),
            State::Sanitized(done) => {
                return Err(ContractError::AlreadySanitized {
                    entity: E::NAME,
                    scheme: done.clone(),
                })
            }
        }

        let tables = registry::tables::<E>();
        let chains = tables
            .schemes
            .get(scheme)
            .ok_or_else(|| ContractError::UnknownScheme(scheme.to_string()))?;

        let mut copy = self.clone();
        for (property, chain) in chains {
            let Some(slot) = copy.properties.get_mut(*property) else {
                continue;
            };
            match chain.execute(std::mem::take(slot))? {
                Outcome::Value(value) => *slot = value,
                Outcome::Sentinel(sentinel) => {
                    return Err(ContractError::Sanitization {
                        property: (*property).to_string(),
                        message: sentinel.message(),
                    })
                }
            }
        }
        copy.state = State::Sanitized(scheme.to_string());
        Ok(copy)
    }
}

impl<E: Entity> Default for Model<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Clone for Model<E> {
    fn clone(&self) -> Self {
        Self {
            properties: self.properties.clone(),
            state: self.state.clone(),
            settled: self.settled.clone(),
            entity: PhantomData,
        }
    }
}

impl<E: Entity> PartialEq for Model<E> {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties
            && self.state == other.state
            && self.settled == other.settled
    }
}

impl<E: Entity> fmt::Debug for Model<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("entity", &E::NAME)
            .field("state", &self.state)
            .field("properties", &self.properties)
            .field("settled", &self.settled)
            .finish()
    }
}
