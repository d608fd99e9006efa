//! One-way password hashing behind a pluggable backend.

use std::fmt;
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde_json::Value;
use thiserror::Error;

use crate::options::{Dispatch, Handler, OptionSet};
use crate::{ContractError, Node, Outcome};

/// A plaintext password.
///
/// Debug and Display output is always `[REDACTED]`; the text is reachable only
/// through [`expose`](Self::expose).
///
/// ```
/// use taskbox_core::Plaintext;
///
/// let password = Plaintext::new("hunter2hunter2");
/// assert_eq!(format!("{:?}", password), "[REDACTED]");
/// assert_eq!(password.expose(), "hunter2hunter2");
/// ```
// Do NOT derive Debug or Clone: both would leak or duplicate the password.
pub struct Plaintext {
    inner: String,
}

impl Plaintext {
    /// Wraps a plaintext password.
    pub fn new(text: impl Into<String>) -> Self {
        Self { inner: text.into() }
    }

    /// Returns the plaintext. Do not log the result.
    pub fn expose(&self) -> &str {
        &self.inner
    }
}

impl fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Failure inside a hashing backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HashError(pub String);

/// A one-way password hashing algorithm.
///
/// Only two capabilities are required: hash a plaintext, and check a
/// plaintext against a stored hash.
pub trait PasswordHasher: fmt::Debug + Send + Sync {
    /// Hashes `plaintext` into a self-describing string.
    ///
    /// # Errors
    ///
    /// Returns `HashError` if the backend fails.
    fn hash(&self, plaintext: &Plaintext) -> Result<String, HashError>;

    /// Returns `true` if `plaintext` matches `hash`.
    ///
    /// # Errors
    ///
    /// Returns `HashError` if `hash` is not a hash this backend understands.
    fn verify(&self, plaintext: &Plaintext, hash: &str) -> Result<bool, HashError>;
}

/// Argon2id hashing producing PHC strings (`$argon2id$v=19$...`).
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Uses custom cost parameters.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn engine(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &Plaintext) -> Result<String, HashError> {
        use argon2::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        self.engine()
            .hash_password(plaintext.expose().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError(e.to_string()))
    }

    fn verify(&self, plaintext: &Plaintext, hash: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| HashError(e.to_string()))?;
        match self.engine().verify_password(plaintext.expose().as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError(e.to_string())),
        }
    }
}

/// Operations offered by [`PasswordTransformer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordOp {
    /// Replace the plaintext with its hash
    Hash,
}

/// Replaces a plaintext password value with its hash.
#[derive(Debug, Clone)]
pub struct PasswordTransformer {
    options: OptionSet<PasswordOp>,
    hasher: Arc<dyn PasswordHasher>,
}

impl PasswordTransformer {
    /// Hashes with the given backend.
    pub fn new(hasher: Arc<dyn PasswordHasher>) -> Self {
        let mut options = OptionSet::new();
        options.set_option(PasswordOp::Hash);
        Self { options, hasher }
    }

    fn hash(&self, value: Value) -> Result<Outcome, ContractError> {
        let plaintext = match value {
            Value::String(text) => Plaintext::new(text),
            other => return Err(ContractError::type_mismatch(Self::NAME, "a string", &other)),
        };
        let hashed = self
            .hasher
            .hash(&plaintext)
            .map_err(|e| ContractError::Hashing(e.0))?;
        Ok(Outcome::Value(Value::String(hashed)))
    }
}

impl Default for PasswordTransformer {
    fn default() -> Self {
        Self::new(Arc::new(Argon2Hasher::default()))
    }
}

impl Dispatch for PasswordTransformer {
    type Op = PasswordOp;
    const NAME: &'static str = "PasswordTransformer";

    fn options(&self) -> &OptionSet<PasswordOp> {
        &self.options
    }

    fn handler(op: PasswordOp) -> Handler<Self> {
        match op {
            PasswordOp::Hash => Self::hash,
        }
    }
}

impl Node for PasswordTransformer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn transform(&self, value: Value) -> Result<Outcome, ContractError> {
        self.apply(value)
    }
}
