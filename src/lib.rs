//! Composable validation and normalization pipelines for a task tracker.
//!
//! Every piece of untrusted input that reaches the task server goes through
//! the same machinery:
//! - **Chains**: ordered [`Node`]s that validate or transform a value
//! - **Sentinels**: data errors that flow through a chain as values, never as
//!   panics or `Err`
//! - **Option dispatch**: leaves that expose selectable operations through a
//!   static handler table ([`Dispatch`])
//! - **Models**: entity property maps driven from raw to normalized to
//!   sanitized ([`Model`], [`Entity`])
//!
//! Contract violations (wrong value shape, misuse of the lifecycle) are a
//! separate class, reported as [`ContractError`].
//!
//! # Core Types
//!
//! - [`Sentinel`] / [`Outcome`]: the error channel and what flows between nodes
//! - [`Chain`] / [`ChainBuilder`]: finished pipelines and how to build them
//! - [`Multiplexer`]: a chain applied element-wise
//! - [`StringValidator`], [`NumberValidator`]: validator leaves
//! - [`TextTransformer`], [`TypeTransformer`], [`LiteralTransformer`],
//!   [`PasswordTransformer`], [`Description`]: transformer leaves
//! - [`Model`]: the entity lifecycle
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use taskbox_core::{Chain, Description, Outcome, StringValidator, TextTransformer};
//!
//! let name = Chain::builder()
//!     .append(TextTransformer::trim())
//!     .append(StringValidator::length().from(10))
//!     .append(Description::new("Name"))
//!     .build();
//!
//! assert_eq!(
//!     name.execute(json!("  too short ")).unwrap(),
//!     Outcome::fail("Name must be at least 10 characters long."),
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chain;
mod error;
mod model;
mod multiplexer;
mod options;
mod sentinel;
mod transform;
mod validate;

pub mod entity;
pub mod repository;
pub mod web;

pub use chain::{Chain, ChainBuilder, Node};
pub use error::ContractError;
pub use model::{Entity, ErrorMap, Matrix, Model, Schemes};
pub use multiplexer::Multiplexer;
pub use options::{Dispatch, Handler, OptionSet};
pub use sentinel::{Outcome, Sentinel};
pub use transform::{
    Argon2Hasher, Coercion, Description, DescriptionOp, HashError, LiteralOp, LiteralTransformer,
    PasswordHasher, PasswordOp, PasswordTransformer, Plaintext, TextOp, TextTransformer,
    TypeTransformer,
};
pub use validate::{NumberCheck, NumberValidator, StringCheck, StringValidator};
