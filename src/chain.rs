//! Chain nodes and the pipeline that runs them.
//!
//! A [`Chain`] is an ordered list of [`Node`]s built with a [`ChainBuilder`].
//! Each node sees the previous node's [`Outcome`]: data goes to
//! [`Node::transform`], sentinels go to [`Node::on_sentinel`]. The defaults
//! are identity and pass-through, so an error raised early reaches the end of
//! the chain without being coerced by unrelated nodes.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use taskbox_core::{Chain, Outcome, StringValidator, TextTransformer};
//!
//! let chain = Chain::builder()
//!     .append(TextTransformer::trim())
//!     .append(StringValidator::length().up_to(5))
//!     .build();
//!
//! let out = chain.execute(json!("  abc  ")).unwrap();
//! assert_eq!(out, Outcome::Value(json!("abc")));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::{ContractError, Outcome, Sentinel};
use serde_json::Value;

/// A single unit of computation in a chain.
///
/// Implementors override [`transform`](Self::transform) for data and, rarely,
/// [`on_sentinel`](Self::on_sentinel) for failures. A node fed a value it
/// cannot handle structurally returns a [`ContractError`] rather than a
/// sentinel.
pub trait Node: fmt::Debug + Send + Sync {
    /// A short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Handles non-sentinel input. Defaults to identity.
    ///
    /// # Errors
    ///
    /// Returns `ContractError` if the value has the wrong shape for this node.
    fn transform(&self, value: Value) -> Result<Outcome, ContractError> {
        Ok(Outcome::Value(value))
    }

    /// Handles sentinel input. Defaults to passing it through unchanged.
    ///
    /// # Errors
    ///
    /// The default never fails.
    fn on_sentinel(&self, sentinel: Sentinel) -> Result<Outcome, ContractError> {
        Ok(Outcome::Sentinel(sentinel))
    }

    /// Routes an outcome to the matching handler.
    ///
    /// # Errors
    ///
    /// Propagates the handler's `ContractError`.
    fn step(&self, input: Outcome) -> Result<Outcome, ContractError> {
        match input {
            Outcome::Value(value) => self.transform(value),
            Outcome::Sentinel(sentinel) => self.on_sentinel(sentinel),
        }
    }
}

/// Collects nodes in order and produces an immutable [`Chain`].
#[derive(Debug, Default)]
pub struct ChainBuilder {
    nodes: Vec<Box<dyn Node>>,
}

impl ChainBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `node` as the new tail.
    pub fn append(mut self, node: impl Node + 'static) -> Self {
        self.nodes.push(Box::new(node));
        self
    }

    /// Finishes the chain. No nodes can be added afterwards.
    pub fn build(self) -> Chain {
        Chain {
            nodes: self.nodes.into(),
        }
    }
}

/// A finished pipeline of nodes.
///
/// Chains are immutable after [`ChainBuilder::build`] and cheap to clone, so
/// one chain can serve any number of concurrent executions.
#[derive(Debug, Clone)]
pub struct Chain {
    nodes: Arc<[Box<dyn Node>]>,
}

impl Chain {
    /// Starts building a chain.
    pub fn builder() -> ChainBuilder {
        ChainBuilder::new()
    }

    /// A chain with no nodes: identity for data, pass-through for sentinels.
    pub fn identity() -> Self {
        ChainBuilder::new().build()
    }

    /// Number of nodes in the chain.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the chain has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Runs `input` through every node in append order.
    ///
    /// # Errors
    ///
    /// Returns the first `ContractError` raised by a node; the remaining nodes
    /// do not run.
    pub fn execute(&self, input: impl Into<Outcome>) -> Result<Outcome, ContractError> {
        self.nodes.iter().try_fold(input.into(), |current, node| {
            tracing::trace!(node = node.name(), sentinel = current.is_sentinel(), "chain step");
            node.step(current)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Append(&'static str);

    impl Node for Append {
        fn name(&self) -> &'static str {
            "Append"
        }

        fn transform(&self, value: Value) -> Result<Outcome, ContractError> {
            match value {
                Value::String(text) => Ok(Outcome::Value(Value::String(text + self.0))),
                other => Err(ContractError::type_mismatch("Append", "a string", &other)),
            }
        }
    }

    #[derive(Debug)]
    struct FailOn(&'static str);

    impl Node for FailOn {
        fn name(&self) -> &'static str {
            "FailOn"
        }

        fn transform(&self, value: Value) -> Result<Outcome, ContractError> {
            if value == json!(self.0) {
                Ok(Outcome::fail("matched"))
            } else {
                Ok(Outcome::Value(value))
            }
        }
    }

    #[derive(Debug)]
    struct Recover;

    impl Node for Recover {
        fn name(&self) -> &'static str {
            "Recover"
        }

        fn on_sentinel(&self, sentinel: Sentinel) -> Result<Outcome, ContractError> {
            Ok(Outcome::Value(json!(format!("recovered: {}", sentinel))))
        }
    }

    #[test]
    fn empty_chain_is_identity() {
        let chain = Chain::identity();

        assert!(chain.is_empty());
        assert_eq!(chain.execute(json!({"a": 1})).unwrap(), Outcome::Value(json!({"a": 1})));
    }

    #[test]
    fn nodes_run_in_append_order() {
        let chain = Chain::builder()
            .append(Append("a"))
            .append(Append("b"))
            .append(Append("c"))
            .build();

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.execute(json!("")).unwrap(), Outcome::Value(json!("abc")));
    }

    #[test]
    fn sentinel_passes_through_downstream_nodes() {
        let chain = Chain::builder()
            .append(FailOn("x"))
            .append(Append("never"))
            .build();

        assert_eq!(chain.execute(json!("x")).unwrap(), Outcome::fail("matched"));
    }

    #[test]
    fn sentinel_handler_can_consume_failure() {
        let chain = Chain::builder()
            .append(FailOn("x"))
            .append(Recover)
            .build();

        assert_eq!(
            chain.execute(json!("x")).unwrap(),
            Outcome::Value(json!("recovered: matched"))
        );
    }

    #[test]
    fn contract_violation_stops_the_chain() {
        let chain = Chain::builder().append(Append("a")).append(Recover).build();

        let result = chain.execute(json!(5));

        assert_eq!(
            result,
            Err(ContractError::TypeMismatch {
                node: "Append",
                expected: "a string",
                found: "number",
            })
        );
    }

    #[test]
    fn cloned_chain_shares_nodes() {
        let chain = Chain::builder().append(Append("!")).build();
        let copy = chain.clone();

        assert_eq!(copy.execute(json!("hi")).unwrap(), chain.execute(json!("hi")).unwrap());
    }
}
