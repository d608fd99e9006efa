//! Element-wise application of a finished chain.

use serde_json::{Map, Value};

use crate::error::kind_of;
use crate::{Chain, ContractError, Node, Outcome};

/// Re-applies an inner chain to every element of an array or object.
///
/// The inner chain is owned and already built, so it cannot be extended from
/// outside. Elements are processed in order; the first sentinel becomes the
/// overall result and the remaining elements are left untouched. On success
/// the output has the same shape and keys as the input.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taskbox_core::{Chain, Multiplexer, Node, Outcome, TextTransformer};
///
/// let each = Multiplexer::new(Chain::builder().append(TextTransformer::trim()).build());
///
/// let out = each.step(json!([" a ", "b "]).into()).unwrap();
/// assert_eq!(out, Outcome::Value(json!(["a", "b"])));
/// ```
#[derive(Debug, Clone)]
pub struct Multiplexer {
    inner: Chain,
}

impl Multiplexer {
    /// Wraps a finished chain.
    pub fn new(inner: Chain) -> Self {
        Self { inner }
    }

    /// Runs the inner chain over each element of `input`.
    ///
    /// # Errors
    ///
    /// Returns `ContractError::NotASequence` if `input` is neither an array
    /// nor an object, or the first `ContractError` raised by the inner chain.
    pub fn execute(&self, input: Value) -> Result<Outcome, ContractError> {
        match input {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match self.inner.execute(item)? {
                        Outcome::Value(value) => out.push(value),
                        failed @ Outcome::Sentinel(_) => return Ok(failed),
                    }
                }
                Ok(Outcome::Value(Value::Array(out)))
            }
            Value::Object(entries) => {
                let mut out = Map::with_capacity(entries.len());
                for (key, item) in entries {
                    match self.inner.execute(item)? {
                        Outcome::Value(value) => {
                            out.insert(key, value);
                        }
                        failed @ Outcome::Sentinel(_) => return Ok(failed),
                    }
                }
                Ok(Outcome::Value(Value::Object(out)))
            }
            other => Err(ContractError::NotASequence {
                found: kind_of(&other),
            }),
        }
    }
}

impl Node for Multiplexer {
    fn name(&self) -> &'static str {
        "Multiplexer"
    }

    fn transform(&self, value: Value) -> Result<Outcome, ContractError> {
        self.execute(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StringValidator, TextTransformer};
    use serde_json::json;

    fn trim_then_cap(max: usize) -> Multiplexer {
        Multiplexer::new(
            Chain::builder()
                .append(TextTransformer::trim())
                .append(StringValidator::length().up_to(max))
                .build(),
        )
    }

    #[test]
    fn maps_every_array_element_in_order() {
        let out = trim_then_cap(5).execute(json!([" one", "two ", " three "])).unwrap();

        assert_eq!(out, Outcome::Value(json!(["one", "two", "three"])));
    }

    #[test]
    fn preserves_object_keys() {
        let out = trim_then_cap(5)
            .execute(json!({"b": " x ", "a": "y "}))
            .unwrap();

        let object = out.value().and_then(Value::as_object).cloned().unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(object["b"], json!("x"));
    }

    #[test]
    fn first_sentinel_is_the_result() {
        let out = trim_then_cap(3).execute(json!(["ok", "too long", "also too long"])).unwrap();

        assert_eq!(out, Outcome::fail("must be at most 3 characters long"));
    }

    #[test]
    fn later_elements_are_not_evaluated_after_failure() {
        // The third element would be a contract violation if it were reached.
        let out = trim_then_cap(3).execute(json!(["ok", "too long", 42])).unwrap();

        assert!(out.is_sentinel());
    }

    #[test]
    fn non_sequence_is_contract_error() {
        assert_eq!(
            trim_then_cap(3).execute(json!("scalar")),
            Err(ContractError::NotASequence { found: "string" })
        );
    }

    #[test]
    fn sentinel_input_passes_through_as_node() {
        let out = trim_then_cap(3).step(Outcome::fail("upstream")).unwrap();

        assert_eq!(out, Outcome::fail("upstream"));
    }

    #[test]
    fn empty_sequence_stays_empty() {
        assert_eq!(
            trim_then_cap(3).execute(json!([])).unwrap(),
            Outcome::Value(json!([]))
        );
    }
}
