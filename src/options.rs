//! Per-instance option selection and table-driven dispatch.
//!
//! Validator and transformer leaves expose a small set of behaviors as an
//! operation enum. An [`OptionSet`] records which operations are selected on a
//! given instance (and any named parameters), and [`Dispatch::apply`] runs the
//! selected operations through the leaf's static handler table.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::{ContractError, Outcome};

/// A handler for one operation of a leaf.
pub type Handler<T> = fn(&T, Value) -> Result<Outcome, ContractError>;

/// Selected operations and named parameters of one leaf instance.
///
/// # Examples
///
/// ```
/// use taskbox_core::OptionSet;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Op { Trim, Escape, Strip }
///
/// let mut options = OptionSet::new();
/// options.add_option(Op::Trim);
/// options.add_option(Op::Escape);
/// options.add_option(Op::Trim);
/// assert_eq!(options.selected(), &[Op::Trim, Op::Escape]);
///
/// options.set_option(Op::Strip);
/// assert_eq!(options.selected(), &[Op::Strip]);
/// ```
#[derive(Clone, PartialEq)]
pub struct OptionSet<Op> {
    selected: Vec<Op>,
    values: HashMap<&'static str, Value>,
}

impl<Op> Default for OptionSet<Op> {
    fn default() -> Self {
        Self {
            selected: Vec::new(),
            values: HashMap::new(),
        }
    }
}

impl<Op: Copy + PartialEq> OptionSet<Op> {
    /// Creates an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables `op` alongside any already-selected operations.
    ///
    /// Enabling an operation twice has no effect; operations run in the order
    /// they were first enabled.
    pub fn add_option(&mut self, op: Op) {
        if !self.selected.contains(&op) {
            self.selected.push(op);
        }
    }

    /// Selects `op` exclusively, replacing any prior selection.
    pub fn set_option(&mut self, op: Op) {
        self.selected.clear();
        self.selected.push(op);
    }

    /// Stores a named parameter. Selection is not affected.
    pub fn set_option_value(&mut self, key: &'static str, value: impl Into<Value>) {
        self.values.insert(key, value.into());
    }

    /// Returns a named parameter.
    pub fn option_value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the selected operations in run order.
    pub fn selected(&self) -> &[Op] {
        &self.selected
    }
}

impl<Op: fmt::Debug> fmt::Debug for OptionSet<Op> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.iter().collect();
        keys.sort_by_key(|(key, _)| **key);
        f.debug_struct("OptionSet")
            .field("selected", &self.selected)
            .field("values", &keys)
            .finish()
    }
}

/// Table-driven dispatch over a leaf's operation enum.
///
/// Implementors provide the option set and a static `op -> handler` table;
/// [`apply`](Self::apply) does the rest.
pub trait Dispatch: Sized {
    /// The operation enum of this leaf.
    type Op: Copy + PartialEq + fmt::Debug;

    /// Name used in diagnostics.
    const NAME: &'static str;

    /// The instance's selected operations and parameters.
    fn options(&self) -> &OptionSet<Self::Op>;

    /// Maps an operation to its handler.
    fn handler(op: Self::Op) -> Handler<Self>;

    /// Runs every selected operation in selection order.
    ///
    /// Stops at the first sentinel and returns it.
    ///
    /// # Errors
    ///
    /// Returns `ContractError::NoOptionSelected` if nothing is selected, or
    /// the first `ContractError` raised by a handler.
    fn apply(&self, value: Value) -> Result<Outcome, ContractError> {
        let selected = self.options().selected();
        if selected.is_empty() {
            return Err(ContractError::NoOptionSelected { node: Self::NAME });
        }

        let mut current = value;
        for op in selected {
            match Self::handler(*op)(self, current)? {
                Outcome::Value(next) => current = next,
                failed @ Outcome::Sentinel(_) => return Ok(failed),
            }
        }
        Ok(Outcome::Value(current))
    }

    /// Reads a parameter that a selected operation depends on.
    ///
    /// # Errors
    ///
    /// Returns `ContractError::MissingParameter` if the parameter is unset.
    fn required_value(&self, key: &'static str) -> Result<&Value, ContractError> {
        self.options()
            .option_value(key)
            .ok_or(ContractError::MissingParameter {
                node: Self::NAME,
                key,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Op {
        Double,
        Reject,
        AddBias,
    }

    #[derive(Debug, Default)]
    struct Arith {
        options: OptionSet<Op>,
    }

    impl Arith {
        fn number(value: &Value) -> Result<i64, ContractError> {
            value
                .as_i64()
                .ok_or_else(|| ContractError::type_mismatch("Arith", "an integer", value))
        }

        fn double(&self, value: Value) -> Result<Outcome, ContractError> {
            Ok(Outcome::Value(json!(Self::number(&value)? * 2)))
        }

        fn reject(&self, _value: Value) -> Result<Outcome, ContractError> {
            Ok(Outcome::fail("rejected"))
        }

        fn add_bias(&self, value: Value) -> Result<Outcome, ContractError> {
            let bias = Self::number(self.required_value("bias")?)?;
            Ok(Outcome::Value(json!(Self::number(&value)? + bias)))
        }
    }

    impl Dispatch for Arith {
        type Op = Op;
        const NAME: &'static str = "Arith";

        fn options(&self) -> &OptionSet<Op> {
            &self.options
        }

        fn handler(op: Op) -> Handler<Self> {
            match op {
                Op::Double => Self::double,
                Op::Reject => Self::reject,
                Op::AddBias => Self::add_bias,
            }
        }
    }

    #[test]
    fn apply_without_selection_is_contract_error() {
        let leaf = Arith::default();

        assert_eq!(
            leaf.apply(json!(1)),
            Err(ContractError::NoOptionSelected { node: "Arith" })
        );
    }

    #[test]
    fn selected_options_run_in_enable_order() {
        let mut leaf = Arith::default();
        leaf.options.set_option_value("bias", 1);
        leaf.options.add_option(Op::AddBias);
        leaf.options.add_option(Op::Double);

        // (3 + 1) * 2
        assert_eq!(leaf.apply(json!(3)).unwrap(), Outcome::Value(json!(8)));
    }

    #[test]
    fn apply_short_circuits_on_sentinel() {
        let mut leaf = Arith::default();
        leaf.options.add_option(Op::Reject);
        leaf.options.add_option(Op::Double);

        // Double would reject the string input if it ran.
        assert_eq!(leaf.apply(json!("x")).unwrap(), Outcome::fail("rejected"));
    }

    #[test]
    fn set_option_replaces_selection_but_keeps_values() {
        let mut options = OptionSet::new();
        options.set_option_value("bias", 4);
        options.add_option(Op::Double);
        options.add_option(Op::Reject);
        options.set_option(Op::AddBias);

        assert_eq!(options.selected(), &[Op::AddBias]);
        assert_eq!(options.option_value("bias"), Some(&json!(4)));
    }

    #[test]
    fn missing_parameter_is_contract_error() {
        let mut leaf = Arith::default();
        leaf.options.add_option(Op::AddBias);

        assert_eq!(
            leaf.apply(json!(1)),
            Err(ContractError::MissingParameter {
                node: "Arith",
                key: "bias",
            })
        );
    }
}
