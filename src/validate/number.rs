use serde_json::Value;

use crate::options::{Dispatch, Handler, OptionSet};
use crate::transform::truncate_to_i64;
use crate::{ContractError, Node, Outcome};

/// Checks offered by [`NumberValidator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberCheck {
    /// Strictly greater than zero
    Positive,
    /// A whole number that fits a signed 64-bit integer
    Whole,
}

/// Validates numeric values.
///
/// Accepts JSON numbers and strings that parse as numbers, since form bodies
/// arrive as text. Anything else is a contract violation.
#[derive(Debug, Clone, Default)]
pub struct NumberValidator {
    options: OptionSet<NumberCheck>,
}

impl NumberValidator {
    /// A positivity check.
    pub fn positive() -> Self {
        Self::default().with(NumberCheck::Positive)
    }

    /// A whole-number check.
    pub fn whole() -> Self {
        Self::default().with(NumberCheck::Whole)
    }

    /// Adds a check, run after the ones already selected.
    pub fn with(mut self, check: NumberCheck) -> Self {
        self.options.add_option(check);
        self
    }

    fn numeric(value: &Value) -> Result<f64, ContractError> {
        let parsed = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => return Err(ContractError::type_mismatch(Self::NAME, "a number", value)),
        };
        // A non-numeric string is bad user input, not a wiring bug.
        Ok(parsed.unwrap_or(f64::NAN))
    }

    fn check_whole(&self, value: Value) -> Result<Outcome, ContractError> {
        let failure = match &value {
            Value::Number(number) if number.is_i64() => None,
            Value::Number(number) if number.is_u64() => Some("is out of range"),
            Value::String(text) if text.trim().parse::<i64>().is_ok() => None,
            _ => {
                let n = Self::numeric(&value)?;
                if !n.is_finite() || n.fract() != 0.0 {
                    Some("must be a whole number")
                } else if truncate_to_i64(n).is_none() {
                    Some("is out of range")
                } else {
                    None
                }
            }
        };

        Ok(match failure {
            Some(message) => Outcome::fail(message),
            None => Outcome::Value(value),
        })
    }

    fn check_positive(&self, value: Value) -> Result<Outcome, ContractError> {
        if Self::numeric(&value)? > 0.0 {
            Ok(Outcome::Value(value))
        } else {
            Ok(Outcome::fail("must be positive"))
        }
    }
}

impl Dispatch for NumberValidator {
    type Op = NumberCheck;
    const NAME: &'static str = "NumberValidator";

    fn options(&self) -> &OptionSet<NumberCheck> {
        &self.options
    }

    fn handler(op: NumberCheck) -> Handler<Self> {
        match op {
            NumberCheck::Positive => Self::check_positive,
            NumberCheck::Whole => Self::check_whole,
        }
    }
}

impl Node for NumberValidator {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn transform(&self, value: Value) -> Result<Outcome, ContractError> {
        self.apply(value)
    }
}
