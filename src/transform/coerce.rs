use serde_json::Value;

use crate::options::{Dispatch, Handler, OptionSet};
use crate::{ContractError, Node, Outcome};

/// 2^63, the first float above `i64::MAX`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Truncates `n` toward zero, or returns `None` if the result does not fit.
pub(crate) fn truncate_to_i64(n: f64) -> Option<i64> {
    (n.is_finite() && (-I64_LIMIT..I64_LIMIT).contains(&n)).then(|| n as i64)
}

/// Target types offered by [`TypeTransformer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Scalar to text
    String,
    /// Truthiness to the store's `"t"` / `"f"` text
    Boolean,
    /// To a 64-bit integer, truncating fractions; out-of-range input is a
    /// contract violation
    Integer,
    /// To a finite float
    Float,
}

/// Coerces scalar values to a canonical type.
///
/// Coercion is lenient the way form input needs it to be: text that does not
/// parse as a number becomes zero. Validate first if that matters.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taskbox_core::{Node, Outcome, TypeTransformer};
///
/// let to_bool = TypeTransformer::boolean();
/// assert_eq!(to_bool.transform(json!("on")).unwrap(), Outcome::Value(json!("t")));
/// assert_eq!(to_bool.transform(json!(0)).unwrap(), Outcome::Value(json!("f")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeTransformer {
    options: OptionSet<Coercion>,
}

impl TypeTransformer {
    fn coercing(target: Coercion) -> Self {
        let mut transformer = Self::default();
        transformer.options.set_option(target);
        transformer
    }

    /// Coerce to text.
    pub fn string() -> Self {
        Self::coercing(Coercion::String)
    }

    /// Coerce to `"t"` / `"f"`.
    pub fn boolean() -> Self {
        Self::coercing(Coercion::Boolean)
    }

    /// Coerce to an integer.
    pub fn integer() -> Self {
        Self::coercing(Coercion::Integer)
    }

    /// Coerce to a float.
    pub fn float() -> Self {
        Self::coercing(Coercion::Float)
    }

    fn scalar_only(value: &Value) -> Result<(), ContractError> {
        match value {
            Value::Array(_) | Value::Object(_) => {
                Err(ContractError::type_mismatch(Self::NAME, "a scalar", value))
            }
            _ => Ok(()),
        }
    }

    fn parse_float(text: &str) -> f64 {
        text.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .unwrap_or(0.0)
    }

    fn to_text(&self, value: Value) -> Result<Outcome, ContractError> {
        Self::scalar_only(&value)?;
        let text = match value {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(Outcome::Value(Value::String(text)))
    }

    fn to_flag(&self, value: Value) -> Result<Outcome, ContractError> {
        let truthy = match &value {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
            Value::String(text) => !matches!(
                text.trim().to_ascii_lowercase().as_str(),
                "" | "0" | "f" | "false" | "off" | "no"
            ),
            Value::Array(items) => !items.is_empty(),
            Value::Object(entries) => !entries.is_empty(),
        };
        Ok(Outcome::Value(Value::from(if truthy { "t" } else { "f" })))
    }

    fn to_integer(&self, value: Value) -> Result<Outcome, ContractError> {
        Self::scalar_only(&value)?;
        let integer = match &value {
            Value::Bool(flag) => Some(i64::from(*flag)),
            Value::Number(number) => match number.as_i64() {
                Some(exact) => Some(exact),
                None => number.as_f64().and_then(truncate_to_i64),
            },
            Value::String(text) => match text.trim().parse::<i64>() {
                Ok(exact) => Some(exact),
                Err(_) => truncate_to_i64(Self::parse_float(text)),
            },
            _ => Some(0),
        };
        match integer {
            Some(integer) => Ok(Outcome::Value(Value::from(integer))),
            None => Err(ContractError::OutOfRange {
                node: Self::NAME,
                value: value.to_string(),
            }),
        }
    }

    fn to_float(&self, value: Value) -> Result<Outcome, ContractError> {
        Self::scalar_only(&value)?;
        let float = match &value {
            Value::Bool(flag) => f64::from(u8::from(*flag)),
            Value::Number(number) => number.as_f64().unwrap_or(0.0),
            Value::String(text) => Self::parse_float(text),
            _ => 0.0,
        };
        Ok(Outcome::Value(Value::from(float)))
    }
}

impl Dispatch for TypeTransformer {
    type Op = Coercion;
    const NAME: &'static str = "TypeTransformer";

    fn options(&self) -> &OptionSet<Coercion> {
        &self.options
    }

    fn handler(op: Coercion) -> Handler<Self> {
        match op {
            Coercion::String => Self::to_text,
            Coercion::Boolean => Self::to_flag,
            Coercion::Integer => Self::to_integer,
            Coercion::Float => Self::to_float,
        }
    }
}

impl Node for TypeTransformer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn transform(&self, value: Value) -> Result<Outcome, ContractError> {
        self.apply(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(transformer: &TypeTransformer, input: Value) -> Value {
        transformer
            .transform(input)
            .unwrap()
            .into_result()
            .expect("coercion does not fail")
    }

    #[test]
    fn string_coercion() {
        let to_text = TypeTransformer::string();

        assert_eq!(run(&to_text, json!(42)), json!("42"));
        assert_eq!(run(&to_text, json!(true)), json!("true"));
        assert_eq!(run(&to_text, json!(null)), json!(""));
        assert_eq!(run(&to_text, json!("same")), json!("same"));
    }

    #[test]
    fn boolean_coercion_uses_store_letters() {
        let to_flag = TypeTransformer::boolean();

        for truthy in [json!(true), json!(1), json!("yes"), json!("t"), json!([0])] {
            assert_eq!(run(&to_flag, truthy), json!("t"));
        }
        for falsy in [json!(false), json!(0), json!(""), json!("False"), json!(null), json!("off")] {
            assert_eq!(run(&to_flag, falsy), json!("f"));
        }
    }

    #[test]
    fn integer_coercion() {
        let to_int = TypeTransformer::integer();

        assert_eq!(run(&to_int, json!(" 17 ")), json!(17));
        assert_eq!(run(&to_int, json!("3.9")), json!(3));
        assert_eq!(run(&to_int, json!(-2.5)), json!(-2));
        assert_eq!(run(&to_int, json!(true)), json!(1));
        assert_eq!(run(&to_int, json!("abc")), json!(0));
    }

    #[test]
    fn integer_coercion_refuses_to_clamp() {
        let to_int = TypeTransformer::integer();

        for input in [json!("1e30"), json!(u64::MAX), json!(-1e19)] {
            assert!(matches!(
                to_int.transform(input),
                Err(ContractError::OutOfRange { node: "TypeTransformer", .. })
            ));
        }
        assert_eq!(run(&to_int, json!(i64::MAX)), json!(i64::MAX));
    }

    #[test]
    fn float_coercion() {
        let to_float = TypeTransformer::float();

        assert_eq!(run(&to_float, json!("2.5")), json!(2.5));
        assert_eq!(run(&to_float, json!(4)), json!(4.0));
        assert_eq!(run(&to_float, json!("NaN")), json!(0.0));
    }

    #[test]
    fn composite_input_is_contract_error() {
        assert!(TypeTransformer::integer().transform(json!({"a": 1})).is_err());
        assert!(TypeTransformer::string().transform(json!([1])).is_err());
    }
}
