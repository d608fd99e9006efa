use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::options::{Dispatch, Handler, OptionSet};
use crate::{ContractError, Node, Outcome};

// Deliberately loose: something, an @, something, a dot, something.
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

const FROM: &str = "from";
const UP_TO: &str = "up_to";

/// Checks offered by [`StringValidator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringCheck {
    /// Character count within the `from` / `up_to` bounds
    Length,
    /// Loose `local@domain.tld` shape
    Email,
}

/// Validates string values.
///
/// Length is counted in Unicode scalar values, not bytes.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taskbox_core::{Node, Outcome, StringValidator};
///
/// let validator = StringValidator::length().from(10);
///
/// assert_eq!(
///     validator.transform(json!("too short")).unwrap(),
///     Outcome::fail("must be at least 10 characters long"),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct StringValidator {
    options: OptionSet<StringCheck>,
}

impl StringValidator {
    /// Creates a validator with no check selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// A length check; set bounds with [`from`](Self::from) and
    /// [`up_to`](Self::up_to).
    pub fn length() -> Self {
        Self::new().with(StringCheck::Length)
    }

    /// An email shape check.
    pub fn email() -> Self {
        Self::new().with(StringCheck::Email)
    }

    /// Enables an additional check.
    pub fn with(mut self, check: StringCheck) -> Self {
        self.options.add_option(check);
        self
    }

    /// Sets the inclusive lower length bound.
    pub fn from(mut self, min: usize) -> Self {
        self.options.set_option_value(FROM, min);
        self
    }

    /// Sets the inclusive upper length bound.
    pub fn up_to(mut self, max: usize) -> Self {
        self.options.set_option_value(UP_TO, max);
        self
    }

    fn text(value: &Value) -> Result<&str, ContractError> {
        value
            .as_str()
            .ok_or_else(|| ContractError::type_mismatch(Self::NAME, "a string", value))
    }

    fn bound(&self, key: &str) -> Option<u64> {
        self.options.option_value(key).and_then(Value::as_u64)
    }

    fn check_length(&self, value: Value) -> Result<Outcome, ContractError> {
        let count = Self::text(&value)?.chars().count() as u64;

        let failure = match (self.bound(FROM), self.bound(UP_TO)) {
            (None, None) => {
                return Err(ContractError::MissingParameter {
                    node: Self::NAME,
                    key: FROM,
                })
            }
            (Some(min), None) if count < min => {
                Some(format!("must be at least {min} characters long"))
            }
            (None, Some(max)) if count > max => {
                Some(format!("must be at most {max} characters long"))
            }
            (Some(min), Some(max)) if count < min || count > max => {
                Some(format!("must be between {min} and {max} characters long"))
            }
            _ => None,
        };

        Ok(match failure {
            Some(message) => Outcome::fail(message),
            None => Outcome::Value(value),
        })
    }

    fn check_email(&self, value: Value) -> Result<Outcome, ContractError> {
        if EMAIL_SHAPE.is_match(Self::text(&value)?) {
            Ok(Outcome::Value(value))
        } else {
            Ok(Outcome::fail("is invalid"))
        }
    }
}

impl Dispatch for StringValidator {
    type Op = StringCheck;
    const NAME: &'static str = "StringValidator";

    fn options(&self) -> &OptionSet<StringCheck> {
        &self.options
    }

    fn handler(op: StringCheck) -> Handler<Self> {
        match op {
            StringCheck::Length => Self::check_length,
            StringCheck::Email => Self::check_email,
        }
    }
}

impl Node for StringValidator {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn transform(&self, value: Value) -> Result<Outcome, ContractError> {
        self.apply(value)
    }
}
