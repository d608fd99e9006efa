use serde_json::Value;

use crate::options::{Dispatch, Handler, OptionSet};
use crate::{ContractError, Node, Outcome, Sentinel};

/// Operations offered by [`Description`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionOp {
    /// Prefix a sentinel's fragment with the field label
    Describe,
}

/// Renders a validator fragment into a sentence about a named field.
///
/// Placed at the end of a property chain: a sentinel carrying
/// `"must be positive"` leaves as `"Priority must be positive."`. Values pass
/// through untouched.
///
/// ```
/// use taskbox_core::{Description, Node, Outcome};
///
/// let describe = Description::new("Priority");
/// assert_eq!(
///     describe.step(Outcome::fail("must be positive")).unwrap(),
///     Outcome::fail("Priority must be positive."),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Description {
    options: OptionSet<DescriptionOp>,
}

impl Description {
    /// Describes failures of the field labelled `field`.
    pub fn new(field: impl Into<String>) -> Self {
        let mut description = Self::default();
        description.options.set_option(DescriptionOp::Describe);
        description.options.set_option_value("field", field.into());
        description
    }

    /// The field label.
    pub fn field(&self) -> &str {
        self.options
            .option_value("field")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    fn describe(&self, fragment: Value) -> Result<Outcome, ContractError> {
        let field = self.required_value("field")?.as_str().unwrap_or_default();
        Ok(Outcome::fail(format!("{field} {}.", Sentinel::new(fragment).message())))
    }
}

impl Dispatch for Description {
    type Op = DescriptionOp;
    const NAME: &'static str = "Description";

    fn options(&self) -> &OptionSet<DescriptionOp> {
        &self.options
    }

    fn handler(op: DescriptionOp) -> Handler<Self> {
        match op {
            DescriptionOp::Describe => Self::describe,
        }
    }
}

impl Node for Description {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn on_sentinel(&self, sentinel: Sentinel) -> Result<Outcome, ContractError> {
        self.apply(sentinel.payload().clone())
    }
}
