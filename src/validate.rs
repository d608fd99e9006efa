//! Validator leaves.
//!
//! A validator returns its input unchanged when it is valid and a
//! [`Sentinel`](crate::Sentinel) carrying a lowercase, unpunctuated, verb-led
//! fragment when it is not (for example `"must be positive"`). A
//! [`Description`](crate::Description) node later turns the fragment into a
//! full sentence.

mod number;
mod string;

pub use number::{NumberCheck, NumberValidator};
pub use string::{StringCheck, StringValidator};
