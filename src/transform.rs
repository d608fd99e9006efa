//! Transformer leaves.
//!
//! Transformers map values to values. They never produce sentinels of their
//! own and pass incoming sentinels through untouched, except for
//! [`Description`], whose whole job is to render them.

mod coerce;
mod description;
mod literal;
mod password;
mod text;

pub(crate) use coerce::truncate_to_i64;
pub use coerce::{Coercion, TypeTransformer};
pub use description::{Description, DescriptionOp};
pub use literal::{LiteralOp, LiteralTransformer};
pub use password::{
    Argon2Hasher, HashError, PasswordHasher, PasswordOp, PasswordTransformer, Plaintext,
};
pub use text::{TextOp, TextTransformer};
