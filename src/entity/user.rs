use crate::{
    Chain, Description, Entity, Matrix, PasswordTransformer, Schemes, StringCheck,
    StringValidator, TextTransformer,
};

use super::HTML;

/// Field limits for accounts.
#[derive(Debug, Clone, Copy)]
pub struct UserLimits;

impl UserLimits {
    /// Longest display name, in characters.
    pub const NAME_MAX: usize = 64;
    /// Longest email address, in characters.
    pub const EMAIL_MAX: usize = 255;
    /// Shortest accepted password.
    pub const PASSWORD_MIN: usize = 8;
    /// Longest accepted password.
    pub const PASSWORD_MAX: usize = 128;
}

fn email_chain() -> Chain {
    Chain::builder()
        .append(TextTransformer::trim())
        .append(
            StringValidator::length()
                .up_to(UserLimits::EMAIL_MAX)
                .with(StringCheck::Email),
        )
        .append(Description::new("Email"))
        .build()
}

fn escape_chain() -> Chain {
    Chain::builder()
        .append(TextTransformer::escape_html())
        .build()
}

/// A registered account, as submitted at sign-up.
///
/// Normalization trims `name` and `email`, checks their shape, and replaces
/// `password` with an Argon2id hash.
#[derive(Debug)]
pub struct User;

impl Entity for User {
    const NAME: &'static str = "User";

    fn normalization_matrix() -> Matrix {
        Matrix::from([
            (
                "name",
                Chain::builder()
                    .append(TextTransformer::trim())
                    .append(StringValidator::length().from(1).up_to(UserLimits::NAME_MAX))
                    .append(Description::new("Name"))
                    .build(),
            ),
            ("email", email_chain()),
            (
                "password",
                Chain::builder()
                    .append(
                        StringValidator::length()
                            .from(UserLimits::PASSWORD_MIN)
                            .up_to(UserLimits::PASSWORD_MAX),
                    )
                    .append(PasswordTransformer::default())
                    .append(Description::new("Password"))
                    .build(),
            ),
        ])
    }

    fn sanitization_schemes() -> Schemes {
        Schemes::from([(
            HTML,
            Matrix::from([("name", escape_chain()), ("email", escape_chain())]),
        )])
    }
}

/// Sign-in input. The password is checked, never hashed.
#[derive(Debug)]
pub struct Credentials;

impl Entity for Credentials {
    const NAME: &'static str = "Credentials";

    fn normalization_matrix() -> Matrix {
        Matrix::from([
            ("email", email_chain()),
            (
                "password",
                Chain::builder()
                    .append(StringValidator::length().from(1).up_to(UserLimits::PASSWORD_MAX))
                    .append(Description::new("Password"))
                    .build(),
            ),
        ])
    }
}
