use crate::{
    Chain, Description, Entity, LiteralTransformer, Matrix, Multiplexer, NumberCheck,
    NumberValidator, Schemes, StringValidator, TextOp, TextTransformer, TypeTransformer,
};

use super::HTML;

/// Field limits for tasks.
#[derive(Debug, Clone, Copy)]
pub struct TaskLimits;

impl TaskLimits {
    /// Longest title, in characters.
    pub const TITLE_MAX: usize = 140;
    /// Longest description, in characters.
    pub const DESCRIPTION_MAX: usize = 4000;
    /// Longest single tag, in characters.
    pub const TAG_MAX: usize = 32;
}

fn plain_text(label: &str, length: StringValidator) -> Chain {
    Chain::builder()
        .append(TextTransformer::strip_tags().with(TextOp::Trim))
        .append(length)
        .append(Description::new(label))
        .build()
}

fn identifier(label: &str) -> Chain {
    Chain::builder()
        .append(NumberValidator::whole().with(NumberCheck::Positive))
        .append(TypeTransformer::integer())
        .append(Description::new(label))
        .build()
}

/// A task owned by a user.
///
/// | property      | normalized form                          |
/// |---------------|------------------------------------------|
/// | `id`          | positive integer                         |
/// | `user_id`     | positive integer                         |
/// | `title`       | tag-free trimmed text, 1-140 characters  |
/// | `description` | tag-free trimmed text, up to 4000        |
/// | `done`        | `"t"` or `"f"`                           |
/// | `tags`        | array literal text of trimmed tags       |
/// | `meta`        | key-value text                           |
#[derive(Debug)]
pub struct Task;

impl Entity for Task {
    const NAME: &'static str = "Task";

    fn normalization_matrix() -> Matrix {
        let each_tag = Chain::builder()
            .append(TextTransformer::trim())
            .append(StringValidator::length().from(1).up_to(TaskLimits::TAG_MAX))
            .build();

        Matrix::from([
            ("id", identifier("Task")),
            ("user_id", identifier("User")),
            (
                "title",
                plain_text(
                    "Title",
                    StringValidator::length().from(1).up_to(TaskLimits::TITLE_MAX),
                ),
            ),
            (
                "description",
                plain_text(
                    "Description",
                    StringValidator::length().up_to(TaskLimits::DESCRIPTION_MAX),
                ),
            ),
            (
                "done",
                Chain::builder().append(TypeTransformer::boolean()).build(),
            ),
            (
                "tags",
                Chain::builder()
                    .append(Multiplexer::new(each_tag))
                    .append(LiteralTransformer::array_to_literal())
                    .append(Description::new("Tags"))
                    .build(),
            ),
            (
                "meta",
                Chain::builder()
                    .append(LiteralTransformer::map_to_key_value())
                    .build(),
            ),
        ])
    }

    fn sanitization_schemes() -> Schemes {
        let escape = || {
            Chain::builder()
                .append(TextTransformer::escape_html())
                .build()
        };

        Schemes::from([(
            HTML,
            Matrix::from([
                ("title", escape()),
                ("description", escape()),
                (
                    "tags",
                    Chain::builder()
                        .append(LiteralTransformer::literal_to_array())
                        .append(Multiplexer::new(escape()))
                        .build(),
                ),
                (
                    "meta",
                    Chain::builder()
                        .append(LiteralTransformer::key_value_to_map())
                        .build(),
                ),
            ]),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Model;
    use serde_json::json;

    #[test]
    fn task_normalizes_to_store_encoding() {
        let mut task = Model::<Task>::from_value(json!({
            "user_id": "7",
            "title": "  <i>Buy</i> noodles ",
            "description": "for #dinner",
            "done": "on",
            "tags": [" dinner", "food "],
        }))
        .unwrap();

        assert_eq!(task.normalize().unwrap(), None);
        assert_eq!(task.get("user_id"), Some(&json!(7)));
        assert_eq!(task.get_str("title"), Some("Buy noodles"));
        assert_eq!(task.get_str("done"), Some("t"));
        assert_eq!(task.get_str("tags"), Some(r#"{"dinner", "food"}"#));
    }

    #[test]
    fn task_errors_are_sentences() {
        let mut task = Model::<Task>::from_value(json!({
            "user_id": 0,
            "title": "<b></b>",
            "tags": ["ok", "   "],
        }))
        .unwrap();

        let errors = task.normalize().unwrap().unwrap();

        assert_eq!(errors["user_id"], "User must be positive.");
        assert_eq!(errors["title"], "Title must be between 1 and 140 characters long.");
        assert_eq!(errors["tags"], "Tags must be between 1 and 32 characters long.");
    }

    #[test]
    fn renormalizing_after_a_failure_keeps_encoded_values() {
        let mut task = Model::<Task>::from_value(json!({
            "title": "",
            "tags": ["a"],
            "meta": {"k": "v"},
        }))
        .unwrap();

        let first = task.normalize().unwrap();
        let after_first = task.clone();
        let second = task.normalize().unwrap();

        assert_eq!(
            first.as_ref().map(|errors| errors["title"].as_str()),
            Some("Title must be between 1 and 140 characters long.")
        );
        assert_eq!(first, second);
        assert_eq!(task, after_first);
        assert_eq!(task.get_str("tags"), Some(r#"{"a"}"#));
        assert_eq!(task.get_str("meta"), Some(r#""k"=>"v""#));
    }

    #[test]
    fn fractional_ids_are_rejected() {
        let mut task = Model::<Task>::from_value(json!({
            "id": 0.9,
            "user_id": "0.5",
            "title": "x",
        }))
        .unwrap();

        let errors = task.normalize().unwrap().expect("ids are not whole");

        assert_eq!(errors["id"], "Task must be a whole number.");
        assert_eq!(errors["user_id"], "User must be a whole number.");
        assert_eq!(task.get("user_id"), Some(&json!("0.5")));
    }

    #[test]
    fn oversized_ids_are_rejected() {
        let mut task = Model::<Task>::from_value(json!({
            "id": u64::MAX,
            "user_id": "1e30",
        }))
        .unwrap();

        let errors = task.normalize().unwrap().expect("ids do not fit");

        assert_eq!(errors["id"], "Task is out of range.");
        assert_eq!(errors["user_id"], "User is out of range.");
    }

    #[test]
    fn long_description_names_only_the_limit() {
        let mut task = Model::<Task>::from_value(json!({
            "description": "x".repeat(TaskLimits::DESCRIPTION_MAX + 1),
        }))
        .unwrap();

        let errors = task.normalize().unwrap().unwrap();

        assert_eq!(
            errors["description"],
            "Description must be at most 4000 characters long."
        );
    }

    #[test]
    fn meta_is_stored_as_key_value_text() {
        let mut task = Model::<Task>::from_value(json!({
            "title": "Call",
            "meta": {"due": "friday", "owner": null},
        }))
        .unwrap();
        task.normalize().unwrap();

        assert_eq!(
            task.get_str("meta"),
            Some(r#""due"=>"friday", "owner"=>NULL"#)
        );
        let shown = task.sanitized_copy(HTML).unwrap();
        assert_eq!(shown.get("meta"), Some(&json!({"due": "friday", "owner": null})));
    }

    #[test]
    fn html_scheme_decodes_tags_and_escapes_text() {
        let mut task = Model::<Task>::from_value(json!({
            "title": "Fish & chips",
            "tags": ["a<b"],
        }))
        .unwrap();
        task.normalize().unwrap();

        let shown = task.sanitized_copy(HTML).unwrap();

        assert_eq!(shown.get_str("title"), Some("Fish &amp; chips"));
        assert_eq!(shown.get("tags"), Some(&json!(["a&lt;b"])));
        assert_eq!(task.get_str("tags"), Some(r#"{"a<b"}"#));
    }
}
