use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::options::{Dispatch, Handler, OptionSet};
use crate::{ContractError, Node, Outcome};

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([\p{L}\p{N}_]+)").expect("hashtag pattern is valid"));

/// Operations offered by [`TextTransformer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    /// Strip leading and trailing whitespace
    Trim,
    /// Escape `& < > " '` as HTML entities
    EscapeHtml,
    /// Remove `<...>` markup
    StripTags,
    /// Extract distinct `#hashtags` into an array, first occurrence first
    Hashtags,
}

/// Text transformations on string values.
///
/// Operations run in the order they were enabled:
///
/// ```
/// use serde_json::json;
/// use taskbox_core::{Node, Outcome, TextOp, TextTransformer};
///
/// let clean = TextTransformer::new().with(TextOp::StripTags).with(TextOp::Trim);
///
/// assert_eq!(
///     clean.transform(json!(" <b>bold</b> ")).unwrap(),
///     Outcome::Value(json!("bold")),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextTransformer {
    options: OptionSet<TextOp>,
}

impl TextTransformer {
    /// Creates a transformer with no operation selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a trimming transformer.
    pub fn trim() -> Self {
        Self::new().with(TextOp::Trim)
    }

    /// Shorthand for an HTML-escaping transformer.
    pub fn escape_html() -> Self {
        Self::new().with(TextOp::EscapeHtml)
    }

    /// Shorthand for a tag-stripping transformer.
    pub fn strip_tags() -> Self {
        Self::new().with(TextOp::StripTags)
    }

    /// Shorthand for a hashtag extractor.
    pub fn hashtags() -> Self {
        Self::new().with(TextOp::Hashtags)
    }

    /// Enables an additional operation.
    pub fn with(mut self, op: TextOp) -> Self {
        self.options.add_option(op);
        self
    }

    fn text(value: Value) -> Result<String, ContractError> {
        match value {
            Value::String(text) => Ok(text),
            other => Err(ContractError::type_mismatch(Self::NAME, "a string", &other)),
        }
    }

    fn trim_text(&self, value: Value) -> Result<Outcome, ContractError> {
        let text = Self::text(value)?;
        Ok(Outcome::Value(Value::String(text.trim().to_string())))
    }

    fn escape(&self, value: Value) -> Result<Outcome, ContractError> {
        let text = Self::text(value)?;
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&#039;"),
                other => escaped.push(other),
            }
        }
        Ok(Outcome::Value(Value::String(escaped)))
    }

    fn strip(&self, value: Value) -> Result<Outcome, ContractError> {
        let text = Self::text(value)?;
        Ok(Outcome::Value(Value::String(
            TAG.replace_all(&text, "").into_owned(),
        )))
    }

    fn extract_hashtags(&self, value: Value) -> Result<Outcome, ContractError> {
        let text = Self::text(value)?;
        let mut seen = HashSet::new();
        let tags = HASHTAG
            .captures_iter(&text)
            .filter_map(|caps| caps.get(1))
            .map(|tag| tag.as_str())
            .filter(|tag| seen.insert(*tag))
            .map(|tag| Value::String(tag.to_string()))
            .collect();
        Ok(Outcome::Value(Value::Array(tags)))
    }
}

impl Dispatch for TextTransformer {
    type Op = TextOp;
    const NAME: &'static str = "TextTransformer";

    fn options(&self) -> &OptionSet<TextOp> {
        &self.options
    }

    fn handler(op: TextOp) -> Handler<Self> {
        match op {
            TextOp::Trim => Self::trim_text,
            TextOp::EscapeHtml => Self::escape,
            TextOp::StripTags => Self::strip,
            TextOp::Hashtags => Self::extract_hashtags,
        }
    }
}

impl Node for TextTransformer {
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

    fn run(transformer: &TextTransformer, input: Value) -> Value {
        transformer
            .transform(input)
            .unwrap()
            .into_result()
            .expect("transformers do not fail")
    }

    #[test]
    fn trim_strips_surrounding_whitespace() {
        assert_eq!(run(&TextTransformer::trim(), json!("   John Doe   ")), json!("John Doe"));
        assert_eq!(run(&TextTransformer::trim(), json!("\t\n")), json!(""));
    }

    #[test]
    fn escape_html_entities() {
        assert_eq!(
            run(&TextTransformer::escape_html(), json!(r#"<a href="x">Tom & 'Jerry'</a>"#)),
            json!("&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;")
        );
    }

    #[test]
    fn strip_tags_removes_markup_only() {
        assert_eq!(
            run(&TextTransformer::strip_tags(), json!("<p>Buy <em>milk</em></p>")),
            json!("Buy milk")
        );
        assert_eq!(run(&TextTransformer::strip_tags(), json!("1 < 2")), json!("1 < 2"));
    }

    #[test]
    fn hashtags_deduplicated_in_first_occurrence_order() {
        assert_eq!(
            run(&TextTransformer::hashtags(), json!("Buy #noodles, eat #noodles! #food")),
            json!(["noodles", "food"])
        );
    }

    #[test]
    fn hashtags_are_unicode_aware() {
        assert_eq!(
            run(&TextTransformer::hashtags(), json!("#café and #日本語 and #snake_case")),
            json!(["café", "日本語", "snake_case"])
        );
    }

    #[test]
    fn no_hashtags_yields_empty_array() {
        assert_eq!(run(&TextTransformer::hashtags(), json!("# nothing here")), json!([]));
    }

    #[test]
    fn operations_compose_in_enable_order() {
        let transformer = TextTransformer::trim().with(TextOp::EscapeHtml);

        assert_eq!(run(&transformer, json!("  <b>  ")), json!("&lt;b&gt;"));
    }

    #[test]
    fn sentinel_passes_through() {
        let out = TextTransformer::trim().step(Outcome::fail("is invalid")).unwrap();

        assert_eq!(out, Outcome::fail("is invalid"));
    }

    #[test]
    fn non_string_is_contract_error() {
        assert!(matches!(
            TextTransformer::trim().transform(json!(null)),
            Err(ContractError::TypeMismatch { found: "null", .. })
        ));
    }
}
