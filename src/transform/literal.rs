//! The two text encodings shared with the relational store.
//!
//! Array literals look like `{"a", "b", null, {"nested"}}`: braces, elements
//! separated by `", "`, every non-null scalar double-quoted with `\` and `"`
//! backslash-escaped, and a bare `null` for missing elements.
//!
//! Key-value text looks like `"k"=>"v", "other"=>NULL`: quoted keys, quoted
//! values, and a bare `NULL` for an absent value.

use serde_json::{Map, Value};

use crate::options::{Dispatch, Handler, OptionSet};
use crate::{ContractError, Node, Outcome};

/// Operations offered by [`LiteralTransformer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralOp {
    /// Array or object values to array literal text
    ArrayToLiteral,
    /// Array literal text to an array of strings (and nulls)
    LiteralToArray,
    /// Key-value text to an object
    KeyValueToMap,
    /// Object to key-value text
    MapToKeyValue,
}

/// Converts between JSON values and the store's text encodings.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taskbox_core::{LiteralTransformer, Node, Outcome};
///
/// let encode = LiteralTransformer::array_to_literal();
/// assert_eq!(
///     encode.transform(json!(["a", null, ["b\"c"]])).unwrap(),
///     Outcome::Value(json!(r#"{"a", null, {"b\"c"}}"#)),
/// );
///
/// let decode = LiteralTransformer::key_value_to_map();
/// assert_eq!(
///     decode.transform(json!(r#""due"=>"friday", "owner"=>NULL"#)).unwrap(),
///     Outcome::Value(json!({"due": "friday", "owner": null})),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct LiteralTransformer {
    options: OptionSet<LiteralOp>,
}

impl LiteralTransformer {
    fn selecting(op: LiteralOp) -> Self {
        let mut transformer = Self::default();
        transformer.options.set_option(op);
        transformer
    }

    /// Encode arrays as array literal text.
    pub fn array_to_literal() -> Self {
        Self::selecting(LiteralOp::ArrayToLiteral)
    }

    /// Decode array literal text.
    pub fn literal_to_array() -> Self {
        Self::selecting(LiteralOp::LiteralToArray)
    }

    /// Decode key-value text.
    pub fn key_value_to_map() -> Self {
        Self::selecting(LiteralOp::KeyValueToMap)
    }

    /// Encode objects as key-value text.
    pub fn map_to_key_value() -> Self {
        Self::selecting(LiteralOp::MapToKeyValue)
    }

    fn encode_array(&self, value: Value) -> Result<Outcome, ContractError> {
        if !matches!(value, Value::Array(_) | Value::Object(_)) {
            return Err(ContractError::type_mismatch(Self::NAME, "an array", &value));
        }
        let mut out = String::new();
        write_element(&value, &mut out);
        Ok(Outcome::Value(Value::String(out)))
    }

    fn decode_array(&self, value: Value) -> Result<Outcome, ContractError> {
        let text = match value {
            Value::String(text) => text,
            other => {
                return Err(ContractError::type_mismatch(
                    Self::NAME,
                    "array literal text",
                    &other,
                ))
            }
        };
        let mut cursor = Cursor::new(&text);
        cursor.skip_whitespace();
        let decoded = cursor.array()?;
        cursor.skip_whitespace();
        if !cursor.at_end() {
            return Err(ContractError::MalformedLiteral {
                position: cursor.position,
            });
        }
        Ok(Outcome::Value(decoded))
    }

    fn decode_key_value(&self, value: Value) -> Result<Outcome, ContractError> {
        match value {
            Value::String(text) => Ok(Outcome::Value(Value::Object(parse_key_value(&text)))),
            Value::Null => Ok(Outcome::Value(Value::Null)),
            other => Err(ContractError::type_mismatch(Self::NAME, "key-value text", &other)),
        }
    }

    fn encode_key_value(&self, value: Value) -> Result<Outcome, ContractError> {
        let entries = match value {
            Value::Object(entries) => entries,
            other => return Err(ContractError::type_mismatch(Self::NAME, "an object", &other)),
        };
        let mut pairs = Vec::with_capacity(entries.len());
        for (key, item) in &entries {
            let rendered = match item {
                Value::Null => "NULL".to_string(),
                Value::String(text) => quote(text),
                Value::Bool(_) | Value::Number(_) => quote(&item.to_string()),
                nested => {
                    return Err(ContractError::type_mismatch(
                        Self::NAME,
                        "scalar map values",
                        nested,
                    ))
                }
            };
            pairs.push(format!("{}=>{}", quote(key), rendered));
        }
        Ok(Outcome::Value(Value::String(pairs.join(", "))))
    }
}

impl Dispatch for LiteralTransformer {
    type Op = LiteralOp;
    const NAME: &'static str = "LiteralTransformer";

    fn options(&self) -> &OptionSet<LiteralOp> {
        &self.options
    }

    fn handler(op: LiteralOp) -> Handler<Self> {
        match op {
            LiteralOp::ArrayToLiteral => Self::encode_array,
            LiteralOp::LiteralToArray => Self::decode_array,
            LiteralOp::KeyValueToMap => Self::decode_key_value,
            LiteralOp::MapToKeyValue => Self::encode_key_value,
        }
    }
}

impl Node for LiteralTransformer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn transform(&self, value: Value) -> Result<Outcome, ContractError> {
        self.apply(value)
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn write_element(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(flag) => out.push_str(&quote(if *flag { "t" } else { "f" })),
        Value::Number(number) => out.push_str(&quote(&number.to_string())),
        Value::String(text) => out.push_str(&quote(text)),
        Value::Array(items) => write_sequence(items.iter(), out),
        Value::Object(entries) => write_sequence(entries.values(), out),
    }
}

fn write_sequence<'a>(items: impl Iterator<Item = &'a Value>, out: &mut String) {
    out.push('{');
    for (index, item) in items.enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        write_element(item, out);
    }
    out.push('}');
}

struct Cursor<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, position: 0 }
    }

    fn rest(&self) -> &'a str {
        self.text.get(self.position..).unwrap_or("")
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.position >= self.text.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.position += token.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn malformed(&self) -> ContractError {
        ContractError::MalformedLiteral {
            position: self.position,
        }
    }

    /// Reads a double-quoted string, the opening quote not yet consumed.
    fn quoted(&mut self) -> Option<String> {
        if !self.eat("\"") {
            return None;
        }
        let mut out = String::new();
        loop {
            match self.bump()? {
                '"' => return Some(out),
                '\\' => out.push(self.bump()?),
                c => out.push(c),
            }
        }
    }

    fn array(&mut self) -> Result<Value, ContractError> {
        if !self.eat("{") {
            return Err(self.malformed());
        }
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.eat("}") {
            return Ok(Value::Array(items));
        }
        loop {
            self.skip_whitespace();
            items.push(self.element()?);
            self.skip_whitespace();
            if self.eat("}") {
                return Ok(Value::Array(items));
            }
            if !self.eat(",") {
                return Err(self.malformed());
            }
        }
    }

    fn element(&mut self) -> Result<Value, ContractError> {
        match self.peek() {
            Some('{') => self.array(),
            Some('"') => self.quoted().map(Value::String).ok_or_else(|| self.malformed()),
            Some(_) => {
                let bare: String = self
                    .rest()
                    .chars()
                    .take_while(|c| *c != ',' && *c != '}')
                    .collect();
                self.position += bare.len();
                let bare = bare.trim();
                if bare.is_empty() {
                    Err(self.malformed())
                } else if bare.eq_ignore_ascii_case("null") {
                    Ok(Value::Null)
                } else {
                    Ok(Value::String(bare.to_string()))
                }
            }
            None => Err(self.malformed()),
        }
    }
}

/// Parses key-value text, keeping whatever pairs precede the first syntax
/// error.
fn parse_key_value(text: &str) -> Map<String, Value> {
    let mut cursor = Cursor::new(text);
    let mut entries = Map::new();

    loop {
        cursor.skip_whitespace();
        if cursor.at_end() {
            break;
        }
        let Some(key) = cursor.quoted() else { break };
        cursor.skip_whitespace();
        if !cursor.eat("=>") {
            break;
        }
        cursor.skip_whitespace();
        let value = if cursor.eat("NULL") {
            Value::Null
        } else if let Some(text) = cursor.quoted() {
            Value::String(text)
        } else {
            break;
        };
        entries.insert(key, value);
        cursor.skip_whitespace();
        if !cursor.eat(",") {
            break;
        }
    }

    if !cursor.at_end() {
        tracing::warn!(
            position = cursor.position,
            parsed = entries.len(),
            "malformed key-value text, keeping partial result"
        );
    }
    entries
}
