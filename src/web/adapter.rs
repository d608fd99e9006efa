//! Framework-neutral view of one request.

use serde_json::{Map, Value};

use crate::ContractError;

/// The inputs of one request, split by trust.
///
/// Framework code fills this from its own request type: the decoded body
/// through [`set_body`](Self::set_body) or [`add_body_field`](Self::add_body_field),
/// and what it has verified itself through [`set_user`](Self::set_user) and
/// [`add_route_param`](Self::add_route_param).
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taskbox_core::web::RequestAdapter;
///
/// let mut request = RequestAdapter::new("req-12345");
/// request.add_body_field("title", "hello");
/// request.add_body_field("user_id", 99);
/// request.set_user(7);
///
/// let merged = request.merged();
/// assert_eq!(merged["title"], json!("hello"));
/// assert_eq!(merged["user_id"], json!(7));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestAdapter {
    request_id: String,
    user_id: Option<u64>,
    body: Map<String, Value>,
    context: Map<String, Value>,
}

impl RequestAdapter {
    /// Creates an adapter with no inputs.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// Replaces the body fields with a decoded JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ContractError::TypeMismatch` if `body` is not an object.
    pub fn set_body(&mut self, body: Value) -> Result<(), ContractError> {
        match body {
            Value::Object(fields) => {
                self.body = fields;
                Ok(())
            }
            other => Err(ContractError::type_mismatch("RequestAdapter", "an object", &other)),
        }
    }

    /// Adds one untrusted body field.
    pub fn add_body_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.body.insert(key.into(), value.into());
    }

    /// Records the authenticated user. Also exposed to handlers as the
    /// `user_id` context field.
    pub fn set_user(&mut self, user_id: u64) {
        self.user_id = Some(user_id);
        self.context.insert("user_id".to_string(), Value::from(user_id));
    }

    /// Adds a parameter taken from the matched route.
    pub fn add_route_param(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.context.insert(key.into(), value.into());
    }

    /// Returns the request identifier.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the authenticated user, if any.
    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    /// Returns the untrusted body fields.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Returns one trusted context field.
    pub fn context(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// Body and context as one flat map. Context fields win on collision.
    pub fn merged(&self) -> Map<String, Value> {
        let mut merged = self.body.clone();
        for (key, value) in &self.context {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_adapter_is_empty() {
        let request = RequestAdapter::new("req-test");

        assert_eq!(request.request_id(), "req-test");
        assert_eq!(request.user_id(), None);
        assert!(request.merged().is_empty());
    }

    #[test]
    fn set_body_requires_object() {
        let mut request = RequestAdapter::new("req-1");

        assert!(request.set_body(json!(["title"])).is_err());
        assert!(request.set_body(json!({"title": "x"})).is_ok());
        assert_eq!(request.body()["title"], json!("x"));
    }

    #[test]
    fn context_overrides_body() {
        let mut request = RequestAdapter::new("req-1");
        request
            .set_body(json!({"id": 1, "user_id": 2, "title": "t"}))
            .unwrap();
        request.set_user(5);
        request.add_route_param("id", "9");

        let merged = request.merged();

        assert_eq!(merged["id"], json!("9"));
        assert_eq!(merged["user_id"], json!(5));
        assert_eq!(merged["title"], json!("t"));
        // The body itself is left as submitted.
        assert_eq!(request.body()["user_id"], json!(2));
    }

    #[test]
    fn set_user_exposes_context_field() {
        let mut request = RequestAdapter::new("req-1");
        request.set_user(42);

        assert_eq!(request.user_id(), Some(42));
        assert_eq!(request.context("user_id"), Some(&json!(42)));
    }
}
