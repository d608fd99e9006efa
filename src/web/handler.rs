//! Request handlers for accounts and tasks.
//!
//! Each handler builds a model from the request, normalizes it, and talks to a
//! repository. Data errors become a 400 with one sentence per property:
//!
//! ```json
//! {"errors": {"title": "Title must be between 1 and 140 characters long."}}
//! ```

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::entity::{Credentials, Task, User};
use crate::repository::{RepositoryError, TaskRepository, UserRepository};
use crate::{Entity, ErrorMap, Model, Node, Outcome, TextTransformer};

use super::RequestAdapter;

/// Status code and JSON body to send back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// JSON body
    pub body: Value,
}

impl Response {
    fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn invalid(errors: ErrorMap) -> Self {
        Self::new(400, json!({ "errors": errors }))
    }

    fn unauthorized(message: &str) -> Self {
        Self::new(401, json!({ "error": message }))
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

type Required = [(&'static str, &'static str)];

/// Normalizes `model` and checks that `required` properties are present.
fn validate<E: Entity>(
    request: &RequestAdapter,
    mut model: Model<E>,
    required: &Required,
) -> Result<Model<E>, Response> {
    let mut errors = match model.normalize() {
        Ok(errors) => errors.unwrap_or_default(),
        Err(error) => {
            tracing::warn!(request_id = %request.request_id(), entity = E::NAME, %error, "malformed input");
            return Err(Response::new(400, json!({ "error": "Request body is malformed." })));
        }
    };

    for (property, label) in required {
        if model.get(property).map_or(true, Value::is_null) {
            errors
                .entry((*property).to_string())
                .or_insert_with(|| format!("{label} is required."));
        }
    }

    if errors.is_empty() {
        Ok(model)
    } else {
        tracing::info!(request_id = %request.request_id(), entity = E::NAME, invalid = errors.len(), "rejected input");
        Err(Response::invalid(errors))
    }
}

fn storage_failure(request: &RequestAdapter, error: RepositoryError) -> Response {
    match error {
        RepositoryError::NotFound { .. } => {
            Response::new(404, json!({ "error": "Task not found." }))
        }
        RepositoryError::DuplicateEmail => Response::invalid(ErrorMap::from([(
            "email".to_string(),
            "Email is already registered.".to_string(),
        )])),
        other => {
            tracing::error!(request_id = %request.request_id(), error = %other, "storage failed");
            Response::new(500, json!({ "error": "Internal error." }))
        }
    }
}

/// Output form of a stored record. Password hashes never leave the server.
fn render<E: Entity>(model: Model<E>) -> Value {
    let mut properties = model.into_properties();
    properties.remove("password");
    Value::Object(properties)
}

/// Fills in `tags` from the description's hashtags when none were sent.
fn derive_tags(fields: &mut Map<String, Value>) {
    if fields.contains_key("tags") {
        return;
    }
    let Some(Value::String(description)) = fields.get("description") else {
        return;
    };
    let derived = TextTransformer::hashtags().transform(Value::String(description.clone()));
    if let Ok(Outcome::Value(tags)) = derived {
        fields.insert("tags".to_string(), tags);
    }
}

/// `POST /signup`: registers an account.
///
/// Responds 201 with the account, or 400 for invalid fields and taken emails.
pub fn handle_signup<S: UserRepository>(store: &S, request: &RequestAdapter) -> Response {
    let user = match validate(
        request,
        Model::<User>::from_map(request.merged()),
        &[("name", "Name"), ("email", "Email"), ("password", "Password")],
    ) {
        Ok(user) => user,
        Err(response) => return response,
    };

    match store.insert_user(&user) {
        Ok(stored) => {
            tracing::info!(request_id = %request.request_id(), user_id = ?stored.get("id"), "signed up");
            Response::new(201, json!({ "user": render(stored) }))
        }
        Err(error) => storage_failure(request, error),
    }
}

/// `POST /signin`: checks an email and password.
///
/// Responds 200 with the account, 400 for invalid fields, or 401 when the
/// credentials do not match an account.
pub fn handle_signin<S: UserRepository>(store: &S, request: &RequestAdapter) -> Response {
    let credentials = match validate(
        request,
        Model::<Credentials>::from_map(request.merged()),
        &[("email", "Email"), ("password", "Password")],
    ) {
        Ok(credentials) => credentials,
        Err(response) => return response,
    };

    match store.authenticate(&credentials) {
        Ok(Some(user)) => {
            tracing::info!(request_id = %request.request_id(), user_id = ?user.get("id"), "signed in");
            Response::new(200, json!({ "user": render(user) }))
        }
        Ok(None) => {
            tracing::info!(request_id = %request.request_id(), "sign-in refused");
            Response::unauthorized("Invalid email or password.")
        }
        Err(error) => storage_failure(request, error),
    }
}

/// `POST /tasks`: creates a task for the signed-in user.
///
/// Ids come from the store and the owner from the request context, whatever
/// the body says. Without `tags`, the description's hashtags are used.
pub fn handle_create_task<S: TaskRepository>(store: &S, request: &RequestAdapter) -> Response {
    let Some(user_id) = request.user_id() else {
        return Response::unauthorized("Authentication required.");
    };

    let mut fields = request.merged();
    fields.remove("id");
    derive_tags(&mut fields);

    let task = match validate(request, Model::<Task>::from_map(fields), &[("title", "Title")]) {
        Ok(task) => task,
        Err(response) => return response,
    };

    match store.insert_task(&task) {
        Ok(stored) => {
            tracing::info!(request_id = %request.request_id(), user_id, task_id = ?stored.get("id"), "created task");
            Response::new(201, json!({ "task": render(stored) }))
        }
        Err(error) => storage_failure(request, error),
    }
}

/// `PATCH /tasks/{id}`: changes the fields sent for one of the user's tasks.
///
/// Responds 404 when the task does not exist or belongs to someone else.
pub fn handle_update_task<S: TaskRepository>(store: &S, request: &RequestAdapter) -> Response {
    let Some(user_id) = request.user_id() else {
        return Response::unauthorized("Authentication required.");
    };

    let mut fields = request.merged();
    derive_tags(&mut fields);

    let patch = match validate(request, Model::<Task>::from_map(fields), &[("id", "Task")]) {
        Ok(patch) => patch,
        Err(response) => return response,
    };
    let Some(id) = patch.get("id").and_then(Value::as_u64) else {
        return Response::new(404, json!({ "error": "Task not found." }));
    };

    match store.update_task(id, &patch) {
        Ok(stored) => {
            tracing::info!(request_id = %request.request_id(), user_id, task_id = id, "updated task");
            Response::new(200, json!({ "task": render(stored) }))
        }
        Err(error) => storage_failure(request, error),
    }
}

/// `GET /tasks`: lists the signed-in user's tasks.
pub fn handle_list_tasks<S: TaskRepository>(store: &S, request: &RequestAdapter) -> Response {
    let Some(user_id) = request.user_id() else {
        return Response::unauthorized("Authentication required.");
    };

    match store.list_tasks(user_id) {
        Ok(tasks) => {
            tracing::info!(request_id = %request.request_id(), user_id, count = tasks.len(), "listed tasks");
            let tasks: Vec<Value> = tasks.into_iter().map(render).collect();
            Response::new(200, json!({ "tasks": tasks }))
        }
        Err(error) => storage_failure(request, error),
    }
}
