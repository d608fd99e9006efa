//! Storage for normalized entities.
//!
//! Repositories are the last stop before data leaves the process, so they
//! only accept models whose `normalize()` has succeeded. Everything they hand
//! back is a copy sanitized for HTML output ([`HTML`]).
//!
//! [`MemoryStore`] is an in-memory implementation used by tests and demos. A
//! SQL-backed store would implement the same traits and write the normalized
//! property values as-is, since they already use the store's text encodings.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::entity::{Credentials, Task, User, HTML};
use crate::{Argon2Hasher, ContractError, Entity, HashError, Model, PasswordHasher, Plaintext};

/// Failure to store or load an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The model was handed over before it was normalized.
    #[error("{entity} must be normalized before it is stored")]
    NotNormalized {
        /// The entity type name
        entity: &'static str,
    },

    /// No record with this id exists for the caller.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The entity type name
        entity: &'static str,
        /// The requested id
        id: u64,
    },

    /// Another account already uses this email address.
    #[error("email address is already registered")]
    DuplicateEmail,

    /// Sanitizing a stored record broke a pipeline contract.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// The password backend could not check a stored hash.
    #[error("password check failed: {0}")]
    Hashing(#[from] HashError),
}

/// Account storage.
pub trait UserRepository {
    /// Stores a new account and returns it sanitized, with its `id` set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotNormalized` for unnormalized input and
    /// `RepositoryError::DuplicateEmail` if the email is taken.
    fn insert_user(&self, user: &Model<User>) -> Result<Model<User>, RepositoryError>;

    /// Checks sign-in credentials against the stored password hash.
    ///
    /// Returns `Ok(None)` when the email is unknown or the password does not
    /// match; callers must not tell the two apart in their response.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotNormalized` for unnormalized input and
    /// `RepositoryError::Hashing` if a stored hash cannot be read.
    fn authenticate(
        &self,
        credentials: &Model<Credentials>,
    ) -> Result<Option<Model<User>>, RepositoryError>;
}

/// Task storage. Every task belongs to the user in its `user_id` property.
pub trait TaskRepository {
    /// Stores a new task and returns it sanitized, with its `id` set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotNormalized` for unnormalized input.
    fn insert_task(&self, task: &Model<Task>) -> Result<Model<Task>, RepositoryError>;

    /// Overwrites the properties present in `patch` on task `id`.
    ///
    /// The task must belong to the `user_id` in `patch`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such task belongs to that
    /// user, and `RepositoryError::NotNormalized` for unnormalized input.
    fn update_task(&self, id: u64, patch: &Model<Task>) -> Result<Model<Task>, RepositoryError>;

    /// Returns the tasks of one user, oldest first, sanitized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Contract` if a stored task cannot be
    /// sanitized.
    fn list_tasks(&self, user_id: u64) -> Result<Vec<Model<Task>>, RepositoryError>;
}

type Table = RefCell<BTreeMap<u64, Map<String, Value>>>;

/// An in-memory store for users and tasks.
///
/// Records are kept as normalized property maps. Uses interior mutability so
/// handlers can share one store by reference.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taskbox_core::entity::Task;
/// use taskbox_core::repository::{MemoryStore, TaskRepository};
/// use taskbox_core::Model;
///
/// let store = MemoryStore::default();
/// let mut task = Model::<Task>::from_value(json!({
///     "user_id": 1,
///     "title": "Fish & chips",
/// }))
/// .unwrap();
///
/// // Raw input is refused.
/// assert!(store.insert_task(&task).is_err());
///
/// task.normalize().unwrap();
/// let stored = store.insert_task(&task).unwrap();
/// assert_eq!(stored.get("id"), Some(&json!(1)));
/// assert_eq!(stored.get_str("title"), Some("Fish &amp; chips"));
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    hasher: Arc<dyn PasswordHasher>,
    users: Table,
    tasks: Table,
    next_id: Cell<u64>,
}

impl MemoryStore {
    /// Creates an empty store that checks passwords with `hasher`.
    pub fn new(hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            hasher,
            users: Table::default(),
            tasks: Table::default(),
            next_id: Cell::new(1),
        }
    }

    /// Number of stored accounts.
    pub fn user_count(&self) -> usize {
        self.users.borrow().len()
    }

    /// Number of stored tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.borrow().len()
    }

    fn allocate_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(Argon2Hasher::default()))
    }
}

fn require_normalized<E: Entity>(model: &Model<E>) -> Result<(), RepositoryError> {
    if model.is_normalized() {
        Ok(())
    } else {
        Err(RepositoryError::NotNormalized { entity: E::NAME })
    }
}

fn publish<E: Entity>(properties: Map<String, Value>) -> Result<Model<E>, RepositoryError> {
    Ok(Model::<E>::restore(properties).sanitized_copy(HTML)?)
}

fn owned_by(record: &Map<String, Value>, user_id: u64) -> bool {
    record.get("user_id").and_then(Value::as_u64) == Some(user_id)
}

impl UserRepository for MemoryStore {
    fn insert_user(&self, user: &Model<User>) -> Result<Model<User>, RepositoryError> {
        require_normalized(user)?;

        let email = user.get_str("email");
        let taken = self
            .users
            .borrow()
            .values()
            .any(|record| record.get("email").and_then(Value::as_str) == email);
        if taken {
            return Err(RepositoryError::DuplicateEmail);
        }

        let id = self.allocate_id();
        let mut record = user.properties().clone();
        record.insert("id".to_string(), Value::from(id));
        self.users.borrow_mut().insert(id, record.clone());

        tracing::debug!(id, "stored user");
        publish(record)
    }

    fn authenticate(
        &self,
        credentials: &Model<Credentials>,
    ) -> Result<Option<Model<User>>, RepositoryError> {
        require_normalized(credentials)?;

        let (Some(email), Some(password)) =
            (credentials.get_str("email"), credentials.get_str("password"))
        else {
            return Ok(None);
        };

        let found = self
            .users
            .borrow()
            .values()
            .find(|record| record.get("email").and_then(Value::as_str) == Some(email))
            .cloned();
        let Some(record) = found else {
            return Ok(None);
        };
        let Some(hash) = record.get("password").and_then(Value::as_str) else {
            return Ok(None);
        };

        if self.hasher.verify(&Plaintext::new(password), hash)? {
            publish(record).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl TaskRepository for MemoryStore {
    fn insert_task(&self, task: &Model<Task>) -> Result<Model<Task>, RepositoryError> {
        require_normalized(task)?;

        let id = self.allocate_id();
        let mut record = task.properties().clone();
        record.insert("id".to_string(), Value::from(id));
        self.tasks.borrow_mut().insert(id, record.clone());

        tracing::debug!(id, "stored task");
        publish(record)
    }

    fn update_task(&self, id: u64, patch: &Model<Task>) -> Result<Model<Task>, RepositoryError> {
        require_normalized(patch)?;

        let owner = patch.get("user_id").and_then(Value::as_u64);
        let mut tasks = self.tasks.borrow_mut();
        let record = tasks
            .get_mut(&id)
            .filter(|record| owner.is_some_and(|user_id| owned_by(record, user_id)))
            .ok_or(RepositoryError::NotFound {
                entity: Task::NAME,
                id,
            })?;

        for (key, value) in patch.properties() {
            if key != "id" {
                record.insert(key.clone(), value.clone());
            }
        }

        tracing::debug!(id, "updated task");
        publish(record.clone())
    }

    fn list_tasks(&self, user_id: u64) -> Result<Vec<Model<Task>>, RepositoryError> {
        self.tasks
            .borrow()
            .values()
            .filter(|record| owned_by(record, user_id))
            .map(|record| publish(record.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::Params;
    use serde_json::json;

    fn store() -> MemoryStore {
        let params = Params::new(8, 1, 1, None).expect("valid params");
        MemoryStore::new(Arc::new(Argon2Hasher::with_params(params)))
    }

    fn task(value: Value) -> Model<Task> {
        let mut task = Model::from_value(value).unwrap();
        assert_eq!(task.normalize().unwrap(), None);
        task
    }

    fn user(email: &str, password: &str) -> Model<User> {
        let mut user = Model::from_value(json!({
            "name": "Ada",
            "email": email,
            "password": password,
        }))
        .unwrap();
        assert_eq!(user.normalize().unwrap(), None);
        user
    }

    fn credentials(email: &str, password: &str) -> Model<Credentials> {
        let mut credentials =
            Model::from_value(json!({"email": email, "password": password})).unwrap();
        credentials.normalize().unwrap();
        credentials
    }

    #[test]
    fn unnormalized_models_are_refused() {
        let store = store();
        let raw = Model::<Task>::from_value(json!({"title": "x"})).unwrap();

        assert_eq!(
            store.insert_task(&raw),
            Err(RepositoryError::NotNormalized { entity: "Task" })
        );
        assert_eq!(store.task_count(), 0);
    }

    #[test]
    fn stored_tasks_come_back_sanitized() {
        let store = store();
        let stored = store
            .insert_task(&task(json!({"user_id": 3, "title": "a \"b\"", "tags": ["<x>"]})))
            .unwrap();

        assert!(stored.is_sanitized());
        assert_eq!(stored.get_str("title"), Some("a &quot;b&quot;"));
        assert_eq!(stored.get("tags"), Some(&json!(["&lt;x&gt;"])));
    }

    #[test]
    fn tasks_are_listed_per_owner() {
        let store = store();
        store.insert_task(&task(json!({"user_id": 1, "title": "mine"}))).unwrap();
        store.insert_task(&task(json!({"user_id": 2, "title": "theirs"}))).unwrap();
        store.insert_task(&task(json!({"user_id": 1, "title": "also mine"}))).unwrap();

        let titles: Vec<_> = store
            .list_tasks(1)
            .unwrap()
            .iter()
            .map(|task| task.get_str("title").unwrap().to_string())
            .collect();

        assert_eq!(titles, ["mine", "also mine"]);
    }

    #[test]
    fn update_merges_patch_for_owner_only() {
        let store = store();
        let id = store
            .insert_task(&task(json!({"user_id": 1, "title": "draft", "done": false})))
            .unwrap()
            .get("id")
            .and_then(Value::as_u64)
            .unwrap();

        let updated = store
            .update_task(id, &task(json!({"user_id": 1, "done": "yes"})))
            .unwrap();
        assert_eq!(updated.get_str("title"), Some("draft"));
        assert_eq!(updated.get_str("done"), Some("t"));

        assert_eq!(
            store.update_task(id, &task(json!({"user_id": 2, "done": "no"}))),
            Err(RepositoryError::NotFound { entity: "Task", id })
        );
        assert!(matches!(
            store.update_task(99, &task(json!({"user_id": 1}))),
            Err(RepositoryError::NotFound { id: 99, .. })
        ));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let store = store();
        store.insert_user(&user("ada@example.org", "first-password")).unwrap();

        assert_eq!(
            store.insert_user(&user("ada@example.org", "second-password")),
            Err(RepositoryError::DuplicateEmail)
        );
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn authenticate_verifies_hash() {
        let store = store();
        store.insert_user(&user("ada@example.org", "analytical")).unwrap();

        let found = store
            .authenticate(&credentials("ada@example.org", "analytical"))
            .unwrap()
            .expect("password matches");
        assert_eq!(found.get_str("name"), Some("Ada"));

        assert_eq!(
            store.authenticate(&credentials("ada@example.org", "difference")).unwrap(),
            None
        );
        assert_eq!(
            store.authenticate(&credentials("bob@example.org", "analytical")).unwrap(),
            None
        );
    }
}
