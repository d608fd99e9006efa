//! The request boundary.
//!
//! Framework glue turns an HTTP request into a [`RequestAdapter`], calls one of
//! the handlers, and writes the returned [`Response`] back out. Nothing in this
//! module depends on a web framework.
//!
//! Input comes from two places that are never treated alike:
//! - the decoded body, which is untrusted and always normalized
//! - the request context (authenticated user id, route parameters), which the
//!   framework vouches for and which overrides body fields of the same name
//!
//! # Example Flow
//!
//! ```
//! use serde_json::json;
//! use taskbox_core::repository::MemoryStore;
//! use taskbox_core::web::{handle_create_task, RequestAdapter};
//!
//! let store = MemoryStore::default();
//!
//! let mut request = RequestAdapter::new("req-1");
//! request.set_user(7);
//! request
//!     .set_body(json!({"title": "  Buy noodles ", "user_id": 1}))
//!     .unwrap();
//!
//! let response = handle_create_task(&store, &request);
//! assert_eq!(response.status, 201);
//! assert_eq!(response.body["task"]["title"], "Buy noodles");
//! assert_eq!(response.body["task"]["user_id"], 7);
//! ```

mod adapter;
mod handler;

pub use adapter::RequestAdapter;
pub use handler::{
    handle_create_task, handle_list_tasks, handle_signin, handle_signup, handle_update_task,
    Response,
};
