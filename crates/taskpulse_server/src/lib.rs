//! HTTP transport for TaskPulse.
//! Serves task CRUD, the notification feed and action endpoints, and runs
//! the reminder scheduler alongside.

mod app;
mod error;
pub mod presenters;
mod routes;

pub use app::{build_state, run_server, AppState};
pub use error::{ApiError, ServerError};
pub use routes::{router, ActionResponse, CreateTaskRequest, UpdateTaskRequest};
