pub mod config;
pub mod controller;
pub mod error;
pub mod firebase;
pub mod memory;
pub mod services;
pub mod session;
pub mod store;
pub mod task;
pub mod view;

pub use config::{AppConfig, BackendKind};
pub use controller::{Phase, SessionReaction, TaskListController};
pub use error::{ServiceError, SessionError};
pub use services::Services;
pub use session::{SessionManager, SessionState, User, UserId};
pub use store::{DocumentStore, PendingWrite};
pub use task::{Deadline, Priority, Task, TaskDocument, TaskDraft, TaskId};
pub use view::{FilterMode, SortMode};
