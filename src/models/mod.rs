pub mod task;
pub mod user;

pub use task::{CreateTaskRequest, Task, TaskQuery, TaskStatus, UpdateTaskRequest};
pub use user::{User, UserResponse, PROVIDER_GOOGLE, PROVIDER_LOCAL};
