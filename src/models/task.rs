use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Represents the completion status of a task.
/// Corresponds to the `task_status` SQL enum; the wire names are the
/// original mobile client's (`selesai` = done, `belum_selesai` = pending).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    /// Task is completed.
    #[sqlx(rename = "selesai")]
    #[serde(rename = "selesai")]
    Selesai,
    /// Task is yet to be completed.
    #[sqlx(rename = "belum_selesai")]
    #[serde(rename = "belum_selesai")]
    BelumSelesai,
}

impl TaskStatus {
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Selesai => TaskStatus::BelumSelesai,
            TaskStatus::BelumSelesai => TaskStatus::Selesai,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskStatus::Selesai => write!(f, "selesai"),
            TaskStatus::BelumSelesai => write!(f, "belum_selesai"),
        }
    }
}

/// Input structure for creating a task. New tasks always start pending.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// The title of the task. Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200, message = "Judul tidak boleh kosong"))]
    pub judul: String,

    /// An optional description, max 1000 characters.
    #[validate(length(max = 1000, message = "Deskripsi maksimal 1000 karakter"))]
    pub deskripsi: Option<String>,

    /// Optional free-form category label.
    #[validate(length(max = 100, message = "Kategori maksimal 100 karakter"))]
    pub kategori: Option<String>,

    /// Optional deadline.
    pub tenggat_waktu: Option<DateTime<Utc>>,
}

/// Input structure for a partial task update; only the provided fields are
/// written.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Judul tidak boleh kosong"))]
    pub judul: Option<String>,

    #[validate(length(max = 1000, message = "Deskripsi maksimal 1000 karakter"))]
    pub deskripsi: Option<String>,

    #[validate(length(max = 100, message = "Kategori maksimal 100 karakter"))]
    pub kategori: Option<String>,

    pub status: Option<TaskStatus>,

    pub tenggat_waktu: Option<DateTime<Utc>>,
}

impl UpdateTaskRequest {
    /// True when the request carries nothing to write.
    pub fn is_empty(&self) -> bool {
        self.judul.is_none()
            && self.deskripsi.is_none()
            && self.kategori.is_none()
            && self.status.is_none()
            && self.tenggat_waktu.is_none()
    }
}

/// A task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub judul: String,
    pub deskripsi: Option<String>,
    pub kategori: Option<String>,
    pub status: TaskStatus,
    pub tenggat_waktu: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Identifier of the owning account; every query is scoped to it.
    pub user_id: i32,
}

/// Query parameters for filtering and sorting the task list.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskQuery {
    pub kategori: Option<String>,
    pub status: Option<TaskStatus>,
    /// One of `created_at`, `updated_at`, `tenggat_waktu`, `judul`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`; defaults to `desc`.
    pub sort_order: Option<String>,
}
