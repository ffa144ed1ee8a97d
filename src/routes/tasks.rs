use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTaskRequest, Task, TaskQuery, TaskStatus, UpdateTaskRequest},
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_COLUMNS: &str =
    "id, judul, deskripsi, kategori, status, tenggat_waktu, created_at, updated_at, user_id";

/// Retrieves the authenticated user's tasks.
///
/// Supports filtering by `kategori` and `status`, and sorting via `sort_by`
/// (`created_at`, `updated_at`, `tenggat_waktu`, `judul`) and `sort_order`
/// (`asc`/`desc`). Defaults to newest first.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let mut sql = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);
    let mut param_count = 2;

    if query_params.kategori.is_some() {
        sql.push_str(&format!(" AND kategori = ${}", param_count));
        param_count += 1;
    }
    if query_params.status.is_some() {
        sql.push_str(&format!(" AND status = ${}", param_count));
    }

    // Sort columns are whitelisted; anything else falls back to created_at.
    let sort_by = match query_params.sort_by.as_deref() {
        Some("updated_at") => "updated_at",
        Some("tenggat_waktu") => "tenggat_waktu",
        Some("judul") => "judul",
        _ => "created_at",
    };
    let sort_order = match query_params.sort_order.as_deref() {
        Some("asc") => "ASC",
        _ => "DESC",
    };
    sql.push_str(&format!(" ORDER BY {} {}", sort_by, sort_order));

    let mut query_builder = sqlx::query_as::<_, Task>(&sql).bind(auth.user_id());

    if let Some(kategori) = &query_params.kategori {
        query_builder = query_builder.bind(kategori);
    }
    if let Some(status) = query_params.status {
        query_builder = query_builder.bind(status);
    }

    let tasks = query_builder.fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Tasks berhasil diambil",
        "tasks": tasks
    })))
}

/// Creates a new task for the authenticated user. New tasks always start in
/// the `belum_selesai` status.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<CreateTaskRequest>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (id, user_id, judul, deskripsi, kategori, status, tenggat_waktu) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(auth.user_id())
    .bind(&task_data.judul)
    .bind(&task_data.deskripsi)
    .bind(&task_data.kategori)
    .bind(TaskStatus::BelumSelesai)
    .bind(task_data.tenggat_waktu)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Task berhasil dibuat",
        "task": task
    })))
}

/// Retrieves a single task. Every lookup is scoped to the owner, so another
/// user's task is indistinguishable from a missing one.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
        TASK_COLUMNS
    ))
    .bind(task_id.into_inner())
    .bind(auth.user_id())
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Task tidak ditemukan".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "task": task
    })))
}

/// Partially updates a task; only the provided fields are written.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskRequest>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    if task_data.is_empty() {
        return Err(AppError::BadRequest("Tidak ada field yang diupdate".into()));
    }

    let task_uuid = task_id.into_inner();

    let mut updates: Vec<String> = Vec::new();
    let mut param_count = 3; // $1 = id, $2 = user_id

    if task_data.judul.is_some() {
        updates.push(format!("judul = ${}", param_count));
        param_count += 1;
    }
    if task_data.deskripsi.is_some() {
        updates.push(format!("deskripsi = ${}", param_count));
        param_count += 1;
    }
    if task_data.kategori.is_some() {
        updates.push(format!("kategori = ${}", param_count));
        param_count += 1;
    }
    if task_data.status.is_some() {
        updates.push(format!("status = ${}", param_count));
        param_count += 1;
    }
    if task_data.tenggat_waktu.is_some() {
        updates.push(format!("tenggat_waktu = ${}", param_count));
    }
    updates.push("updated_at = NOW()".to_string());

    let sql = format!(
        "UPDATE tasks SET {} WHERE id = $1 AND user_id = $2 RETURNING {}",
        updates.join(", "),
        TASK_COLUMNS
    );

    let mut query_builder = sqlx::query_as::<_, Task>(&sql)
        .bind(task_uuid)
        .bind(auth.user_id());

    if let Some(judul) = &task_data.judul {
        query_builder = query_builder.bind(judul);
    }
    if let Some(deskripsi) = &task_data.deskripsi {
        query_builder = query_builder.bind(deskripsi);
    }
    if let Some(kategori) = &task_data.kategori {
        query_builder = query_builder.bind(kategori);
    }
    if let Some(status) = task_data.status {
        query_builder = query_builder.bind(status);
    }
    if let Some(tenggat_waktu) = task_data.tenggat_waktu {
        query_builder = query_builder.bind(tenggat_waktu);
    }

    let task = query_builder
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task tidak ditemukan".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Task berhasil diupdate",
        "task": task
    })))
}

/// Flips a task between `selesai` and `belum_selesai`.
#[patch("/{id}/status")]
pub async fn toggle_task_status(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task_uuid = task_id.into_inner();

    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
        TASK_COLUMNS
    ))
    .bind(task_uuid)
    .bind(auth.user_id())
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Task tidak ditemukan".into()))?;

    let new_status = task.status.toggled();

    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET status = $3, updated_at = NOW() \
         WHERE id = $1 AND user_id = $2 RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task_uuid)
    .bind(auth.user_id())
    .bind(new_status)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Status task berhasil diubah menjadi {}", new_status),
        "task": task
    })))
}

/// Deletes a task owned by the authenticated user.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_id.into_inner())
        .bind(auth.user_id())
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task tidak ditemukan".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Task berhasil dihapus"
    })))
}
