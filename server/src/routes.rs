use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use chrono::Utc;
use tasklist_shared::{
    ApiResponse, CreateTaskRequest, DeletedTask, HealthStatus, Task, UpdateTaskRequest,
};

use crate::error::ApiError;
use crate::store::TaskStore;
use crate::validation::{parse_task_id, validate_create, validate_update};

type ApiResult = Result<HttpResponse, ApiError>;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(list_tasks)
        .service(create_task)
        .service(get_task)
        .service(update_task)
        .service(toggle_task)
        .service(delete_task);
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok_with_message(
        HealthStatus {
            status: "ok".to_string(),
            timestamp: Utc::now(),
        },
        "Server is running",
    ))
}

#[get("/tasks")]
async fn list_tasks(store: web::Data<TaskStore>) -> ApiResult {
    let tasks = store
        .list_tasks()
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch tasks"))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(tasks)))
}

#[post("/tasks")]
async fn create_task(
    store: web::Data<TaskStore>,
    body: web::Json<CreateTaskRequest>,
) -> ApiResult {
    let text = validate_create(&body).map_err(ApiError::Validation)?;
    let task = store
        .create_task(&text)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to create task"))?;
    log::debug!("Created task {}", task.id);
    Ok(HttpResponse::Created().json(ApiResponse::ok(task)))
}

#[get("/tasks/{id}")]
async fn get_task(store: web::Data<TaskStore>, id: web::Path<String>) -> ApiResult {
    let id = parse_task_id(&id).map_err(ApiError::Validation)?;
    let task = store
        .get_task_by_id(id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch task"))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(task)))
}

#[put("/tasks/{id}")]
async fn update_task(
    store: web::Data<TaskStore>,
    id: web::Path<String>,
    body: web::Json<UpdateTaskRequest>,
) -> ApiResult {
    let id = parse_task_id(&id).map_err(ApiError::Validation)?;
    let patch = validate_update(&body).map_err(ApiError::Validation)?;
    let task = store
        .update_task(id, patch)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to update task"))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(task)))
}

#[patch("/tasks/{id}/toggle")]
async fn toggle_task(store: web::Data<TaskStore>, id: web::Path<String>) -> ApiResult {
    let id = parse_task_id(&id).map_err(ApiError::Validation)?;
    let task: Task = store
        .toggle_task(id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to toggle task"))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(task)))
}

#[delete("/tasks/{id}")]
async fn delete_task(store: web::Data<TaskStore>, id: web::Path<String>) -> ApiResult {
    let id = parse_task_id(&id).map_err(ApiError::Validation)?;
    let id = store
        .delete_task(id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to delete task"))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        DeletedTask { id },
        "Task deleted successfully",
    )))
}

/// Answers CORS preflight requests on any path.
pub async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

pub async fn route_not_found() -> ApiResult {
    Err(ApiError::RouteNotFound)
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        log::debug!("Rejected body for {} {}: {err}", req.method(), req.path());
        ApiError::MalformedRequest.into()
    })
}
