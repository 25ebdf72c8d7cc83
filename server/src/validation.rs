//! Request body checks run before anything reaches the store.
//!
//! Every rule is evaluated and all violations are returned together, so the
//! client can show them at once.

use tasklist_shared::{CreateTaskRequest, FieldError, UpdateTaskRequest};

use crate::store::{TaskPatch, MAX_TEXT_LEN};

fn check_text(text: &str, errors: &mut Vec<FieldError>) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new("text", "Task text is required"));
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        errors.push(FieldError::new(
            "text",
            format!("Task text must be at most {MAX_TEXT_LEN} characters"),
        ));
    }
    trimmed.to_string()
}

/// Returns the trimmed text of a new task. A missing text counts as empty.
pub fn validate_create(request: &CreateTaskRequest) -> Result<String, Vec<FieldError>> {
    let mut errors = Vec::new();
    let text = check_text(request.text.as_deref().unwrap_or_default(), &mut errors);
    if errors.is_empty() {
        Ok(text)
    } else {
        Err(errors)
    }
}

pub fn validate_update(request: &UpdateTaskRequest) -> Result<TaskPatch, Vec<FieldError>> {
    let mut errors = Vec::new();
    let text = request
        .text
        .as_deref()
        .map(|text| check_text(text, &mut errors));
    if errors.is_empty() {
        Ok(TaskPatch {
            text,
            completed: request.completed,
        })
    } else {
        Err(errors)
    }
}

pub fn parse_task_id(raw: &str) -> Result<i64, Vec<FieldError>> {
    raw.parse::<i64>()
        .map_err(|_| vec![FieldError::new("id", "Task id must be an integer")])
}
