//! Client-side copy of the task list and the rules for keeping it in step
//! with the server.
//!
//! The server is the source of truth. The local list is replaced wholesale
//! on load and patched with whatever the server returns after a mutation;
//! nothing is inserted or changed locally before the server confirms it.

use tasklist_shared::{Task, TaskStats, UpdateTaskRequest};

use crate::api::TaskApi;

/// An in-progress inline edit. The draft is independent of the committed
/// task text until the server accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub id: i64,
    pub draft: String,
}

pub struct TaskList<A> {
    api: A,
    tasks: Vec<Task>,
    error: Option<String>,
    loading: bool,
    loaded: bool,
    input: String,
    editing: Option<Edit>,
    pending_delete: Option<i64>,
}

impl<A: TaskApi> TaskList<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            error: None,
            loading: true,
            loaded: false,
            input: String::new(),
            editing: None,
            pending_delete: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn editing(&self) -> Option<&Edit> {
        self.editing.as_ref()
    }

    pub fn edit_draft_mut(&mut self) -> Option<&mut String> {
        self.editing.as_mut().map(|edit| &mut edit.draft)
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.pending_delete
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks)
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn fail(&mut self, message: String) {
        self.error = Some(message);
    }

    fn replace(&mut self, task: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
    }

    /// Fetches the full list. Only the first load raises the loading flag.
    pub async fn load(&mut self) {
        if !self.loaded {
            self.loading = true;
        }
        match self.api.list_tasks().await {
            Ok(tasks) => {
                self.tasks = tasks;
                self.error = None;
            }
            Err(e) => {
                self.tasks.clear();
                self.fail(format!(
                    "Failed to load tasks. Please check if the server is running. ({e})"
                ));
            }
        }
        self.loading = false;
        self.loaded = true;
    }

    /// Sends the new-task input. The input is only cleared once the server
    /// has created the task; blank input is ignored.
    pub async fn submit_new_task(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }
        match self.api.create_task(&text).await {
            Ok(task) => {
                self.tasks.insert(0, task);
                self.input.clear();
            }
            Err(e) => self.fail(format!("Failed to create task: {e}")),
        }
    }

    pub async fn toggle(&mut self, id: i64) {
        match self.api.toggle_task(id).await {
            Ok(task) => self.replace(task),
            Err(e) => self.fail(format!("Failed to update task: {e}")),
        }
    }

    pub fn begin_edit(&mut self, id: i64) {
        self.editing = self.tasks.iter().find(|t| t.id == id).map(|task| Edit {
            id,
            draft: task.text.clone(),
        });
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Saves the draft. A blank draft or one equal to the committed text
    /// ends the edit without calling the server.
    pub async fn commit_edit(&mut self) {
        let Some(edit) = self.editing.take() else {
            return;
        };
        let Some(committed) = self.tasks.iter().find(|t| t.id == edit.id) else {
            return;
        };
        let text = edit.draft.trim();
        if text.is_empty() || text == committed.text {
            return;
        }

        let update = UpdateTaskRequest {
            text: Some(text.to_string()),
            completed: None,
        };
        match self.api.update_task(edit.id, &update).await {
            Ok(task) => self.replace(task),
            Err(e) => self.fail(format!("Failed to update task: {e}")),
        }
    }

    /// Marks a task for deletion. Nothing is sent until `confirm_delete`.
    pub fn request_delete(&mut self, id: i64) {
        if self.tasks.iter().any(|t| t.id == id) {
            self.pending_delete = Some(id);
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub async fn confirm_delete(&mut self) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };
        match self.api.delete_task(id).await {
            Ok(deleted) => self.tasks.retain(|t| t.id != deleted),
            Err(e) => self.fail(format!("Failed to delete task: {e}")),
        }
    }
}
