//! SQL access for the `tasks` table.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tasklist_shared::Task;
use thiserror::Error;

/// Upper bound on task text, mirrored by the `VARCHAR(255)` column.
pub const MAX_TEXT_LEN: usize = 255;

// Column defaults pad SQLite's millisecond `%f` out to the nine fractional
// digits `timestamp_now` writes.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text VARCHAR(255) NOT NULL,
    completed BOOLEAN NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now') || '000000Z'),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now') || '000000Z')
)
"#;

const TASK_COLUMNS: &str = "id, text, completed, created_at, updated_at";

const SAMPLE_TASKS: [(&str, bool); 4] = [
    ("Complete project documentation", false),
    ("Review code changes", true),
    ("Setup database connection", false),
    ("Write unit tests", false),
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(i64),
    #[error("invalid task: {0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fields to change on an existing task. Absent fields are left untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    text: String,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            text: row.text,
            completed: row.completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// Fixed-width UTC so that stored timestamps order correctly as text.
fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn checked_text(text: &str) -> StoreResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(StoreError::Validation("text must not be empty".to_string()));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(StoreError::Validation(format!(
            "text must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(text.to_string())
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        log::info!("Connected to database {database_url}");
        Ok(Self::new(pool))
    }

    /// A private in-memory database. Limited to one connection, since every
    /// `:memory:` connection would otherwise see its own empty database.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Inserts the sample tasks if the table is empty. Returns how many
    /// rows were added.
    pub async fn seed_sample_tasks(&self) -> StoreResult<usize> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for (text, completed) in SAMPLE_TASKS {
            let now = timestamp_now();
            sqlx::query(
                "INSERT INTO tasks (text, completed, created_at, updated_at) VALUES (?, ?, ?, ?)",
            )
            .bind(text)
            .bind(completed)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(SAMPLE_TASKS.len())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// All tasks, newest first. An empty table yields an empty list.
    pub async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    pub async fn create_task(&self, text: &str) -> StoreResult<Task> {
        let text = checked_text(text)?;
        let now = timestamp_now();
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "INSERT INTO tasks (text, completed, created_at, updated_at) \
             VALUES (?, FALSE, ?, ?) RETURNING {TASK_COLUMNS}"
        ))
        .bind(text)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Applies the fields present in `patch` and refreshes `updated_at`.
    /// An empty patch only refreshes `updated_at`.
    pub async fn update_task(&self, id: i64, patch: TaskPatch) -> StoreResult<Task> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE tasks SET updated_at = MAX(");
        query.push_bind(timestamp_now()).push(", created_at)");
        if let Some(text) = patch.text {
            query.push(", text = ").push_bind(checked_text(&text)?);
        }
        if let Some(completed) = patch.completed {
            query.push(", completed = ").push_bind(completed);
        }
        query.push(" WHERE id = ").push_bind(id);
        query.push(format!(" RETURNING {TASK_COLUMNS}"));

        query
            .build_query_as::<TaskRow>()
            .fetch_optional(&self.pool)
            .await?
            .map(Task::from)
            .ok_or(StoreError::NotFound(id))
    }

    /// Negates whatever `completed` value is stored at the time of the call.
    pub async fn toggle_task(&self, id: i64) -> StoreResult<Task> {
        sqlx::query_as::<_, TaskRow>(&format!(
            "UPDATE tasks SET completed = NOT completed, updated_at = MAX(?, created_at) \
             WHERE id = ? RETURNING {TASK_COLUMNS}"
        ))
        .bind(timestamp_now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Task::from)
        .ok_or(StoreError::NotFound(id))
    }

    pub async fn delete_task(&self, id: i64) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("DELETE FROM tasks WHERE id = ? RETURNING id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    pub async fn get_task_by_id(&self, id: i64) -> StoreResult<Task> {
        sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Task::from)
        .ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> TaskStore {
        TaskStore::in_memory().await.unwrap()
    }

    #[actix_web::test]
    async fn create_trims_text_and_starts_incomplete() {
        let store = store().await;
        let task = store.create_task("  buy milk  ").await.unwrap();

        assert_eq!(task.text, "buy milk");
        assert!(!task.completed);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[actix_web::test]
    async fn create_rejects_blank_text() {
        let store = store().await;
        let err = store.create_task("   ").await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.list_tasks().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn list_is_newest_first() {
        let store = store().await;
        let a = store.create_task("A").await.unwrap();
        let b = store.create_task("B").await.unwrap();

        let ids: Vec<i64> = store
            .list_tasks()
            .await
            .unwrap()
            .iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[actix_web::test]
    async fn empty_list_is_not_an_error() {
        assert!(store().await.list_tasks().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn toggle_twice_restores_state_and_bumps_updated_at() {
        let store = store().await;
        let task = store.create_task("flip me").await.unwrap();

        let first = store.toggle_task(task.id).await.unwrap();
        assert!(first.completed);
        assert!(first.updated_at > task.updated_at);

        let second = store.toggle_task(task.id).await.unwrap();
        assert!(!second.completed);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.created_at, task.created_at);
    }

    #[actix_web::test]
    async fn update_only_touches_present_fields() {
        let store = store().await;
        let task = store.create_task("original").await.unwrap();

        let completed = store
            .update_task(
                task.id,
                TaskPatch {
                    completed: Some(true),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(completed.text, "original");
        assert!(completed.completed);

        let renamed = store
            .update_task(
                task.id,
                TaskPatch {
                    text: Some("x".to_string()),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.text, "x");
        assert!(renamed.completed);
        assert!(renamed.updated_at >= renamed.created_at);
    }

    #[actix_web::test]
    async fn empty_patch_refreshes_updated_at() {
        let store = store().await;
        let task = store.create_task("idle").await.unwrap();
        let touched = store
            .update_task(task.id, TaskPatch::default())
            .await
            .unwrap();
        assert_eq!(touched.text, task.text);
        assert!(touched.updated_at > task.updated_at);
    }

    #[actix_web::test]
    async fn mutations_on_missing_ids_report_not_found() {
        let store = store().await;
        assert!(matches!(
            store.update_task(42, TaskPatch::default()).await,
            Err(StoreError::NotFound(42))
        ));
        assert!(matches!(
            store.toggle_task(42).await,
            Err(StoreError::NotFound(42))
        ));
        assert!(matches!(
            store.delete_task(42).await,
            Err(StoreError::NotFound(42))
        ));
        assert!(matches!(
            store.get_task_by_id(42).await,
            Err(StoreError::NotFound(42))
        ));
    }

    #[actix_web::test]
    async fn deleted_task_is_gone() {
        let store = store().await;
        let task = store.create_task("short lived").await.unwrap();

        assert_eq!(store.delete_task(task.id).await.unwrap(), task.id);
        assert!(matches!(
            store.get_task_by_id(task.id).await,
            Err(StoreError::NotFound(id)) if id == task.id
        ));
    }

    #[actix_web::test]
    async fn ids_are_not_reused_after_delete() {
        let store = store().await;
        let first = store.create_task("one").await.unwrap();
        store.delete_task(first.id).await.unwrap();
        let second = store.create_task("two").await.unwrap();
        assert!(second.id > first.id);
    }

    #[actix_web::test]
    async fn seeding_only_fills_an_empty_table() {
        let store = store().await;
        assert_eq!(store.seed_sample_tasks().await.unwrap(), 4);
        assert_eq!(store.seed_sample_tasks().await.unwrap(), 0);

        let tasks = store.list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks.iter().filter(|task| task.completed).count(), 1);
    }

    #[actix_web::test]
    async fn default_timestamps_share_the_store_format() {
        let store = store().await;
        sqlx::query("INSERT INTO tasks (text) VALUES ('from elsewhere')")
            .execute(&store.pool)
            .await
            .unwrap();
        let later = store.create_task("written by the store").await.unwrap();

        let widths: Vec<i64> = sqlx::query_scalar("SELECT length(created_at) FROM tasks")
            .fetch_all(&store.pool)
            .await
            .unwrap();
        assert_eq!(widths, vec![30, 30]);

        let tasks = store.list_tasks().await.unwrap();
        assert_eq!(tasks[0].id, later.id);
        assert_eq!(tasks[1].text, "from elsewhere");
        assert!(tasks[1].updated_at >= tasks[1].created_at);
    }

    #[actix_web::test]
    async fn closed_store_surfaces_database_errors() {
        let store = store().await;
        store.close().await;
        assert!(matches!(
            store.list_tasks().await,
            Err(StoreError::Database(_))
        ));
    }
}
