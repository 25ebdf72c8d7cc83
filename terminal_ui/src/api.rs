use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tasklist_shared::{
    ApiFailure, ApiResponse, CreateTaskRequest, DeletedTask, FieldError, Task, UpdateTaskRequest,
};
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:3001";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach the server ({0})")]
    Transport(#[from] reqwest::Error),
    #[error("invalid server address ({0})")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{}", describe_rejection(.message, .errors))]
    Rejected {
        message: String,
        errors: Vec<FieldError>,
    },
}

fn describe_rejection(message: &str, errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return message.to_string();
    }
    let details: Vec<String> = errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect();
    format!("{message} ({})", details.join("; "))
}

impl From<ApiFailure> for ClientError {
    fn from(failure: ApiFailure) -> Self {
        ClientError::Rejected {
            message: failure.message,
            errors: failure.errors,
        }
    }
}

/// The task endpoints of the server, as seen by the client.
#[allow(async_fn_in_trait)]
pub trait TaskApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError>;
    async fn create_task(&self, text: &str) -> Result<Task, ClientError>;
    async fn update_task(&self, id: i64, update: &UpdateTaskRequest) -> Result<Task, ClientError>;
    async fn toggle_task(&self, id: i64) -> Result<Task, ClientError>;
    async fn delete_task(&self, id: i64) -> Result<i64, ClientError>;
}

pub struct HttpTaskApi {
    client: Client,
    base: Url,
}

impl HttpTaskApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        // Without a trailing slash `join` would replace the last segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let envelope: ApiResponse<T> = response.json().await?;
        Ok(envelope.into_result()?)
    }
}

impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        Self::send(self.client.get(self.url("tasks")?)).await
    }

    async fn create_task(&self, text: &str) -> Result<Task, ClientError> {
        let body = CreateTaskRequest {
            text: Some(text.to_string()),
        };
        Self::send(self.client.post(self.url("tasks")?).json(&body)).await
    }

    async fn update_task(&self, id: i64, update: &UpdateTaskRequest) -> Result<Task, ClientError> {
        Self::send(self.client.put(self.url(&format!("tasks/{id}"))?).json(update)).await
    }

    async fn toggle_task(&self, id: i64) -> Result<Task, ClientError> {
        Self::send(self.client.patch(self.url(&format!("tasks/{id}/toggle"))?)).await
    }

    async fn delete_task(&self, id: i64) -> Result<i64, ClientError> {
        let deleted: DeletedTask =
            Self::send(self.client.delete(self.url(&format!("tasks/{id}"))?)).await?;
        Ok(deleted.id)
    }
}
