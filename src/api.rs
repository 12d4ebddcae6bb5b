//! HTTP adapter for the todo backend.
//!
//! Every call takes the bearer token explicitly so the adapter holds no
//! session state of its own.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{LoginRequest, LoginResponse, RegisterRequest, Task, TaskDraft, TaskPatch};
use crate::query::ListQuery;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Could not reach server: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
    #[error("Unexpected response from server: {0}")]
    Decode(String),
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

/// Operations of the REST contract
#[async_trait]
pub trait TodoBackend: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value, ApiError>;

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;

    async fn list_todos(&self, token: Option<&str>, query: &ListQuery) -> Result<Vec<Task>, ApiError>;

    async fn create_todo(&self, token: Option<&str>, draft: &TaskDraft) -> Result<Task, ApiError>;

    async fn update_todo(&self, token: Option<&str>, id: &str, patch: &TaskPatch) -> Result<Task, ApiError>;

    async fn delete_todo(&self, token: Option<&str>, id: &str) -> Result<(), ApiError>;
}

pub struct HttpBackend {
    base_url: Url,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    /// Append `segments` to the base URL, each one percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str], token: Option<&str>) -> Result<RequestBuilder, ApiError> {
        let builder = self.client.request(method, self.endpoint(segments)?);
        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send_raw(builder).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_raw(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(status, &body);
            warn!(status = status.as_u16(), %message, "backend rejected request");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl TodoBackend for HttpBackend {
    async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value, ApiError> {
        debug!(email = %request.email, "registering user");
        let body = self
            .send_raw(self.request(Method::POST, &["auth", "register"], None)?.json(request))
            .await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        debug!(email = %request.email, "logging in");
        self.send(self.request(Method::POST, &["auth", "login"], None)?.json(request))
            .await
    }

    async fn list_todos(&self, token: Option<&str>, query: &ListQuery) -> Result<Vec<Task>, ApiError> {
        let pairs = query.to_pairs();
        debug!(?pairs, "listing todos");
        let body = self
            .send_raw(self.request(Method::GET, &["todos"], token)?.query(&pairs))
            .await?;
        // Some backends answer an empty page with no body at all
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn create_todo(&self, token: Option<&str>, draft: &TaskDraft) -> Result<Task, ApiError> {
        debug!(description = %draft.description, "creating todo");
        self.send(self.request(Method::POST, &["todos"], token)?.json(draft))
            .await
    }

    async fn update_todo(&self, token: Option<&str>, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        debug!(id, "updating todo");
        self.send(self.request(Method::PATCH, &["todos", id], token)?.json(patch))
            .await
    }

    async fn delete_todo(&self, token: Option<&str>, id: &str) -> Result<(), ApiError> {
        debug!(id, "deleting todo");
        self.send_raw(self.request(Method::DELETE, &["todos", id], token)?)
            .await?;
        Ok(())
    }
}

/// Pull a human readable message out of an error body.
/// Accepts `{"message": "..."}` and `{"message": ["...", "..."]}`.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed.as_ref().and_then(|value| match value.get("message") {
        Some(serde_json::Value::String(text)) => Some(text.clone()),
        Some(serde_json::Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(|item| item.as_str()).collect();
            if parts.is_empty() { None } else { Some(parts.join("; ")) }
        }
        _ => None,
    });

    message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use crate::query::{CompletedFilter, OrderBy, QueryChange};
    use chrono::NaiveDate;
    use mockito::Matcher;

    fn backend(server: &mockito::ServerGuard) -> HttpBackend {
        HttpBackend::new(&server.url(), Duration::from_secs(5)).expect("client")
    }

    #[tokio::test]
    async fn list_sends_all_parameters_and_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/todos")
            .match_header("authorization", "Bearer abc")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search".into(), "milk".into()),
                Matcher::UrlEncoded("completed".into(), "true".into()),
                Matcher::UrlEncoded("orderBy".into(), "priority".into()),
                Matcher::UrlEncoded("orderDirection".into(), "asc".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("pageSize".into(), "10".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"1","description":"Buy milk","priority":1,"date":"2024-01-01T00:00:00.000Z","completed":true}]"#)
            .create_async()
            .await;

        let mut query = ListQuery::default();
        query.apply(QueryChange::Search("milk".to_string()));
        query.apply(QueryChange::Completed(CompletedFilter::Completed));
        query.apply(QueryChange::OrderBy(OrderBy::Priority));

        let tasks = backend(&server)
            .list_todos(Some("abc"), &query)
            .await
            .expect("list should succeed");

        mock.assert_async().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "Buy milk");
        assert_eq!(tasks[0].date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[tokio::test]
    async fn create_posts_draft_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/todos")
            .match_body(Matcher::Json(serde_json::json!({
                "description": "Buy milk",
                "priority": 1,
                "date": "2024-01-01"
            })))
            .with_status(201)
            .with_body(r#"{"id":"9","description":"Buy milk","priority":1,"date":"2024-01-01","completed":false}"#)
            .create_async()
            .await;

        let draft = TaskDraft {
            description: "Buy milk".to_string(),
            priority: Priority::Low,
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
        };
        let task = backend(&server)
            .create_todo(Some("abc"), &draft)
            .await
            .expect("create should succeed");

        mock.assert_async().await;
        assert_eq!(task.id, "9");
    }

    #[tokio::test]
    async fn toggle_patches_only_completed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/todos/9")
            .match_body(Matcher::Json(serde_json::json!({ "completed": true })))
            .with_status(200)
            .with_body(r#"{"id":"9","description":"Buy milk","priority":1,"completed":true}"#)
            .create_async()
            .await;

        let task = backend(&server)
            .update_todo(Some("abc"), "9", &TaskPatch::completed(true))
            .await
            .expect("patch should succeed");

        mock.assert_async().await;
        assert!(task.completed);
    }

    #[tokio::test]
    async fn ids_are_sent_as_one_escaped_segment() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/todos/a%2Fb%3Fx")
            .with_status(200)
            .create_async()
            .await;

        backend(&server)
            .delete_todo(Some("abc"), "a/b?x")
            .await
            .expect("delete should succeed");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn base_url_path_prefix_is_kept() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/api/todos/9")
            .match_body(Matcher::Json(serde_json::json!({ "description": "Dated", "priority": 1, "date": null })))
            .with_status(200)
            .with_body(r#"{"id":"9","description":"Dated","priority":1,"completed":false}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(&format!("{}/api/", server.url()), Duration::from_secs(5)).expect("client");
        let patch = TaskDraft {
            description: "Dated".to_string(),
            ..TaskDraft::default()
        }
        .into_patch();
        let task = backend
            .update_todo(Some("abc"), "9", &patch)
            .await
            .expect("patch should succeed");

        mock.assert_async().await;
        assert_eq!(task.date, None);
    }

    #[test]
    fn unparseable_api_url_is_rejected() {
        let err = HttpBackend::new("localhost:3000", Duration::from_secs(5)).err();
        assert!(matches!(err, Some(ApiError::InvalidUrl(_))));
        assert!(matches!(
            HttpBackend::new("not a url", Duration::from_secs(5)),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn status_errors_carry_backend_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/todos/missing")
            .with_status(404)
            .with_body(r#"{"statusCode":404,"message":"Todo not found"}"#)
            .create_async()
            .await;

        let err = backend(&server)
            .delete_todo(Some("abc"), "missing")
            .await
            .expect_err("delete should fail");

        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("Todo not found"));
    }

    #[tokio::test]
    async fn invalid_login_is_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"message":"Invalid credentials"}"#)
            .create_async()
            .await;

        let err = backend(&server)
            .login(&LoginRequest {
                email: "a@b.c".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .expect_err("login should fail");

        assert!(err.is_unauthorized());
    }

    #[test]
    fn error_message_joins_validation_arrays() {
        let message = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"message":["description should not be empty","priority must be an integer"]}"#,
        );
        assert_eq!(message, "description should not be empty; priority must be an integer");
    }

    #[test]
    fn error_message_falls_back_to_reason_phrase() {
        assert_eq!(error_message(StatusCode::FORBIDDEN, "<html>"), "Forbidden");
    }
}
