//! In-memory backend used by the unit tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::api::{ApiError, TodoBackend};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, Task, TaskDraft, TaskPatch};
use crate::query::{CompletedFilter, ListQuery, OrderBy, OrderDirection};

#[derive(Default)]
struct FakeState {
    users: Vec<RegisterRequest>,
    tasks: Vec<Task>,
    next_id: u64,
    list_calls: Vec<ListQuery>,
    fail_next: Option<(u16, String)>,
}

/// Behaves like the REST backend for a single user
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub const TOKEN: &'static str = "fake-token";

    pub fn with_user(email: &str, password: &str) -> Self {
        let backend = Self::default();
        backend.lock().users.push(RegisterRequest {
            name: "Test".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        });
        backend
    }

    pub fn list_calls(&self) -> Vec<ListQuery> {
        self.lock().list_calls.clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    /// Make the next call fail with the given status
    pub fn fail_next(&self, status: u16, message: &str) {
        self.lock().fail_next = Some((status, message.to_string()));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, token: Option<&str>) -> Result<std::sync::MutexGuard<'_, FakeState>, ApiError> {
        let mut state = self.lock();
        if let Some((status, message)) = state.fail_next.take() {
            return Err(ApiError::Status { status, message });
        }
        if token != Some(Self::TOKEN) {
            return Err(status(401, "Unauthorized"));
        }
        Ok(state)
    }
}

fn status(status: u16, message: &str) -> ApiError {
    ApiError::Status {
        status,
        message: message.to_string(),
    }
}

#[async_trait]
impl TodoBackend for FakeBackend {
    async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value, ApiError> {
        let mut state = self.lock();
        if state.users.iter().any(|user| user.email == request.email) {
            return Err(status(409, "Email already registered"));
        }
        state.users.push(request.clone());
        Ok(serde_json::json!({ "email": request.email }))
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let state = self.lock();
        let known = state
            .users
            .iter()
            .any(|user| user.email == request.email && user.password == request.password);
        if known {
            Ok(LoginResponse {
                access_token: Self::TOKEN.to_string(),
            })
        } else {
            Err(status(401, "Invalid credentials"))
        }
    }

    async fn list_todos(&self, token: Option<&str>, query: &ListQuery) -> Result<Vec<Task>, ApiError> {
        let mut state = self.check(token)?;
        state.list_calls.push(query.clone());

        let search = query.search.to_lowercase();
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|task| search.is_empty() || task.description.to_lowercase().contains(&search))
            .filter(|task| match query.completed {
                CompletedFilter::All => true,
                CompletedFilter::Completed => task.completed,
                CompletedFilter::Pending => !task.completed,
            })
            .cloned()
            .collect();

        match query.order_by {
            OrderBy::Date => tasks.sort_by_key(|task| task.date),
            OrderBy::Priority => tasks.sort_by_key(|task| task.priority),
        }
        if query.order_direction == OrderDirection::Desc {
            tasks.reverse();
        }

        let skip = ((query.page.max(1) - 1) * query.page_size) as usize;
        Ok(tasks.into_iter().skip(skip).take(query.page_size as usize).collect())
    }

    async fn create_todo(&self, token: Option<&str>, draft: &TaskDraft) -> Result<Task, ApiError> {
        let mut state = self.check(token)?;
        if draft.description.trim().is_empty() {
            return Err(status(400, "description should not be empty"));
        }
        state.next_id += 1;
        let task = Task {
            id: state.next_id.to_string(),
            description: draft.description.clone(),
            priority: draft.priority,
            date: draft.date,
            completed: false,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_todo(&self, token: Option<&str>, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        let mut state = self.check(token)?;
        let task = state
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| status(404, "Todo not found"))?;

        if let Some(description) = &patch.description {
            task.description = description.clone();
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(date) = patch.date {
            task.date = date;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        Ok(task.clone())
    }

    async fn delete_todo(&self, token: Option<&str>, id: &str) -> Result<(), ApiError> {
        let mut state = self.check(token)?;
        let before = state.tasks.len();
        state.tasks.retain(|task| task.id != id);
        if state.tasks.len() == before {
            return Err(status(404, "Todo not found"));
        }
        Ok(())
    }
}
