//! Create/edit modal state and the save that commits it.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, TodoBackend};
use crate::models::{Task, TaskDraft, TaskPatch};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Completed tasks cannot be edited")]
    EditLocked,
    #[error("Description cannot be empty")]
    EmptyDescription,
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("No task form is open")]
    NotOpen,
    #[error("A save is already in progress")]
    SaveInFlight,
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Closed,
    CreateDraft(TaskDraft),
    EditDraft { id: String, draft: TaskDraft },
}

impl EditState {
    pub fn is_open(&self) -> bool {
        !matches!(self, EditState::Closed)
    }

    pub fn draft(&self) -> Option<&TaskDraft> {
        match self {
            EditState::Closed => None,
            EditState::CreateDraft(draft) | EditState::EditDraft { draft, .. } => Some(draft),
        }
    }
}

/// The request a save turns into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveRequest {
    Create(TaskDraft),
    Update { id: String, patch: TaskPatch },
}

impl SaveRequest {
    pub async fn send(&self, backend: &dyn TodoBackend, token: Option<&str>) -> Result<Task, ApiError> {
        match self {
            SaveRequest::Create(draft) => backend.create_todo(token, draft).await,
            SaveRequest::Update { id, patch } => backend.update_todo(token, id, patch).await,
        }
    }
}

/// Completed tasks are locked against editing; toggle and delete stay available
pub fn can_edit(task: &Task) -> bool {
    !task.completed
}

/// Patch that flips completion as currently known to the client
pub fn toggle_patch(task: &Task) -> TaskPatch {
    TaskPatch::completed(!task.completed)
}

#[derive(Debug, Default)]
pub struct EditWorkflow {
    state: EditState,
    saving: bool,
    error: Option<String>,
}

impl EditWorkflow {
    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Last save or validation error for the open draft
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn open_create(&mut self) {
        self.state = EditState::CreateDraft(TaskDraft::default());
        self.error = None;
    }

    pub fn open_edit(&mut self, task: &Task) -> Result<(), WorkflowError> {
        if !can_edit(task) {
            return Err(WorkflowError::EditLocked);
        }
        self.state = EditState::EditDraft {
            id: task.id.clone(),
            draft: TaskDraft::from_task(task),
        };
        self.error = None;
        Ok(())
    }

    /// Discard the draft without touching the backend
    pub fn cancel(&mut self) {
        self.state = EditState::Closed;
        self.error = None;
        self.saving = false;
    }

    pub fn draft_mut(&mut self) -> Option<&mut TaskDraft> {
        match &mut self.state {
            EditState::Closed => None,
            EditState::CreateDraft(draft) | EditState::EditDraft { draft, .. } => Some(draft),
        }
    }

    pub fn replace_draft(&mut self, draft: TaskDraft) -> Result<(), WorkflowError> {
        let current = self.draft_mut().ok_or(WorkflowError::NotOpen)?;
        *current = draft;
        Ok(())
    }

    /// Record a problem found before a request could be built
    pub fn reject(&mut self, err: WorkflowError) -> WorkflowError {
        self.error = Some(err.to_string());
        err
    }

    /// Validate the draft and mark a save as in flight
    pub fn begin_save(&mut self) -> Result<SaveRequest, WorkflowError> {
        if self.saving {
            return Err(WorkflowError::SaveInFlight);
        }

        let request = match &self.state {
            EditState::Closed => return Err(WorkflowError::NotOpen),
            EditState::CreateDraft(draft) => SaveRequest::Create(normalized(draft)),
            EditState::EditDraft { id, draft } => SaveRequest::Update {
                id: id.clone(),
                patch: normalized(draft).into_patch(),
            },
        };

        let empty = match &request {
            SaveRequest::Create(draft) => draft.description.is_empty(),
            SaveRequest::Update { patch, .. } => patch.description.as_deref().unwrap_or("").is_empty(),
        };
        if empty {
            return Err(self.reject(WorkflowError::EmptyDescription));
        }

        self.saving = true;
        self.error = None;
        debug!(?request, "save started");
        Ok(request)
    }

    /// Close on success; keep the draft open with the error on failure
    pub fn finish_save(&mut self, result: Result<Task, ApiError>) -> Result<Task, WorkflowError> {
        self.saving = false;
        match result {
            Ok(task) => {
                info!(id = %task.id, "task saved");
                self.state = EditState::Closed;
                self.error = None;
                Ok(task)
            }
            Err(err) => {
                warn!(error = %err, "save failed");
                if self.state.is_open() {
                    self.error = Some(err.to_string());
                }
                Err(WorkflowError::Api(err))
            }
        }
    }

    pub async fn save(&mut self, backend: &dyn TodoBackend, token: Option<&str>) -> Result<Task, WorkflowError> {
        let request = self.begin_save()?;
        let result = request.send(backend, token).await;
        self.finish_save(result)
    }
}

fn normalized(draft: &TaskDraft) -> TaskDraft {
    TaskDraft {
        description: draft.description.trim().to_string(),
        ..draft.clone()
    }
}
