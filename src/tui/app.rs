use ratatui::widgets::ListState;
use std::time::Instant;
use tracing::{debug, warn};

use crate::Config;
use crate::api::ApiError;
use crate::dispatch::{Completion, Dispatcher};
use crate::models::{LoginRequest, Priority, RegisterRequest, Task, TaskDraft};
use crate::query::{ListQuery, QueryChange};
use crate::session::{Session, SessionState};
use crate::task_list::TaskList;
use crate::tui::widgets::editor::Editor;
use crate::utils::parse_date;
use crate::workflow::{self, EditState, EditWorkflow, WorkflowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Todos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Search,
    TaskModal,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Name,
    Email,
    Password,
}

#[derive(Debug, Clone)]
pub struct AuthForm {
    pub name: Editor,
    pub email: Editor,
    pub password: Editor,
    pub current_field: AuthField,
    pub pending: bool,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            name: Editor::new(),
            email: Editor::new(),
            password: Editor::masked(),
            current_field: AuthField::Email,
            pending: false,
        }
    }
}

impl AuthForm {
    fn fields(screen: Screen) -> &'static [AuthField] {
        match screen {
            Screen::Register => &[AuthField::Name, AuthField::Email, AuthField::Password],
            _ => &[AuthField::Email, AuthField::Password],
        }
    }

    pub fn navigate(&mut self, screen: Screen, forward: bool) {
        let fields = Self::fields(screen);
        let index = fields.iter().position(|f| *f == self.current_field).unwrap_or(0);
        let next = if forward {
            (index + 1) % fields.len()
        } else {
            (index + fields.len() - 1) % fields.len()
        };
        self.current_field = fields[next];
    }

    pub fn current_editor(&mut self) -> &mut Editor {
        match self.current_field {
            AuthField::Name => &mut self.name,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Description,
    Priority,
    Date,
}

/// Editable view of the workflow draft while the modal is open
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub description: Editor,
    pub priority: Priority,
    pub date: Editor,
    pub current_field: TaskField,
}

impl TaskForm {
    pub fn from_draft(draft: &TaskDraft) -> Self {
        let date = draft.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        Self {
            description: Editor::from_string(&draft.description),
            priority: draft.priority,
            date: Editor::from_string(&date),
            current_field: TaskField::Description,
        }
    }

    /// Read the fields back into a draft; an empty date means none
    pub fn to_draft(&self) -> Result<TaskDraft, WorkflowError> {
        let date_text = self.date.text();
        let date = if date_text.trim().is_empty() {
            None
        } else {
            Some(parse_date(&date_text).map_err(|_| WorkflowError::InvalidDate(date_text.trim().to_string()))?)
        };
        Ok(TaskDraft {
            description: self.description.text(),
            priority: self.priority,
            date,
        })
    }

    pub fn navigate(&mut self, forward: bool) {
        self.current_field = match (self.current_field, forward) {
            (TaskField::Description, true) => TaskField::Priority,
            (TaskField::Priority, true) => TaskField::Date,
            (TaskField::Date, true) => TaskField::Description,
            (TaskField::Description, false) => TaskField::Date,
            (TaskField::Priority, false) => TaskField::Description,
            (TaskField::Date, false) => TaskField::Priority,
        };
    }

    pub fn current_editor(&mut self) -> Option<&mut Editor> {
        match self.current_field {
            TaskField::Description => Some(&mut self.description),
            TaskField::Date => Some(&mut self.date),
            TaskField::Priority => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub screen: Screen,
    pub mode: Mode,
    pub selected_index: usize,
    pub list_state: ListState,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            screen: Screen::Login,
            mode: Mode::View,
            selected_index: 0,
            list_state: ListState::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub editor: Editor,
    /// Search text to restore when search mode is cancelled
    pub previous: String,
}

pub struct App {
    // Core infrastructure
    pub config: Config,
    pub session: Session,
    pub dispatcher: Dispatcher,

    pub tasks: TaskList,
    pub workflow: EditWorkflow,

    // Grouped state
    pub ui: UiState,
    pub status: StatusState,
    pub search: SearchState,
    pub auth: AuthForm,
    pub task_form: Option<TaskForm>,
}

impl App {
    pub fn new(config: Config, session: Session, dispatcher: Dispatcher) -> Self {
        let tasks = TaskList::new(ListQuery::with_page_size(config.page_size));
        let mut app = Self {
            config,
            session,
            dispatcher,
            tasks,
            workflow: EditWorkflow::default(),
            ui: UiState::default(),
            status: StatusState::default(),
            search: SearchState::default(),
            auth: AuthForm::default(),
            task_form: None,
        };

        if app.session.state() == SessionState::LoggedIn {
            app.ui.screen = Screen::Todos;
            app.refetch();
        }
        app
    }

    fn token(&self) -> Option<String> {
        self.session.token().map(str::to_string)
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared (after 3 seconds)
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    fn report_api_error(&mut self, action: &str, err: &ApiError) {
        warn!(action, error = %err, "request failed");
        if err.is_unauthorized() {
            self.set_status_message(format!("{}: session expired, log out and log in again", action));
        } else {
            self.set_status_message(format!("{}: {}", action, err));
        }
    }

    // List

    pub fn refetch(&mut self) {
        let ticket = self.tasks.refetch();
        let token = self.token();
        self.dispatcher.fetch(ticket, token);
    }

    pub fn apply_query_change(&mut self, change: QueryChange) {
        if let Some(ticket) = self.tasks.set_parameter(change) {
            let token = self.token();
            self.dispatcher.fetch(ticket, token);
        }
    }

    pub fn next_page(&mut self) {
        if let Some(ticket) = self.tasks.next_page() {
            let token = self.token();
            self.dispatcher.fetch(ticket, token);
        }
    }

    pub fn prev_page(&mut self) {
        if let Some(ticket) = self.tasks.prev_page() {
            let token = self.token();
            self.dispatcher.fetch(ticket, token);
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.tasks.tasks().get(self.ui.selected_index)
    }

    pub fn sync_list_state(&mut self) {
        if self.tasks.tasks().is_empty() {
            self.ui.list_state.select(None);
        } else {
            self.ui.list_state.select(Some(self.ui.selected_index));
        }
    }

    /// Keep the selection inside the list after a refresh
    pub fn adjust_selected_index(&mut self) {
        let count = self.tasks.tasks().len();
        if count == 0 {
            self.ui.selected_index = 0;
        } else if self.ui.selected_index >= count {
            self.ui.selected_index = count - 1;
        }
        self.sync_list_state();
    }

    pub fn move_selection_up(&mut self) {
        if self.ui.selected_index > 0 {
            self.ui.selected_index -= 1;
        }
        self.sync_list_state();
    }

    pub fn move_selection_down(&mut self) {
        let count = self.tasks.tasks().len();
        if count > 0 && self.ui.selected_index + 1 < count {
            self.ui.selected_index += 1;
        }
        self.sync_list_state();
    }

    // Search

    pub fn enter_search_mode(&mut self) {
        self.ui.mode = Mode::Search;
        self.search.previous = self.tasks.query().search.clone();
        self.search.editor.set_text(&self.search.previous);
    }

    /// Push the current search text; unchanged text issues no request
    pub fn update_search(&mut self) {
        let text = self.search.editor.text();
        self.apply_query_change(QueryChange::Search(text));
    }

    pub fn exit_search_mode(&mut self, keep: bool) {
        if !keep {
            let previous = std::mem::take(&mut self.search.previous);
            self.search.editor.set_text(&previous);
            self.apply_query_change(QueryChange::Search(previous));
        }
        self.ui.mode = Mode::View;
    }

    pub fn cycle_completed_filter(&mut self) {
        let next = self.tasks.query().completed.cycle();
        self.apply_query_change(QueryChange::Completed(next));
    }

    pub fn toggle_order_by(&mut self) {
        let next = self.tasks.query().order_by.toggle();
        self.apply_query_change(QueryChange::OrderBy(next));
    }

    pub fn toggle_order_direction(&mut self) {
        let next = self.tasks.query().order_direction.toggle();
        self.apply_query_change(QueryChange::OrderDirection(next));
    }

    // Help

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.ui.mode = Mode::View;
    }

    // Task modal

    fn open_task_form(&mut self) {
        if let Some(draft) = self.workflow.state().draft() {
            self.task_form = Some(TaskForm::from_draft(draft));
            self.ui.mode = Mode::TaskModal;
        }
    }

    pub fn enter_create_mode(&mut self) {
        self.workflow.open_create();
        self.open_task_form();
    }

    pub fn enter_edit_mode(&mut self) {
        let Some(task) = self.selected_task().cloned() else {
            return;
        };
        match self.workflow.open_edit(&task) {
            Ok(()) => self.open_task_form(),
            Err(err) => self.set_status_message(err.to_string()),
        }
    }

    pub fn exit_task_modal(&mut self) {
        self.workflow.cancel();
        self.task_form = None;
        self.ui.mode = Mode::View;
    }

    pub fn save_task_form(&mut self) {
        let Some(form) = self.task_form.as_ref() else {
            return;
        };
        let draft = match form.to_draft() {
            Ok(draft) => draft,
            Err(err) => {
                let err = self.workflow.reject(err);
                self.set_status_message(err.to_string());
                return;
            }
        };

        let request = self
            .workflow
            .replace_draft(draft)
            .and_then(|()| self.workflow.begin_save());
        match request {
            Ok(request) => {
                let token = self.token();
                self.dispatcher.save(request, token);
            }
            Err(err) => self.set_status_message(err.to_string()),
        }
    }

    pub fn is_edit_mode(&self) -> bool {
        matches!(self.workflow.state(), EditState::EditDraft { .. })
    }

    // Immediate mutations

    pub fn toggle_task_status(&mut self) {
        let Some(task) = self.selected_task().cloned() else {
            return;
        };
        let token = self.token();
        self.dispatcher.toggle(task.id.clone(), workflow::toggle_patch(&task), token);
    }

    pub fn delete_selected_task(&mut self) {
        let Some(task) = self.selected_task().cloned() else {
            return;
        };
        let token = self.token();
        self.dispatcher.delete(task.id, token);
    }

    // Auth screens

    pub fn switch_auth_screen(&mut self) {
        self.ui.screen = match self.ui.screen {
            Screen::Login => Screen::Register,
            _ => Screen::Login,
        };
        self.auth.current_field = if self.ui.screen == Screen::Register {
            AuthField::Name
        } else {
            AuthField::Email
        };
    }

    pub fn submit_auth_form(&mut self) {
        if self.auth.pending {
            return;
        }
        let email = self.auth.email.text().trim().to_string();
        let password = self.auth.password.text();
        if email.is_empty() || password.is_empty() {
            self.set_status_message("Email and password are required".to_string());
            return;
        }

        match self.ui.screen {
            Screen::Login => {
                self.auth.pending = true;
                self.dispatcher.login(LoginRequest { email, password });
            }
            Screen::Register => {
                let name = self.auth.name.text().trim().to_string();
                if name.is_empty() {
                    self.set_status_message("Name is required".to_string());
                    return;
                }
                self.auth.pending = true;
                self.dispatcher.register(RegisterRequest { name, email, password });
            }
            Screen::Todos => {}
        }
    }

    pub fn logout(&mut self) {
        if let Err(err) = self.session.invalidate() {
            self.set_status_message(format!("Logout failed: {}", err));
            return;
        }
        self.tasks.reset(ListQuery::with_page_size(self.config.page_size));
        self.workflow.cancel();
        self.task_form = None;
        self.auth = AuthForm::default();
        self.ui = UiState::default();
        self.set_status_message("Logged out".to_string());
    }

    // Completions

    /// Apply everything the dispatcher has finished since the last tick
    pub fn process_completions(&mut self) {
        for completion in self.dispatcher.drain() {
            self.handle_completion(completion);
        }
    }

    pub fn handle_completion(&mut self, completion: Completion) {
        // Todo results that land after logout belong to the old session
        if self.session.state() == SessionState::LoggedOut
            && !matches!(completion, Completion::LoggedIn(_) | Completion::Registered(_))
        {
            debug!("dropping todo completion received while logged out");
            return;
        }
        match completion {
            Completion::Listed { seq, result } => {
                if let Err(err) = self.tasks.apply(seq, result) {
                    self.report_api_error("Loading tasks failed", &err);
                }
                self.adjust_selected_index();
            }
            Completion::Saved(result) => match self.workflow.finish_save(result) {
                Ok(_) => {
                    self.task_form = None;
                    self.ui.mode = Mode::View;
                    self.set_status_message("Task saved".to_string());
                    self.refetch();
                }
                Err(WorkflowError::Api(err)) => self.report_api_error("Save failed", &err),
                Err(err) => self.set_status_message(err.to_string()),
            },
            Completion::Toggled { result, .. } => match result {
                Ok(_) => self.refetch(),
                Err(err) => self.report_api_error("Toggle failed", &err),
            },
            Completion::Deleted { result, .. } => match result {
                Ok(()) => {
                    self.set_status_message("Task deleted".to_string());
                    self.refetch();
                }
                Err(err) => self.report_api_error("Delete failed", &err),
            },
            Completion::LoggedIn(result) => {
                self.auth.pending = false;
                match result {
                    Ok(response) => match self.session.establish(response.access_token) {
                        Ok(()) => {
                            self.auth.password.clear();
                            self.ui.screen = Screen::Todos;
                            self.ui.mode = Mode::View;
                            self.set_status_message("Logged in".to_string());
                            self.refetch();
                        }
                        Err(err) => self.set_status_message(err.to_string()),
                    },
                    Err(err) => self.set_status_message(format!("Login failed: {}", err)),
                }
            }
            Completion::Registered(result) => {
                self.auth.pending = false;
                match result {
                    Ok(_) => {
                        self.auth.password.clear();
                        self.ui.screen = Screen::Login;
                        self.auth.current_field = AuthField::Password;
                        self.set_status_message("Registered, please log in".to_string());
                    }
                    Err(err) => self.set_status_message(format!("Registration failed: {}", err)),
                }
            }
        }
    }
}
