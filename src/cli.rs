use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::api::{ApiError, TodoBackend};
use crate::models::{LoginRequest, Priority, RegisterRequest, Task, TaskDraft};
use crate::query::{CompletedFilter, ListQuery, OrderBy, OrderDirection};
use crate::session::{Session, SessionError, SessionState};
use crate::task_list::{EMPTY_MESSAGE, TaskList};
use crate::utils::parse_date;
use crate::workflow::{self, WorkflowError};

/// Page size used when scanning for a task by id
const SCAN_PAGE_SIZE: u32 = 100;
const SCAN_MAX_PAGES: u32 = 50;

#[derive(Parser)]
#[command(name = "tdl")]
#[command(about = "Terminal client for a REST todo list")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use development mode (separate config, session and log)
    #[arg(long, global = true)]
    pub dev: bool,

    /// Backend base URL, overrides `api_url` from the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Create an account
    Register {
        name: String,
        email: String,
        password: String,
    },
    /// Log in and store the access token
    Login { email: String, password: String },
    /// Forget the stored access token
    Logout,
    /// List tasks
    List {
        /// Only tasks whose description contains this text
        #[arg(long, default_value = "")]
        search: String,
        /// all, true or false
        #[arg(long, default_value = "all")]
        completed: CompletedFilter,
        /// date or priority
        #[arg(long, default_value = "date")]
        order_by: OrderBy,
        /// asc or desc
        #[arg(long, default_value = "asc")]
        order_direction: OrderDirection,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Defaults to `page_size` from the config file
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Add a task
    Add {
        description: String,
        /// 1 (low), 2 (medium) or 3 (high)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
        priority: u8,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Edit an incomplete task
    Edit {
        id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
        priority: Option<u8>,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Flip a task between completed and pending
    Toggle { id: String },
    /// Delete a task
    Delete { id: String },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Not logged in. Run `tdl login <email> <password>` first")]
    NotLoggedIn,
    #[error("Task not found: {0}")]
    TaskNotFound(String),
    #[error("Nothing to change; pass --description, --priority or --date")]
    NothingToEdit,
}

/// One line per task: status, id, priority, date, description
pub fn format_task_line(task: &Task) -> String {
    let status = if task.completed { "[x]" } else { "[ ]" };
    let date = task
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "----------".to_string());
    format!(
        "{} {:>6}  {:<6}  {}  {}",
        status,
        task.id,
        task.priority.label(),
        date,
        task.description
    )
}

fn parse_optional_date(date: Option<String>) -> Result<Option<chrono::NaiveDate>, CliError> {
    date.map(|text| {
        parse_date(&text).map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", text, e)))
    })
    .transpose()
}

fn priority_from_arg(value: u8) -> Priority {
    Priority::try_from(value).unwrap_or_default()
}

fn require_token(session: &Session) -> Result<&str, CliError> {
    match session.state() {
        SessionState::LoggedIn => session.token().ok_or(CliError::NotLoggedIn),
        SessionState::LoggedOut => Err(CliError::NotLoggedIn),
    }
}

/// Page through the unfiltered list until the task turns up
async fn find_task(backend: &dyn TodoBackend, token: &str, id: &str) -> Result<Task, CliError> {
    let mut query = ListQuery::with_page_size(SCAN_PAGE_SIZE);
    for page in 1..=SCAN_MAX_PAGES {
        query.page = page;
        let tasks = backend.list_todos(Some(token), &query).await?;
        let exhausted = (tasks.len() as u32) < query.page_size;
        if let Some(task) = tasks.into_iter().find(|task| task.id == id) {
            return Ok(task);
        }
        if exhausted {
            break;
        }
    }
    Err(CliError::TaskNotFound(id.to_string()))
}

pub async fn handle_register(
    backend: &dyn TodoBackend,
    name: String,
    email: String,
    password: String,
) -> Result<(), CliError> {
    backend
        .register(&RegisterRequest { name, email: email.clone(), password })
        .await?;
    info!(%email, "registered");
    println!("Registered {}. Log in with `tdl login`.", email);
    Ok(())
}

pub async fn handle_login(
    backend: &dyn TodoBackend,
    session: &mut Session,
    email: String,
    password: String,
) -> Result<(), CliError> {
    session.login(backend, &LoginRequest { email, password }).await?;
    println!("Logged in.");
    Ok(())
}

pub fn handle_logout(session: &mut Session) -> Result<(), CliError> {
    session.invalidate()?;
    println!("Logged out.");
    Ok(())
}

pub async fn handle_list(backend: &dyn TodoBackend, session: &Session, query: ListQuery) -> Result<(), CliError> {
    let token = require_token(session)?;
    let mut list = TaskList::new(query);
    list.refresh(backend, Some(token)).await?;

    if list.tasks().is_empty() {
        println!("{}", EMPTY_MESSAGE);
    }
    for task in list.tasks() {
        println!("{}", format_task_line(task));
    }
    println!("-- {}", list.query());
    Ok(())
}

pub async fn handle_add(
    backend: &dyn TodoBackend,
    session: &Session,
    description: String,
    priority: u8,
    date: Option<String>,
) -> Result<(), CliError> {
    let token = require_token(session)?;
    let draft = TaskDraft {
        description,
        priority: priority_from_arg(priority),
        date: parse_optional_date(date)?,
    };

    let mut create = workflow::EditWorkflow::default();
    create.open_create();
    create.replace_draft(draft)?;
    let task = create.save(backend, Some(token)).await?;
    println!("Task created successfully (ID: {})", task.id);
    Ok(())
}

pub async fn handle_edit(
    backend: &dyn TodoBackend,
    session: &Session,
    id: String,
    description: Option<String>,
    priority: Option<u8>,
    date: Option<String>,
) -> Result<(), CliError> {
    let token = require_token(session)?;
    if description.is_none() && priority.is_none() && date.is_none() {
        return Err(CliError::NothingToEdit);
    }

    let task = find_task(backend, token, &id).await?;
    let mut edit = workflow::EditWorkflow::default();
    edit.open_edit(&task)?;

    let mut draft = TaskDraft::from_task(&task);
    if let Some(description) = description {
        draft.description = description;
    }
    if let Some(priority) = priority {
        draft.priority = priority_from_arg(priority);
    }
    if let Some(date) = parse_optional_date(date)? {
        draft.date = Some(date);
    }

    edit.replace_draft(draft)?;
    let saved = edit.save(backend, Some(token)).await?;
    println!("Task updated: {}", format_task_line(&saved));
    Ok(())
}

pub async fn handle_toggle(backend: &dyn TodoBackend, session: &Session, id: String) -> Result<(), CliError> {
    let token = require_token(session)?;
    let task = find_task(backend, token, &id).await?;
    let updated = backend
        .update_todo(Some(token), &task.id, &workflow::toggle_patch(&task))
        .await?;
    println!("{}", format_task_line(&updated));
    Ok(())
}

pub async fn handle_delete(backend: &dyn TodoBackend, session: &Session, id: String) -> Result<(), CliError> {
    let token = require_token(session)?;
    backend.delete_todo(Some(token), &id).await?;
    println!("Task {} deleted.", id);
    Ok(())
}

/// Build the list query from `list` arguments
pub fn list_query(
    search: String,
    completed: CompletedFilter,
    order_by: OrderBy,
    order_direction: OrderDirection,
    page: u32,
    page_size: u32,
) -> ListQuery {
    ListQuery {
        search,
        completed,
        order_by,
        order_direction,
        page: page.max(1),
        page_size: page_size.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskPatch;
    use crate::session::MemoryTokenStore;
    use crate::testing::FakeBackend;
    use chrono::NaiveDate;

    fn logged_in() -> Session {
        Session::open(Box::new(MemoryTokenStore::with_token(FakeBackend::TOKEN))).expect("session")
    }

    #[test]
    fn list_arguments_parse() {
        let cli = Cli::try_parse_from([
            "tdl", "list", "--completed", "true", "--order-by", "priority", "--order-direction", "desc", "--page", "2",
        ])
        .expect("parse");

        match cli.command {
            Some(Commands::List { completed, order_by, order_direction, page, page_size, .. }) => {
                assert_eq!(completed, CompletedFilter::Completed);
                assert_eq!(order_by, OrderBy::Priority);
                assert_eq!(order_direction, OrderDirection::Desc);
                assert_eq!(page, 2);
                assert_eq!(page_size, None);
            }
            _ => panic!("expected list command"),
        }
    }

    #[test]
    fn priority_outside_range_is_rejected() {
        assert!(Cli::try_parse_from(["tdl", "add", "x", "--priority", "4"]).is_err());
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from(["tdl", "logout", "--dev", "--api-url", "http://example.test"]).expect("parse");
        assert!(cli.dev);
        assert_eq!(cli.api_url.as_deref(), Some("http://example.test"));
    }

    #[test]
    fn task_line_shows_status_priority_and_date() {
        let line = format_task_line(&Task {
            id: "3".to_string(),
            description: "Buy milk".to_string(),
            priority: Priority::High,
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
            completed: true,
        });
        assert!(line.starts_with("[x]"));
        assert!(line.contains("High"));
        assert!(line.contains("2024-01-01"));
        assert!(line.ends_with("Buy milk"));
    }

    #[tokio::test]
    async fn commands_require_a_session() {
        let backend = FakeBackend::default();
        let session = Session::open(Box::new(MemoryTokenStore::default())).expect("session");

        let err = handle_delete(&backend, &session, "1".to_string()).await.expect_err("logged out");
        assert!(matches!(err, CliError::NotLoggedIn));
    }

    #[tokio::test]
    async fn edit_refuses_completed_tasks() {
        let backend = FakeBackend::default();
        let session = logged_in();
        let task = backend
            .create_todo(Some(FakeBackend::TOKEN), &TaskDraft {
                description: "Done already".to_string(),
                ..TaskDraft::default()
            })
            .await
            .expect("create");
        backend
            .update_todo(Some(FakeBackend::TOKEN), &task.id, &TaskPatch::completed(true))
            .await
            .expect("complete");

        let err = handle_edit(&backend, &session, task.id.clone(), Some("Changed".to_string()), None, None)
            .await
            .expect_err("locked");
        assert!(matches!(err, CliError::Workflow(WorkflowError::EditLocked)));
        assert_eq!(backend.tasks()[0].description, "Done already");
    }

    #[tokio::test]
    async fn toggle_flips_the_known_state() {
        let backend = FakeBackend::default();
        let session = logged_in();
        let task = backend
            .create_todo(Some(FakeBackend::TOKEN), &TaskDraft {
                description: "Flip me".to_string(),
                ..TaskDraft::default()
            })
            .await
            .expect("create");

        handle_toggle(&backend, &session, task.id.clone()).await.expect("toggle");
        assert!(backend.tasks()[0].completed);
        handle_toggle(&backend, &session, task.id).await.expect("toggle");
        assert!(!backend.tasks()[0].completed);
    }

    #[tokio::test]
    async fn add_rejects_bad_dates_before_sending() {
        let backend = FakeBackend::default();
        let session = logged_in();

        let err = handle_add(&backend, &session, "x".to_string(), 1, Some("01/02/2024".to_string()))
            .await
            .expect_err("bad date");
        assert!(matches!(err, CliError::DateParseError(_)));
        assert!(backend.tasks().is_empty());
    }
}
