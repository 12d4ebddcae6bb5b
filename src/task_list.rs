//! Client-side task list state.
//!
//! The list is a cache of the last successful `GET /todos` for the current
//! query. Every parameter change or mutation issues a new fetch ticket; only
//! the response for the newest ticket is applied.

use tracing::{debug, warn};

use crate::api::{ApiError, TodoBackend};
use crate::models::Task;
use crate::query::{ListQuery, QueryChange};

pub const EMPTY_MESSAGE: &str = "No tasks found.";

/// A list fetch to perform with the query captured at issue time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: ListQuery,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Stale,
}

/// What the list area should show
#[derive(Debug, PartialEq, Eq)]
pub enum ListView<'a> {
    Loading,
    Failed(&'a str),
    Empty,
    Tasks(&'a [Task]),
}

#[derive(Debug, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
    query: ListQuery,
    status: ListStatus,
    issued: u64,
}

impl TaskList {
    pub fn new(query: ListQuery) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.issued
    }

    /// Change one parameter. No ticket is issued when the value is unchanged.
    pub fn set_parameter(&mut self, change: QueryChange) -> Option<FetchTicket> {
        if self.query.apply(change) {
            Some(self.refetch())
        } else {
            None
        }
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        let page = self.query.page.saturating_add(1);
        self.set_parameter(QueryChange::Page(page))
    }

    pub fn prev_page(&mut self) -> Option<FetchTicket> {
        let page = self.query.page.saturating_sub(1);
        self.set_parameter(QueryChange::Page(page))
    }

    /// Re-issue the list query with the current parameters
    pub fn refetch(&mut self) -> FetchTicket {
        self.issued += 1;
        self.status = ListStatus::Loading;
        debug!(seq = self.issued, query = %self.query, "list fetch issued");
        FetchTicket {
            seq: self.issued,
            query: self.query.clone(),
        }
    }

    /// Apply the response for a ticket.
    ///
    /// Responses for superseded tickets are dropped. A failed fetch empties the
    /// list and hands the error back for display.
    pub fn apply(&mut self, seq: u64, result: Result<Vec<Task>, ApiError>) -> Result<ApplyOutcome, ApiError> {
        if !self.is_latest(seq) {
            debug!(seq, latest = self.issued, "discarding stale list response");
            return Ok(ApplyOutcome::Stale);
        }

        match result {
            Ok(tasks) => {
                debug!(seq, count = tasks.len(), "list refreshed");
                self.tasks = tasks;
                self.status = ListStatus::Ready;
                Ok(ApplyOutcome::Applied)
            }
            Err(err) => {
                warn!(seq, error = %err, "list fetch failed");
                self.tasks.clear();
                self.status = ListStatus::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Drop held tasks and start over with `query`. Tickets issued before the
    /// reset become stale; the counter keeps counting.
    pub fn reset(&mut self, query: ListQuery) {
        self.tasks.clear();
        self.query = query;
        self.status = ListStatus::Idle;
        self.issued += 1;
    }

    /// Fetch and apply in one step
    pub async fn refresh(&mut self, backend: &dyn TodoBackend, token: Option<&str>) -> Result<ApplyOutcome, ApiError> {
        let ticket = self.refetch();
        let result = backend.list_todos(token, &ticket.query).await;
        self.apply(ticket.seq, result)
    }

    /// Held tasks stay visible while a refetch is in flight
    pub fn view(&self) -> ListView<'_> {
        match &self.status {
            ListStatus::Failed(message) => ListView::Failed(message.as_str()),
            ListStatus::Idle | ListStatus::Loading if self.tasks.is_empty() => ListView::Loading,
            _ if self.tasks.is_empty() => ListView::Empty,
            _ => ListView::Tasks(&self.tasks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TaskDraft, TaskPatch};
    use crate::query::{CompletedFilter, OrderBy, OrderDirection};
    use crate::testing::FakeBackend;
    use chrono::NaiveDate;

    const TOKEN: Option<&str> = Some(FakeBackend::TOKEN);

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            description: format!("task {}", id),
            priority: Priority::Low,
            date: None,
            completed: false,
        }
    }

    #[test]
    fn one_change_issues_one_ticket_with_all_parameters() {
        let mut list = TaskList::default();
        list.set_parameter(QueryChange::OrderBy(OrderBy::Priority));

        let ticket = list
            .set_parameter(QueryChange::Completed(CompletedFilter::Completed))
            .expect("ticket");

        assert_eq!(ticket.seq, 2);
        assert_eq!(ticket.query.order_by, OrderBy::Priority);
        assert_eq!(ticket.query.completed, CompletedFilter::Completed);
        assert_eq!(ticket.query.to_pairs().len(), 5);
        assert!(list.set_parameter(QueryChange::Completed(CompletedFilter::Completed)).is_none());
    }

    #[test]
    fn stale_response_never_overwrites_newer_one() {
        let mut list = TaskList::default();
        let first = list.refetch();
        let second = list.set_parameter(QueryChange::OrderDirection(OrderDirection::Desc)).expect("ticket");

        assert_eq!(list.apply(second.seq, Ok(vec![task("new")])).ok(), Some(ApplyOutcome::Applied));
        assert_eq!(list.apply(first.seq, Ok(vec![task("old")])).ok(), Some(ApplyOutcome::Stale));
        assert_eq!(list.tasks()[0].id, "new");
    }

    #[test]
    fn stale_failure_is_ignored_too() {
        let mut list = TaskList::default();
        let first = list.refetch();
        let second = list.refetch();
        list.apply(second.seq, Ok(vec![task("1")])).expect("apply");

        let outcome = list.apply(first.seq, Err(ApiError::Decode("boom".to_string())));
        assert_eq!(outcome.ok(), Some(ApplyOutcome::Stale));
        assert_eq!(list.tasks().len(), 1);
    }

    #[test]
    fn reset_keeps_earlier_tickets_stale() {
        let mut list = TaskList::default();
        let before = list.refetch();
        list.apply(before.seq, Ok(vec![task("1")])).expect("apply");
        let in_flight = list.refetch();

        list.reset(ListQuery::with_page_size(5));
        assert!(list.tasks().is_empty());
        assert_eq!(list.query().page_size, 5);

        let after = list.refetch();
        assert!(after.seq > in_flight.seq);
        assert_eq!(list.apply(in_flight.seq, Ok(vec![task("old")])).ok(), Some(ApplyOutcome::Stale));
        assert_eq!(list.apply(after.seq, Ok(vec![task("new")])).ok(), Some(ApplyOutcome::Applied));
        assert_eq!(list.tasks()[0].id, "new");
    }

    #[test]
    fn failure_empties_the_list() {
        let mut list = TaskList::default();
        let ticket = list.refetch();
        list.apply(ticket.seq, Ok(vec![task("1")])).expect("apply");

        let ticket = list.refetch();
        let err = list
            .apply(ticket.seq, Err(ApiError::Status { status: 500, message: "down".to_string() }))
            .expect_err("error is returned");

        assert_eq!(err.status(), Some(500));
        assert!(list.tasks().is_empty());
        assert!(matches!(list.view(), ListView::Failed(message) if message.contains("down")));
    }

    #[test]
    fn view_distinguishes_loading_empty_and_tasks() {
        let mut list = TaskList::default();
        assert_eq!(list.view(), ListView::Loading);

        let ticket = list.refetch();
        list.apply(ticket.seq, Ok(Vec::new())).expect("apply");
        assert_eq!(list.view(), ListView::Empty);

        let ticket = list.refetch();
        list.apply(ticket.seq, Ok(vec![task("1")])).expect("apply");
        assert!(matches!(list.view(), ListView::Tasks(tasks) if tasks.len() == 1));
    }

    #[test]
    fn paging_stays_at_or_above_one() {
        let mut list = TaskList::default();
        assert!(list.prev_page().is_none());
        let ticket = list.next_page().expect("ticket");
        assert_eq!(ticket.query.page, 2);
        assert_eq!(list.prev_page().map(|t| t.query.page), Some(1));
    }

    #[tokio::test]
    async fn created_task_is_listed_exactly_once() {
        let backend = FakeBackend::default();
        backend
            .create_todo(TOKEN, &TaskDraft {
                description: "Write report".to_string(),
                priority: Priority::High,
                date: None,
            })
            .await
            .expect("create");

        let mut list = TaskList::default();
        list.set_parameter(QueryChange::Search("report".to_string()));
        list.refresh(&backend, TOKEN).await.expect("refresh");

        let matching = list.tasks().iter().filter(|t| t.description == "Write report").count();
        assert_eq!(matching, 1);
    }

    #[tokio::test]
    async fn deleting_unknown_id_leaves_list_unchanged() {
        let backend = FakeBackend::default();
        let created = backend
            .create_todo(TOKEN, &TaskDraft {
                description: "Keep me".to_string(),
                ..TaskDraft::default()
            })
            .await
            .expect("create");

        let mut list = TaskList::default();
        list.refresh(&backend, TOKEN).await.expect("refresh");
        let before = list.tasks().to_vec();

        let err = backend.delete_todo(TOKEN, "does-not-exist").await.expect_err("404");
        assert_eq!(err.status(), Some(404));
        assert_eq!(list.tasks(), before.as_slice());

        backend.delete_todo(TOKEN, &created.id).await.expect("delete");
        list.refresh(&backend, TOKEN).await.expect("refresh");
        assert!(list.find(&created.id).is_none());
    }

    #[tokio::test]
    async fn buy_milk_follows_the_completed_filter() {
        let backend = FakeBackend::default();
        let created = backend
            .create_todo(TOKEN, &TaskDraft {
                description: "Buy milk".to_string(),
                priority: Priority::Low,
                date: NaiveDate::from_ymd_opt(2024, 1, 1),
            })
            .await
            .expect("create");

        let mut list = TaskList::default();
        list.refresh(&backend, TOKEN).await.expect("refresh");
        assert_eq!(list.tasks()[0].date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(!list.tasks()[0].completed);

        backend
            .update_todo(TOKEN, &created.id, &TaskPatch::completed(true))
            .await
            .expect("toggle");

        list.set_parameter(QueryChange::Completed(CompletedFilter::Pending));
        list.refresh(&backend, TOKEN).await.expect("refresh");
        assert!(list.find(&created.id).is_none());

        list.set_parameter(QueryChange::Completed(CompletedFilter::Completed));
        list.refresh(&backend, TOKEN).await.expect("refresh");
        assert!(list.find(&created.id).is_some_and(|t| t.completed));
    }
}
