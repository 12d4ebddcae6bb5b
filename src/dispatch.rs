//! Runs backend calls on the tokio runtime and hands results back to the
//! UI thread, which drains them once per tick.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::api::{ApiError, TodoBackend};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, Task, TaskPatch};
use crate::task_list::FetchTicket;
use crate::workflow::SaveRequest;

#[derive(Debug)]
pub enum Completion {
    Listed { seq: u64, result: Result<Vec<Task>, ApiError> },
    Saved(Result<Task, ApiError>),
    Toggled { id: String, result: Result<Task, ApiError> },
    Deleted { id: String, result: Result<(), ApiError> },
    LoggedIn(Result<LoginResponse, ApiError>),
    Registered(Result<serde_json::Value, ApiError>),
}

pub struct Dispatcher {
    handle: Handle,
    backend: Arc<dyn TodoBackend>,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl Dispatcher {
    pub fn new(handle: Handle, backend: Arc<dyn TodoBackend>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            handle,
            backend,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Requests spawned but not yet drained
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn fetch(&mut self, ticket: FetchTicket, token: Option<String>) {
        self.spawn(move |backend| async move {
            let result = backend.list_todos(token.as_deref(), &ticket.query).await;
            Completion::Listed {
                seq: ticket.seq,
                result,
            }
        });
    }

    pub fn save(&mut self, request: SaveRequest, token: Option<String>) {
        self.spawn(move |backend| async move {
            Completion::Saved(request.send(backend.as_ref(), token.as_deref()).await)
        });
    }

    pub fn toggle(&mut self, id: String, patch: TaskPatch, token: Option<String>) {
        self.spawn(move |backend| async move {
            let result = backend.update_todo(token.as_deref(), &id, &patch).await;
            Completion::Toggled { id, result }
        });
    }

    pub fn delete(&mut self, id: String, token: Option<String>) {
        self.spawn(move |backend| async move {
            let result = backend.delete_todo(token.as_deref(), &id).await;
            Completion::Deleted { id, result }
        });
    }

    pub fn login(&mut self, request: LoginRequest) {
        self.spawn(move |backend| async move { Completion::LoggedIn(backend.login(&request).await) });
    }

    pub fn register(&mut self, request: RegisterRequest) {
        self.spawn(move |backend| async move { Completion::Registered(backend.register(&request).await) });
    }

    /// Collect every completion that has arrived, without blocking
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            completions.push(completion);
        }
        self.in_flight = self.in_flight.saturating_sub(completions.len());
        completions
    }

    fn spawn<F, Fut>(&mut self, call: F)
    where
        F: FnOnce(Arc<dyn TodoBackend>) -> Fut,
        Fut: std::future::Future<Output = Completion> + Send + 'static,
    {
        let tx = self.tx.clone();
        let future = call(Arc::clone(&self.backend));
        self.in_flight += 1;
        self.handle.spawn(async move {
            let completion = future.await;
            if tx.send(completion).is_err() {
                debug!("completion dropped, receiver closed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDraft;
    use crate::query::{OrderDirection, QueryChange};
    use crate::task_list::{ApplyOutcome, TaskList};
    use crate::testing::FakeBackend;
    use std::time::Duration;

    async fn wait_for(dispatcher: &mut Dispatcher, count: usize) -> Vec<Completion> {
        let mut completions = Vec::new();
        for _ in 0..200 {
            completions.extend(dispatcher.drain());
            if completions.len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        completions
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn completions_arrive_through_drain() {
        let backend = Arc::new(FakeBackend::default());
        let mut dispatcher = Dispatcher::new(Handle::current(), backend.clone());
        let token = Some(FakeBackend::TOKEN.to_string());

        dispatcher.save(
            SaveRequest::Create(TaskDraft {
                description: "Buy milk".to_string(),
                ..TaskDraft::default()
            }),
            token.clone(),
        );
        assert_eq!(dispatcher.in_flight(), 1);

        let completions = wait_for(&mut dispatcher, 1).await;
        assert!(matches!(completions.as_slice(), [Completion::Saved(Ok(task))] if task.description == "Buy milk"));
        assert_eq!(dispatcher.in_flight(), 0);
        assert_eq!(backend.tasks().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn only_the_latest_list_response_is_applied() {
        let backend = Arc::new(FakeBackend::default());
        let mut dispatcher = Dispatcher::new(Handle::current(), backend.clone());
        let token = Some(FakeBackend::TOKEN.to_string());
        let mut list = TaskList::default();

        dispatcher.fetch(list.refetch(), token.clone());
        let newest = list
            .set_parameter(QueryChange::OrderDirection(OrderDirection::Desc))
            .expect("ticket");
        dispatcher.fetch(newest.clone(), token);

        let mut applied = Vec::new();
        for completion in wait_for(&mut dispatcher, 2).await {
            if let Completion::Listed { seq, result } = completion {
                if list.apply(seq, result).ok() == Some(ApplyOutcome::Applied) {
                    applied.push(seq);
                }
            }
        }

        assert_eq!(applied, vec![newest.seq]);
        assert_eq!(backend.list_calls().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn delete_of_unknown_id_reports_not_found() {
        let backend = Arc::new(FakeBackend::default());
        let mut dispatcher = Dispatcher::new(Handle::current(), backend);

        dispatcher.delete("missing".to_string(), Some(FakeBackend::TOKEN.to_string()));

        let completions = wait_for(&mut dispatcher, 1).await;
        assert!(matches!(
            completions.as_slice(),
            [Completion::Deleted { id, result: Err(err) }] if id == "missing" && err.status() == Some(404)
        ));
    }
}
