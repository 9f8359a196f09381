use reqwest::{Client, StatusCode};
use shared::{
    domain::{Task, TaskId},
    protocol::TaskDraft,
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod theme;

mod preference_store;
pub use preference_store::DurablePreferenceStore;

/// The visible list never holds more than this many tasks.
pub const RECENT_TASK_LIMIT: usize = 5;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOperation {
    Load,
    Create,
    Update,
    Complete,
    Delete,
}

impl TaskOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOperation::Load => "load",
            TaskOperation::Create => "create",
            TaskOperation::Update => "update",
            TaskOperation::Complete => "complete",
            TaskOperation::Delete => "delete",
        }
    }
}

/// Failure categories for remote task operations.
///
/// Both variants are recoverable: the controller leaves its state untouched,
/// reports the failure, and waits for the user to retry.
#[derive(Debug, Error)]
pub enum TaskSyncError {
    #[error("request failed before a response arrived: {0}")]
    Network(#[source] reqwest::Error),
    #[error("server rejected the request with status {status}")]
    Rejected { status: StatusCode },
}

/// Notifications for UI collaborators (cards, toasts, forms).
#[derive(Debug, Clone)]
pub enum TaskEvent {
    TasksReplaced(Vec<Task>),
    TaskCreated(Task),
    TaskUpdated(Task),
    TaskCompleted(TaskId),
    TaskDeleted(TaskId),
    OperationFailed {
        operation: TaskOperation,
        task_id: Option<TaskId>,
        message: String,
    },
}

/// Owns the visible task list and reconciles it with the remote API.
///
/// All mutation happens on a single logical thread of execution; operations
/// interleave only at await points and the state lock is never held across a
/// request. Overlapping requests apply their effects in resolution order.
pub struct TaskStoreClient {
    http: Client,
    base_url: String,
    inner: Mutex<TaskStoreState>,
    events: broadcast::Sender<TaskEvent>,
}

struct TaskStoreState {
    tasks: Vec<Task>,
}

impl TaskStoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            http: Client::new(),
            base_url: normalize_base_url(base_url.into()),
            inner: Mutex::new(TaskStoreState { tasks: Vec::new() }),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the visible task list. Consumers read through this
    /// accessor; the backing state is never handed out mutably.
    pub async fn visible_tasks(&self) -> Vec<Task> {
        self.inner.lock().await.tasks.clone()
    }

    /// Fetches the recent-tasks collection and replaces the visible list
    /// with the first five active entries, in server order.
    ///
    /// Never propagates an error: on any failure the visible list becomes
    /// empty and the failure is reported through the event stream and the
    /// log. Called once at controller start; not retried automatically.
    pub async fn load(&self) {
        match self.fetch_recent().await {
            Ok(tasks) => {
                let visible: Vec<Task> = tasks
                    .into_iter()
                    .filter(Task::is_active)
                    .take(RECENT_TASK_LIMIT)
                    .collect();
                self.inner.lock().await.tasks = visible.clone();
                info!(count = visible.len(), "task list loaded");
                let _ = self.events.send(TaskEvent::TasksReplaced(visible));
            }
            Err(err) => {
                self.inner.lock().await.tasks.clear();
                self.report_failure(TaskOperation::Load, None, &err);
            }
        }
    }

    /// Sends a creation request and, on success, prepends the server-assigned
    /// task to the visible list (evicting the oldest entry over capacity).
    ///
    /// Returns the created task so the form collaborator can dismiss itself;
    /// on failure the list is untouched and the form stays open.
    pub async fn create(&self, draft: TaskDraft) -> Result<Task, TaskSyncError> {
        let result = async {
            let response = self
                .http
                .post(format!("{}/api/tasks", self.base_url))
                .json(&draft)
                .send()
                .await
                .map_err(TaskSyncError::Network)?;
            check_status(response)?
                .json::<Task>()
                .await
                .map_err(TaskSyncError::Network)
        }
        .await;

        match result {
            Ok(created) => {
                if created.is_active() {
                    let mut guard = self.inner.lock().await;
                    guard.tasks.insert(0, created.clone());
                    guard.tasks.truncate(RECENT_TASK_LIMIT);
                }
                info!(task_id = created.id.0, "task created");
                let _ = self.events.send(TaskEvent::TaskCreated(created.clone()));
                Ok(created)
            }
            Err(err) => {
                self.report_failure(TaskOperation::Create, None, &err);
                Err(err)
            }
        }
    }

    /// Sends an update for `task.id` and, on success, replaces the matching
    /// visible entry with the task the server echoed back.
    ///
    /// The echo is authoritative, not the submitted value; the server may
    /// normalize fields. A task that is no longer visible is left alone.
    pub async fn update(&self, task: Task) -> Result<Task, TaskSyncError> {
        let draft = TaskDraft::new(task.title.clone(), task.description.clone());
        let result = async {
            let response = self
                .http
                .put(format!("{}/api/tasks/{}", self.base_url, task.id.0))
                .json(&draft)
                .send()
                .await
                .map_err(TaskSyncError::Network)?;
            check_status(response)?
                .json::<Task>()
                .await
                .map_err(TaskSyncError::Network)
        }
        .await;

        match result {
            Ok(echoed) => {
                {
                    let mut guard = self.inner.lock().await;
                    if let Some(slot) = guard.tasks.iter_mut().find(|t| t.id == echoed.id) {
                        *slot = echoed.clone();
                    }
                }
                info!(task_id = echoed.id.0, "task updated");
                let _ = self.events.send(TaskEvent::TaskUpdated(echoed.clone()));
                Ok(echoed)
            }
            Err(err) => {
                self.report_failure(TaskOperation::Update, Some(task.id), &err);
                Err(err)
            }
        }
    }

    /// Marks a task completed on the server and, on success, removes it from
    /// the visible list. The freed slot is not backfilled from the server.
    pub async fn complete(&self, id: TaskId) -> Result<(), TaskSyncError> {
        let result = async {
            let response = self
                .http
                .put(format!("{}/api/tasks/{}/complete", self.base_url, id.0))
                .send()
                .await
                .map_err(TaskSyncError::Network)?;
            check_status(response).map(drop)
        }
        .await;

        match result {
            Ok(()) => {
                self.remove_task(id).await;
                info!(task_id = id.0, "task completed");
                let _ = self.events.send(TaskEvent::TaskCompleted(id));
                Ok(())
            }
            Err(err) => {
                self.report_failure(TaskOperation::Complete, Some(id), &err);
                Err(err)
            }
        }
    }

    /// Deletes a task on the server and, on success, removes it from the
    /// visible list. Local removal reflects the delegation to the API; the
    /// client itself never destroys a task.
    pub async fn delete(&self, id: TaskId) -> Result<(), TaskSyncError> {
        let result = async {
            let response = self
                .http
                .delete(format!("{}/api/tasks/{}", self.base_url, id.0))
                .send()
                .await
                .map_err(TaskSyncError::Network)?;
            check_status(response).map(drop)
        }
        .await;

        match result {
            Ok(()) => {
                self.remove_task(id).await;
                info!(task_id = id.0, "task deleted");
                let _ = self.events.send(TaskEvent::TaskDeleted(id));
                Ok(())
            }
            Err(err) => {
                self.report_failure(TaskOperation::Delete, Some(id), &err);
                Err(err)
            }
        }
    }

    async fn fetch_recent(&self) -> Result<Vec<Task>, TaskSyncError> {
        let response = self
            .http
            .get(format!("{}/api/tasks/recent", self.base_url))
            .send()
            .await
            .map_err(TaskSyncError::Network)?;
        check_status(response)?
            .json::<Vec<Task>>()
            .await
            .map_err(TaskSyncError::Network)
    }

    async fn remove_task(&self, id: TaskId) {
        self.inner.lock().await.tasks.retain(|t| t.id != id);
    }

    fn report_failure(&self, operation: TaskOperation, task_id: Option<TaskId>, err: &TaskSyncError) {
        warn!(
            operation = operation.as_str(),
            task_id = ?task_id.map(|id| id.0),
            error = %err,
            "task operation failed"
        );
        let _ = self.events.send(TaskEvent::OperationFailed {
            operation,
            task_id,
            message: err.to_string(),
        });
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TaskSyncError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(TaskSyncError::Rejected { status })
    }
}

fn normalize_base_url(raw: String) -> String {
    raw.trim_end_matches('/').to_string()
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
