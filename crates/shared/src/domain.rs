use serde::{Deserialize, Serialize};

/// Identifier assigned by the remote API. Never generated client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

/// One unit of work as the remote API represents it.
///
/// `completed` is authoritative on the server; the client never flips it
/// locally, it only drops completed tasks from its visible list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

impl Task {
    pub fn is_active(&self) -> bool {
        !self.completed
    }
}
