use serde::{Deserialize, Serialize};

/// Request body for creating or updating a task.
///
/// Title and description are collected and trimmed by the form collaborator;
/// by the time a draft reaches the wire both fields are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}
