use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskdesk_core::{TaskId, UserId};

/// Task lifecycle status.
///
/// Transitions are not restricted: any status may follow any other. The one
/// side effect is that entering `Completed` stamps `completed_at` (see
/// [`Task::apply_update`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

impl core::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(TaskStatus::Todo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "COMPLETED" => Ok(TaskStatus::Completed),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

impl core::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(TaskPriority::Low),
            "MEDIUM" => Ok(TaskPriority::Medium),
            "HIGH" => Ok(TaskPriority::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// A task record.
///
/// `assigned_to` and `created_by` are non-owning references into the identity
/// store; referential integrity is the store's concern, not this type's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub assigned_to: UserId,
    pub created_by: UserId,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task. `created_by` always comes from the authenticated
/// requester, never from client input.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub assigned_to: UserId,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update: `None` keeps the existing value. `created_by` is absent by
/// design — the creator reference is immutable.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<UserId>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn create(new: NewTask, created_by: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::new(),
            title: new.title,
            description: new.description,
            assigned_to: new.assigned_to,
            created_by,
            status: new.status.unwrap_or_default(),
            priority: new.priority.unwrap_or_default(),
            due_date: new.due_date,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the provided fields onto this record.
    ///
    /// The first transition into `Completed` stamps `completed_at` with `now`.
    /// A later transition away from `Completed` does NOT clear it — carried
    /// over from the original behavior and pinned by tests.
    pub fn apply_update(&mut self, update: TaskUpdate, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(assigned_to) = update.assigned_to {
            self.assigned_to = assigned_to;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(completed_at) = update.completed_at {
            self.completed_at = Some(completed_at);
        }
        if let Some(status) = update.status {
            self.status = status;
            if status == TaskStatus::Completed && self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        }
        self.updated_at = now;
    }
}
