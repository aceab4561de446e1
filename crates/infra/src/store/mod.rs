//! Store contracts: the identity store and the task store.
//!
//! Every listing goes through [`TaskFilter`], which carries the visibility
//! clause alongside the optional exact-match filters. Result order is pinned
//! to `created_at ASC, id ASC` in both implementations so pagination is
//! reproducible across backends.

use async_trait::async_trait;
use thiserror::Error;

use taskdesk_auth::Requester;
use taskdesk_core::{TaskId, UserId};
use taskdesk_tasks::{ListTasksQuery, Task, TaskPriority, TaskStatus};
use taskdesk_users::User;

pub mod in_memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// The visibility clause plus optional exact-match filters for a task listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskFilter {
    /// `Some(id)` restricts rows to `assigned_to == id OR created_by == id`.
    /// `None` means unrestricted (admin).
    pub visible_to: Option<UserId>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskFilter {
    /// Build the filter for a requester: admins see all tasks unconditionally,
    /// everyone else is restricted to tasks they are assigned to or created.
    pub fn for_requester(requester: &Requester, query: &ListTasksQuery) -> Self {
        Self {
            visible_to: (!requester.is_admin()).then_some(requester.id),
            status: query.status,
            priority: query.priority,
        }
    }

    /// Row predicate used by the in-memory store; the Postgres store encodes
    /// the same conjunction as SQL.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(id) = self.visible_to {
            if task.assigned_to != id && task.created_by != id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        true
    }
}

/// Persistence contract for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    /// Insert or replace by id.
    async fn save(&self, user: User) -> Result<User, StoreError>;
    /// Returns the number of deleted rows (0 when absent).
    async fn delete(&self, id: UserId) -> Result<u64, StoreError>;
}

/// Persistence contract for task records.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError>;
    /// Returns one page of matching rows plus the total matching count.
    async fn query(
        &self,
        filter: TaskFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Task>, u64), StoreError>;
    /// Insert or replace by id.
    async fn save(&self, task: Task) -> Result<Task, StoreError>;
    async fn delete(&self, id: TaskId) -> Result<(), StoreError>;
}
