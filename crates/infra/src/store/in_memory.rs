use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use taskdesk_core::{TaskId, UserId};
use taskdesk_tasks::Task;
use taskdesk_users::User;

use super::{StoreError, TaskFilter, TaskStore, UserStore};

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

/// In-memory identity store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(all)
    }

    async fn save(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<u64, StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        Ok(users.remove(&id).map(|_| 1).unwrap_or(0))
    }
}

/// In-memory task store.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.read().map_err(|_| poisoned())?;
        Ok(tasks.get(&id).cloned())
    }

    async fn query(
        &self,
        filter: TaskFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Task>, u64), StoreError> {
        let tasks = self.tasks.read().map_err(|_| poisoned())?;

        let mut matching: Vec<Task> = tasks.values().filter(|t| filter.matches(t)).cloned().collect();
        // Pinned order: created_at ASC, id ASC.
        matching.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        let total = matching.len() as u64;
        let page: Vec<Task> = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok((page, total))
    }

    async fn save(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().map_err(|_| poisoned())?;
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().map_err(|_| poisoned())?;
        tasks.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use taskdesk_auth::{Requester, Role};
    use taskdesk_tasks::{ListTasksQuery, TaskPriority, TaskStatus};

    fn task_at(seconds: i64, assigned_to: UserId, created_by: UserId) -> Task {
        let at = Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap();
        Task {
            id: TaskId::new(),
            title: format!("task-{seconds}"),
            description: "test".to_string(),
            assigned_to,
            created_by,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            completed_at: None,
            created_at: at,
            updated_at: at,
        }
    }

    async fn seed(store: &InMemoryTaskStore, tasks: Vec<Task>) {
        for t in tasks {
            store.save(t).await.unwrap();
        }
    }

    #[tokio::test]
    async fn visibility_clause_restricts_non_admins() {
        let store = InMemoryTaskStore::new();
        let me = UserId::new();
        let other = UserId::new();

        seed(
            &store,
            vec![
                task_at(1, me, other),    // assigned to me
                task_at(2, other, me),    // created by me
                task_at(3, other, other), // unrelated
            ],
        )
        .await;

        let requester = Requester::new(me, Role::User);
        let filter = TaskFilter::for_requester(&requester, &ListTasksQuery::default());
        let (rows, total) = store.query(filter, 0, 10).await.unwrap();

        assert_eq!(total, 2);
        assert!(rows.iter().all(|t| t.assigned_to == me || t.created_by == me));

        let admin = Requester::new(UserId::new(), Role::Admin);
        let filter = TaskFilter::for_requester(&admin, &ListTasksQuery::default());
        let (_, total) = store.query(filter, 0, 10).await.unwrap();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn status_and_priority_filters_are_conjunctions() {
        let store = InMemoryTaskStore::new();
        let me = UserId::new();

        let mut a = task_at(1, me, me);
        a.status = TaskStatus::Completed;
        a.priority = TaskPriority::High;
        let mut b = task_at(2, me, me);
        b.status = TaskStatus::Completed;
        let c = task_at(3, me, me);
        seed(&store, vec![a, b, c]).await;

        let filter = TaskFilter {
            visible_to: Some(me),
            status: Some(TaskStatus::Completed),
            priority: Some(TaskPriority::High),
        };
        let (rows, total) = store.query(filter, 0, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].priority, TaskPriority::High);
    }

    #[tokio::test]
    async fn pagination_of_twenty_three_rows() {
        let store = InMemoryTaskStore::new();
        let me = UserId::new();
        seed(&store, (0..23).map(|i| task_at(i, me, me)).collect()).await;

        let filter = TaskFilter {
            visible_to: Some(me),
            ..Default::default()
        };

        let (rows, total) = store.query(filter, 0, 10).await.unwrap();
        assert_eq!((rows.len(), total), (10, 23));

        let (rows, total) = store.query(filter, 20, 10).await.unwrap();
        assert_eq!((rows.len(), total), (3, 23));

        // Past the end: empty rows, correct total, no error.
        let (rows, total) = store.query(filter, 30, 10).await.unwrap();
        assert_eq!((rows.len(), total), (0, 23));
    }

    #[tokio::test]
    async fn rows_come_back_in_creation_order() {
        let store = InMemoryTaskStore::new();
        let me = UserId::new();
        // Insert out of order on purpose.
        seed(&store, vec![task_at(5, me, me), task_at(1, me, me), task_at(3, me, me)]).await;

        let filter = TaskFilter {
            visible_to: Some(me),
            ..Default::default()
        };
        let (rows, _) = store.query(filter, 0, 10).await.unwrap();
        let titles: Vec<&str> = rows.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["task-1", "task-3", "task-5"]);
    }

    #[tokio::test]
    async fn user_store_crud_round_trip() {
        let store = InMemoryUserStore::new();
        let user = User::create(
            taskdesk_users::NewUser {
                email: "a@example.com".to_string(),
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                role: Role::User,
                password_hash: "hash".to_string(),
            },
            Utc::now(),
        );
        let id = user.id;

        store.save(user).await.unwrap();
        assert!(store.find_by_id(id).await.unwrap().is_some());
        assert!(store.find_by_email("a@example.com").await.unwrap().is_some());
        assert!(store.find_by_email("A@example.com").await.unwrap().is_none());

        assert_eq!(store.delete(id).await.unwrap(), 1);
        assert_eq!(store.delete(id).await.unwrap(), 0);
        assert!(store.find_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_replaces_existing_task() {
        let store = InMemoryTaskStore::new();
        let me = UserId::new();
        let mut task = task_at(1, me, me);
        let id = task.id;
        store.save(task.clone()).await.unwrap();

        task.apply_update(
            taskdesk_tasks::TaskUpdate {
                title: Some("renamed".to_string()),
                ..Default::default()
            },
            task.created_at + Duration::minutes(1),
        );
        store.save(task).await.unwrap();

        let found = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.title, "renamed");
    }
}
