//! Postgres-backed stores.
//!
//! Enums are stored as their wire names (`TODO`, `HIGH`, `ADMIN`, ...) in
//! text columns; ids are `uuid` columns. Listing queries encode the same
//! visibility + filter conjunction as the in-memory store and share its
//! pinned order (`created_at ASC, id ASC`).

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use taskdesk_auth::Role;
use taskdesk_core::{TaskId, UserId};
use taskdesk_tasks::{Task, TaskPriority, TaskStatus};
use taskdesk_users::User;

use super::{StoreError, TaskFilter, TaskStore, UserStore};

/// Minimal schema bootstrap for dev deployments; production schemas are
/// expected to be managed by migrations.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            role TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(backend)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id UUID PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            assigned_to UUID NOT NULL REFERENCES users (id),
            created_by UUID NOT NULL REFERENCES users (id),
            status TEXT NOT NULL,
            priority TEXT NOT NULL,
            due_date TIMESTAMPTZ,
            completed_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(backend)?;

    Ok(())
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn parse_col<T: core::str::FromStr>(raw: &str, column: &str) -> Result<T, StoreError>
where
    T::Err: core::fmt::Display,
{
    raw.parse()
        .map_err(|e| StoreError::Backend(format!("bad {column} value: {e}")))
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: UserId::from_uuid(row.get("id")),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        role: parse_col::<Role>(row.get("role"), "role")?,
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn task_from_row(row: &PgRow) -> Result<Task, StoreError> {
    Ok(Task {
        id: TaskId::from_uuid(row.get("id")),
        title: row.get("title"),
        description: row.get("description"),
        assigned_to: UserId::from_uuid(row.get("assigned_to")),
        created_by: UserId::from_uuid(row.get("created_by")),
        status: parse_col::<TaskStatus>(row.get("status"), "status")?,
        priority: parse_col::<TaskPriority>(row.get("priority"), "priority")?,
        due_date: row.get("due_date"),
        completed_at: row.get("completed_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Postgres-backed identity store.
pub struct PgUserStore {
    pool: Arc<PgPool>,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(backend)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(backend)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at ASC, id ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(backend)?;

        rows.iter().map(user_from_row).collect()
    }

    async fn save(&self, user: User) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, first_name, last_name, role, password_hash,
                               is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                role = EXCLUDED.role,
                password_hash = EXCLUDED.password_hash,
                is_active = EXCLUDED.is_active,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(backend)?;

        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected())
    }
}

/// Postgres-backed task store.
pub struct PgTaskStore {
    pool: Arc<PgPool>,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Render the WHERE clause for `filter`, returning the SQL fragment and
    /// the index of the next free bind placeholder.
    fn where_clause(filter: &TaskFilter) -> (String, usize) {
        let mut conditions: Vec<String> = Vec::new();
        let mut next = 1;

        if filter.visible_to.is_some() {
            conditions.push(format!("(assigned_to = ${next} OR created_by = ${next})"));
            next += 1;
        }
        if filter.status.is_some() {
            conditions.push(format!("status = ${next}"));
            next += 1;
        }
        if filter.priority.is_some() {
            conditions.push(format!("priority = ${next}"));
            next += 1;
        }

        let sql = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        (sql, next)
    }

    fn bind_filter<'q>(
        mut query: Query<'q, Postgres, PgArguments>,
        filter: &TaskFilter,
    ) -> Query<'q, Postgres, PgArguments> {
        if let Some(id) = filter.visible_to {
            query = query.bind(*id.as_uuid());
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(priority) = filter.priority {
            query = query.bind(priority.as_str());
        }
        query
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(backend)?;

        row.as_ref().map(task_from_row).transpose()
    }

    async fn query(
        &self,
        filter: TaskFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Task>, u64), StoreError> {
        let (where_sql, next) = Self::where_clause(&filter);

        let count_sql = format!("SELECT COUNT(*) FROM tasks{where_sql}");
        let count_row = Self::bind_filter(sqlx::query(&count_sql), &filter)
            .fetch_one(&*self.pool)
            .await
            .map_err(backend)?;
        let total: i64 = count_row.get(0);

        let rows_sql = format!(
            "SELECT * FROM tasks{where_sql} ORDER BY created_at ASC, id ASC OFFSET ${next} LIMIT ${}",
            next + 1
        );
        let rows = Self::bind_filter(sqlx::query(&rows_sql), &filter)
            .bind(offset as i64)
            .bind(limit as i64)
            .fetch_all(&*self.pool)
            .await
            .map_err(backend)?;

        let tasks: Result<Vec<Task>, StoreError> = rows.iter().map(task_from_row).collect();
        Ok((tasks?, total as u64))
    }

    async fn save(&self, task: Task) -> Result<Task, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, title, description, assigned_to, created_by, status,
                               priority, due_date, completed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                assigned_to = EXCLUDED.assigned_to,
                status = EXCLUDED.status,
                priority = EXCLUDED.priority,
                due_date = EXCLUDED.due_date,
                completed_at = EXCLUDED.completed_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(*task.id.as_uuid())
        .bind(&task.title)
        .bind(&task.description)
        .bind(*task.assigned_to.as_uuid())
        .bind(*task.created_by.as_uuid())
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(task.completed_at)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(backend)?;

        Ok(task)
    }

    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(backend)?;

        Ok(())
    }
}
