//! Service wiring and the application-level operations the routes call.
//!
//! Stores, the password hasher, and the token codec are injected explicitly;
//! handlers never construct their own dependencies.

use std::sync::Arc;

use chrono::Utc;

use taskdesk_auth::{BcryptPasswordHasher, Hs256TokenCodec, PasswordHasher, Requester, Role};
use taskdesk_core::{DomainError, TaskId, UserId};
use taskdesk_infra::{
    InMemoryTaskStore, InMemoryUserStore, PgTaskStore, PgUserStore, TaskFilter, TaskStore,
    UserStore, ensure_schema,
};
use taskdesk_tasks::{AccessOp, ListTasksQuery, NewTask, Task, TaskAccess, TaskPage, TaskUpdate, authorize};
use taskdesk_users::{NewUser, User, UserUpdate};

use super::errors::ApiError;

/// Validated user-creation input; the password is still plaintext here and
/// gets hashed by the service.
#[derive(Debug, Clone)]
pub struct NewUserInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub password: String,
}

pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

pub struct AppServices {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<Hs256TokenCodec>,
}

/// Pick the store backend from the environment: `USE_PERSISTENT_STORES=true`
/// plus `DATABASE_URL` selects Postgres; anything else is in-memory.
pub async fn build_services(jwt_secret: String) -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        match std::env::var("DATABASE_URL") {
            Ok(url) => match build_persistent_services(&jwt_secret, &url).await {
                Ok(services) => return services,
                Err(e) => {
                    tracing::warn!("failed to connect to postgres ({e}), falling back to in-memory");
                }
            },
            Err(_) => {
                tracing::warn!(
                    "USE_PERSISTENT_STORES=true but DATABASE_URL not set, falling back to in-memory"
                );
            }
        }
    }

    AppServices::in_memory(jwt_secret.as_bytes())
}

async fn build_persistent_services(
    jwt_secret: &str,
    database_url: &str,
) -> Result<AppServices, ApiError> {
    let pool = sqlx::PgPool::connect(database_url)
        .await
        .map_err(|e| ApiError::Store(taskdesk_infra::StoreError::Backend(e.to_string())))?;
    ensure_schema(&pool).await?;

    Ok(AppServices {
        users: Arc::new(PgUserStore::new(pool.clone())),
        tasks: Arc::new(PgTaskStore::new(pool)),
        hasher: Arc::new(BcryptPasswordHasher::new()),
        tokens: Arc::new(Hs256TokenCodec::new(jwt_secret.as_bytes())),
    })
}

impl AppServices {
    /// In-memory wiring (dev/test).
    pub fn in_memory(jwt_secret: &[u8]) -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            tasks: Arc::new(InMemoryTaskStore::new()),
            hasher: Arc::new(BcryptPasswordHasher::new()),
            tokens: Arc::new(Hs256TokenCodec::new(jwt_secret)),
        }
    }

    // ── auth ────────────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        let user = self.users.find_by_email(email).await?;

        // Same rejection for unknown email and bad password.
        let user = match user {
            Some(u) if self.hasher.compare(password, &u.password_hash) => u,
            _ => return Err(ApiError::Unauthorized("Invalid credentials".to_string())),
        };

        if !user.is_active {
            return Err(ApiError::Unauthorized(
                "User account is deactivated".to_string(),
            ));
        }

        let token = self.tokens.issue(user.id, user.role, Utc::now())?;
        Ok(LoginOutcome { token, user })
    }

    // ── users ───────────────────────────────────────────────────────────

    pub async fn create_user(&self, input: NewUserInput) -> Result<User, ApiError> {
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(DomainError::conflict("User with this email already exists").into());
        }

        let password_hash = self.hasher.hash(&input.password)?;
        let user = User::create(
            NewUser {
                email: input.email,
                first_name: input.first_name,
                last_name: input.last_name,
                role: input.role,
                password_hash,
            },
            Utc::now(),
        );

        Ok(self.users.save(user).await?)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.users.list().await?)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, ApiError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found().into())
    }

    pub async fn update_user(
        &self,
        id: UserId,
        mut update: UserUpdate,
        new_password: Option<String>,
    ) -> Result<User, ApiError> {
        let mut user = self.get_user(id).await?;

        if let Some(email) = &update.email {
            if let Some(existing) = self.users.find_by_email(email).await? {
                if existing.id != id {
                    return Err(
                        DomainError::conflict("User with this email already exists").into(),
                    );
                }
            }
        }

        if let Some(password) = new_password {
            update.password_hash = Some(self.hasher.hash(&password)?);
        }

        user.apply_update(update, Utc::now());
        Ok(self.users.save(user).await?)
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), ApiError> {
        if self.users.delete(id).await? == 0 {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    // ── tasks ───────────────────────────────────────────────────────────

    pub async fn create_task(&self, requester: Requester, new: NewTask) -> Result<Task, ApiError> {
        if self.users.find_by_id(new.assigned_to).await?.is_none() {
            return Err(DomainError::validation("assignedTo", "assigned user does not exist").into());
        }

        let task = Task::create(new, requester.id, Utc::now());
        Ok(self.tasks.save(task).await?)
    }

    pub async fn get_task(&self, requester: Requester, id: TaskId) -> Result<Task, ApiError> {
        let task = self.find_authorized(requester, id, AccessOp::View).await?;
        Ok(task)
    }

    pub async fn list_tasks(
        &self,
        requester: Requester,
        query: ListTasksQuery,
    ) -> Result<TaskPage<Task>, ApiError> {
        let query = query.normalized();
        let filter = TaskFilter::for_requester(&requester, &query);

        let (data, total) = self.tasks.query(filter, query.offset(), query.limit).await?;
        Ok(TaskPage::new(data, total, query.page, query.limit))
    }

    pub async fn update_task(
        &self,
        requester: Requester,
        id: TaskId,
        update: TaskUpdate,
    ) -> Result<Task, ApiError> {
        let mut task = self.find_authorized(requester, id, AccessOp::Modify).await?;

        if let Some(assigned_to) = update.assigned_to {
            if self.users.find_by_id(assigned_to).await?.is_none() {
                return Err(
                    DomainError::validation("assignedTo", "assigned user does not exist").into(),
                );
            }
        }

        task.apply_update(update, Utc::now());
        Ok(self.tasks.save(task).await?)
    }

    pub async fn delete_task(&self, requester: Requester, id: TaskId) -> Result<(), ApiError> {
        self.find_authorized(requester, id, AccessOp::Delete).await?;
        self.tasks.delete(id).await?;
        Ok(())
    }

    /// Fetch a task and run the access policy against it. The policy sees
    /// `None` for absent tasks so the NotFound-before-Forbidden order holds.
    async fn find_authorized(
        &self,
        requester: Requester,
        id: TaskId,
        op: AccessOp,
    ) -> Result<Task, ApiError> {
        let found = self.tasks.find_by_id(id).await?;
        let access = found.as_ref().map(TaskAccess::from);
        authorize(access.as_ref(), &requester, op)?;

        match found {
            Some(task) => Ok(task),
            None => Err(DomainError::not_found().into()),
        }
    }

    /// Resolve the assignee/creator summaries embedded in task responses.
    pub async fn task_view(&self, task: &Task) -> Result<serde_json::Value, ApiError> {
        let assignee = self.users.find_by_id(task.assigned_to).await?;
        let creator = self.users.find_by_id(task.created_by).await?;
        Ok(super::dto::task_to_json(
            task,
            assignee.as_ref(),
            creator.as_ref(),
        ))
    }
}
