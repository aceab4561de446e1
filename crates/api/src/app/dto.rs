//! Request DTOs, their validation, and JSON mapping helpers.
//!
//! Enum-ish and id fields arrive as strings and are parsed here so bad input
//! surfaces as a 400 with per-field messages instead of a body-rejection.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use taskdesk_auth::Role;
use taskdesk_core::{UserId, ValidationErrors};
use taskdesk_tasks::{ListTasksQuery, NewTask, Task, TaskPriority, TaskStatus, TaskUpdate};
use taskdesk_users::{User, UserUpdate};

use crate::app::services::NewUserInput;

pub const MIN_PASSWORD_LEN: usize = 6;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_to: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub completed_at: Option<String>,
}

/// Query-string parameters of `GET /tasks`.
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

// -------------------------
// Validation
// -------------------------

fn looks_like_email(s: &str) -> bool {
    // Shape check only; deliverability is not our problem.
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

fn parse_status(raw: &str, errors: &mut ValidationErrors) -> Option<TaskStatus> {
    match raw.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push("status", e);
            None
        }
    }
}

fn parse_priority(raw: &str, errors: &mut ValidationErrors) -> Option<TaskPriority> {
    match raw.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push("priority", e);
            None
        }
    }
}

fn parse_date(raw: &str, field: &'static str, errors: &mut ValidationErrors) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => {
            errors.push(field, "must be an RFC 3339 timestamp");
            None
        }
    }
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !looks_like_email(&self.email) {
            errors.push("email", "must be a valid email address");
        }
        if self.password.is_empty() {
            errors.push("password", "must not be empty");
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<NewUserInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !looks_like_email(&self.email) {
            errors.push("email", "must be a valid email address");
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            errors.push("password", format!("must be at least {MIN_PASSWORD_LEN} characters"));
        }
        if self.first_name.trim().is_empty() {
            errors.push("firstName", "must not be empty");
        }
        if self.last_name.trim().is_empty() {
            errors.push("lastName", "must not be empty");
        }

        let role = match self.role.as_deref() {
            None => Role::default(),
            Some(raw) => match raw.parse() {
                Ok(role) => role,
                Err(e) => {
                    errors.push("role", e);
                    Role::default()
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewUserInput {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role,
            password: self.password,
        })
    }
}

impl UpdateUserRequest {
    /// Returns the entity-level update plus the plaintext password rotation,
    /// which the service hashes.
    pub fn validate(self) -> Result<(UserUpdate, Option<String>), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(email) = &self.email {
            if !looks_like_email(email) {
                errors.push("email", "must be a valid email address");
            }
        }
        if let Some(password) = &self.password {
            if password.len() < MIN_PASSWORD_LEN {
                errors.push("password", format!("must be at least {MIN_PASSWORD_LEN} characters"));
            }
        }
        if let Some(first_name) = &self.first_name {
            if first_name.trim().is_empty() {
                errors.push("firstName", "must not be empty");
            }
        }
        if let Some(last_name) = &self.last_name {
            if last_name.trim().is_empty() {
                errors.push("lastName", "must not be empty");
            }
        }

        let role = match self.role.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => Some(role),
                Err(e) => {
                    errors.push("role", e);
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok((
            UserUpdate {
                email: self.email,
                first_name: self.first_name,
                last_name: self.last_name,
                role,
                is_active: self.is_active,
                password_hash: None,
            },
            self.password,
        ))
    }
}

impl CreateTaskRequest {
    pub fn validate(self) -> Result<NewTask, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.title.trim().is_empty() {
            errors.push("title", "must not be empty");
        }
        if self.description.trim().is_empty() {
            errors.push("description", "must not be empty");
        }

        let assigned_to = match self.assigned_to.parse::<UserId>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push("assignedTo", "must be a valid UUID");
                None
            }
        };

        let status = self.status.as_deref().and_then(|raw| parse_status(raw, &mut errors));
        let priority = self
            .priority
            .as_deref()
            .and_then(|raw| parse_priority(raw, &mut errors));
        let due_date = self
            .due_date
            .as_deref()
            .and_then(|raw| parse_date(raw, "dueDate", &mut errors));

        match (assigned_to, errors.is_empty()) {
            (Some(assigned_to), true) => Ok(NewTask {
                title: self.title,
                description: self.description,
                assigned_to,
                status,
                priority,
                due_date,
            }),
            _ => Err(errors),
        }
    }
}

impl UpdateTaskRequest {
    pub fn validate(self) -> Result<TaskUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                errors.push("title", "must not be empty");
            }
        }
        if let Some(description) = &self.description {
            if description.trim().is_empty() {
                errors.push("description", "must not be empty");
            }
        }

        let assigned_to = match self.assigned_to.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<UserId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push("assignedTo", "must be a valid UUID");
                    None
                }
            },
        };

        let status = self.status.as_deref().and_then(|raw| parse_status(raw, &mut errors));
        let priority = self
            .priority
            .as_deref()
            .and_then(|raw| parse_priority(raw, &mut errors));
        let due_date = self
            .due_date
            .as_deref()
            .and_then(|raw| parse_date(raw, "dueDate", &mut errors));
        let completed_at = self
            .completed_at
            .as_deref()
            .and_then(|raw| parse_date(raw, "completedAt", &mut errors));

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TaskUpdate {
            title: self.title,
            description: self.description,
            assigned_to,
            status,
            priority,
            due_date,
            completed_at,
        })
    }
}

impl ListTasksParams {
    /// Out-of-range page/limit are clamped by `normalized()`, not rejected;
    /// unknown enum values are rejected.
    pub fn validate(self) -> Result<ListTasksQuery, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let status = self.status.as_deref().and_then(|raw| parse_status(raw, &mut errors));
        let priority = self
            .priority
            .as_deref()
            .and_then(|raw| parse_priority(raw, &mut errors));

        if !errors.is_empty() {
            return Err(errors);
        }

        let defaults = ListTasksQuery::default();
        Ok(ListTasksQuery {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
            status,
            priority,
        }
        .normalized())
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn user_to_json(user: &User) -> serde_json::Value {
    // Serialize semantics guarantee the hash is skipped.
    serde_json::to_value(user).unwrap_or_else(|_| json!({}))
}

pub fn user_summary_json(user: &User) -> serde_json::Value {
    serde_json::to_value(user.summary()).unwrap_or_else(|_| json!({}))
}

/// Task response: the task fields plus resolved assignee/creator summaries.
pub fn task_to_json(task: &Task, assignee: Option<&User>, creator: Option<&User>) -> serde_json::Value {
    let mut value = serde_json::to_value(task).unwrap_or_else(|_| json!({}));

    if let Some(object) = value.as_object_mut() {
        object.insert(
            "assignee".to_string(),
            assignee.map(user_summary_json).unwrap_or(serde_json::Value::Null),
        );
        object.insert(
            "creator".to_string(),
            creator.map(user_summary_json).unwrap_or(serde_json::Value::Null),
        );
    }

    value
}
