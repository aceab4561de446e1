use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskdesk_auth::Role;
use taskdesk_core::UserId;

/// A user record as held by the identity store.
///
/// The password credential is an opaque hash and is never serialized out;
/// responses carry [`UserSummary`] or the redacted serialization of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user. The password arrives already hashed; hashing is
/// the credential verifier's job, not the entity's.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub password_hash: String,
}

/// Partial update: `None` keeps the existing value.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

impl User {
    pub fn create(new: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            role: new.role,
            password_hash: new.password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the provided fields onto this record and stamp `updated_at`.
    pub fn apply_update(&mut self, update: UserUpdate, now: DateTime<Utc>) {
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        if let Some(password_hash) = update.password_hash {
            self.password_hash = password_hash;
        }
        self.updated_at = now;
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
        }
    }
}

/// Redacted user payload embedded in task responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}
