use serde::{Deserialize, Serialize};

use taskdesk_core::UserId;

use crate::Role;

/// The authenticated identity attempting an operation.
///
/// This is the full input to every policy decision: an id and a role, as
/// resolved from a verified token. Role changes only take effect on the next
/// issued token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: UserId,
    pub role: Role,
}

impl Requester {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
