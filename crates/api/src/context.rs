use taskdesk_auth::{Requester, Role};
use taskdesk_core::UserId;

/// Requester context for a request (authenticated identity + role).
///
/// Inserted by the auth middleware and required by all protected routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequesterContext {
    requester: Requester,
}

impl RequesterContext {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            requester: Requester::new(user_id, role),
        }
    }

    pub fn requester(&self) -> Requester {
        self.requester
    }

    pub fn user_id(&self) -> UserId {
        self.requester.id
    }

    pub fn is_admin(&self) -> bool {
        self.requester.is_admin()
    }
}
