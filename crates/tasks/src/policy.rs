//! Access policy engine: who may read, modify, or delete a task.
//!
//! Pure decision functions over the task's two user references and the
//! requester's id + role. No IO, no side effects, safe to call repeatedly.

use taskdesk_auth::Requester;
use taskdesk_core::{DomainError, DomainResult, UserId};

use crate::Task;

/// The operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOp {
    View,
    Modify,
    Delete,
}

/// The slice of a task the policy engine looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskAccess {
    pub assigned_to: UserId,
    pub created_by: UserId,
}

impl From<&Task> for TaskAccess {
    fn from(task: &Task) -> Self {
        Self {
            assigned_to: task.assigned_to,
            created_by: task.created_by,
        }
    }
}

/// View rule: admin, assignee, or creator.
pub fn can_view(task: &TaskAccess, requester: &Requester) -> bool {
    requester.is_admin() || requester.id == task.assigned_to || requester.id == task.created_by
}

/// Modify rule: identical to the view rule.
pub fn can_modify(task: &TaskAccess, requester: &Requester) -> bool {
    can_view(task, requester)
}

/// Delete rule: stricter — assignee alone is not sufficient.
pub fn can_delete(task: &TaskAccess, requester: &Requester) -> bool {
    requester.is_admin() || requester.id == task.created_by
}

/// Authorize `op` against a task that may or may not exist.
///
/// The evaluation order is part of the contract: existence is resolved first
/// (`NotFound` when absent), then the view/modify rule (`Forbidden`), then —
/// for delete only — the stricter delete rule (`Forbidden`). A non-owning,
/// non-admin requester probing a real task id therefore gets `Forbidden`,
/// not `NotFound`: existence is deliberately not hidden. Simplicity over
/// information-hiding; the tests pin this trade-off.
pub fn authorize(
    found: Option<&TaskAccess>,
    requester: &Requester,
    op: AccessOp,
) -> DomainResult<()> {
    let task = found.ok_or(DomainError::NotFound)?;

    if !can_view(task, requester) {
        return Err(DomainError::forbidden("Access denied"));
    }

    if op == AccessOp::Delete && !can_delete(task, requester) {
        return Err(DomainError::forbidden(
            "Only task creators or admins can delete tasks",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use taskdesk_auth::Role;
    use uuid::Uuid;

    fn user(id: UserId) -> Requester {
        Requester::new(id, Role::User)
    }

    fn admin() -> Requester {
        Requester::new(UserId::new(), Role::Admin)
    }

    fn task(assigned_to: UserId, created_by: UserId) -> TaskAccess {
        TaskAccess {
            assigned_to,
            created_by,
        }
    }

    #[test]
    fn assignee_may_view_and_modify_but_not_delete() {
        let assignee = UserId::new();
        let creator = UserId::new();
        let t = task(assignee, creator);
        let r = user(assignee);

        assert!(can_view(&t, &r));
        assert!(can_modify(&t, &r));
        assert!(!can_delete(&t, &r));

        assert!(authorize(Some(&t), &r, AccessOp::Modify).is_ok());
        assert_eq!(
            authorize(Some(&t), &r, AccessOp::Delete),
            Err(DomainError::forbidden(
                "Only task creators or admins can delete tasks"
            ))
        );
    }

    #[test]
    fn creator_may_do_everything() {
        let creator = UserId::new();
        let t = task(UserId::new(), creator);
        let r = user(creator);

        for op in [AccessOp::View, AccessOp::Modify, AccessOp::Delete] {
            assert!(authorize(Some(&t), &r, op).is_ok());
        }
    }

    #[test]
    fn unrelated_user_gets_forbidden_not_not_found() {
        // Existence is deliberately leaked for real-but-inaccessible tasks.
        let t = task(UserId::new(), UserId::new());
        let r = user(UserId::new());

        for op in [AccessOp::View, AccessOp::Modify, AccessOp::Delete] {
            assert_eq!(
                authorize(Some(&t), &r, op),
                Err(DomainError::forbidden("Access denied"))
            );
        }
    }

    #[test]
    fn absent_task_is_not_found_regardless_of_role() {
        for r in [user(UserId::new()), admin()] {
            for op in [AccessOp::View, AccessOp::Modify, AccessOp::Delete] {
                assert_eq!(authorize(None, &r, op), Err(DomainError::NotFound));
            }
        }
    }

    #[test]
    fn admin_bypasses_every_rule() {
        let t = task(UserId::new(), UserId::new());
        let r = admin();

        assert!(can_view(&t, &r));
        assert!(can_modify(&t, &r));
        assert!(can_delete(&t, &r));
    }

    proptest! {
        #[test]
        fn non_admin_view_iff_assignee_or_creator(
            requester_raw in any::<u128>(),
            assigned_raw in any::<u128>(),
            created_raw in any::<u128>(),
        ) {
            let requester_id = UserId::from_uuid(Uuid::from_u128(requester_raw));
            let t = task(
                UserId::from_uuid(Uuid::from_u128(assigned_raw)),
                UserId::from_uuid(Uuid::from_u128(created_raw)),
            );
            let r = user(requester_id);

            let related = requester_id == t.assigned_to || requester_id == t.created_by;
            prop_assert_eq!(can_view(&t, &r), related);
            prop_assert_eq!(can_modify(&t, &r), related);
            prop_assert_eq!(can_delete(&t, &r), requester_id == t.created_by);
        }

        #[test]
        fn admin_always_passes(
            assigned_raw in any::<u128>(),
            created_raw in any::<u128>(),
        ) {
            let t = task(
                UserId::from_uuid(Uuid::from_u128(assigned_raw)),
                UserId::from_uuid(Uuid::from_u128(created_raw)),
            );
            let r = admin();
            prop_assert!(can_view(&t, &r));
            prop_assert!(can_modify(&t, &r));
            prop_assert!(can_delete(&t, &r));
        }

        #[test]
        fn authorize_is_deterministic(
            requester_raw in any::<u128>(),
            assigned_raw in any::<u128>(),
        ) {
            let t = task(
                UserId::from_uuid(Uuid::from_u128(assigned_raw)),
                UserId::from_uuid(Uuid::from_u128(requester_raw)),
            );
            let r = user(UserId::from_uuid(Uuid::from_u128(requester_raw)));
            let first = authorize(Some(&t), &r, AccessOp::Delete);
            let second = authorize(Some(&t), &r, AccessOp::Delete);
            prop_assert_eq!(first, second);
        }
    }
}
