//! Ownership rules. Pure decisions; handlers turn a `false` into
//! [`ApiError::PermissionDenied`](crate::ApiError::PermissionDenied).

use uuid::Uuid;

/// Only the owner may edit or delete a status, comment or circle. Reading a
/// circle follows the same rule.
pub fn can_mutate_or_delete(owner: Uuid, caller: Option<Uuid>) -> bool {
    caller == Some(owner)
}

/// Circle owners manage membership, but never their own.
pub fn can_manage_circle_member(owner: Uuid, caller: Option<Uuid>, target: Uuid) -> bool {
    can_mutate_or_delete(owner, caller) && caller != Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_allowed() {
        let owner = Uuid::new_v4();
        assert!(can_mutate_or_delete(owner, Some(owner)));
    }

    #[test]
    fn others_and_anonymous_are_denied() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert!(!can_mutate_or_delete(owner, Some(other)));
        assert!(!can_mutate_or_delete(owner, None));
    }

    #[test]
    fn owner_manages_other_members() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        assert!(can_manage_circle_member(owner, Some(owner), member));
    }

    #[test]
    fn owner_cannot_manage_self() {
        let owner = Uuid::new_v4();
        assert!(!can_manage_circle_member(owner, Some(owner), owner));
    }

    #[test]
    fn non_owner_cannot_manage_anyone() {
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let member = Uuid::new_v4();
        assert!(!can_manage_circle_member(owner, Some(intruder), member));
        assert!(!can_manage_circle_member(owner, Some(intruder), intruder));
        assert!(!can_manage_circle_member(owner, None, member));
    }
}
