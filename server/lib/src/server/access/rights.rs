//! The seam to the ACL-grant evaluator. The domain-scoped engine decides
//! most questions from entry attributes alone, but delegation rights
//! (send-as and friends) live in grant lists it does not understand, so it
//! defers those to whatever rights engine was injected next to it.

use crate::prelude::*;
use crate::server::identity::Identity;

pub trait RightsEngine: Send + Sync {
    /// May the principal exercise this right on the target?
    fn can_do(&self, ident: &Identity, target: &Entry, right: &Right, as_admin: bool) -> bool;

    /// As [`can_do`](RightsEngine::can_do), also filling `via` with the
    /// grant that decided the outcome when the evaluator knows it.
    fn can_do_via(
        &self,
        ident: &Identity,
        target: &Entry,
        right: &Right,
        as_admin: bool,
        _via: &mut ViaGrant,
    ) -> bool {
        self.can_do(ident, target, right, as_admin)
    }
}

/// Grants nothing. The stand-in used when no grant evaluator is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAllRights;

impl RightsEngine for DenyAllRights {
    fn can_do(&self, _ident: &Identity, _target: &Entry, _right: &Right, _as_admin: bool) -> bool {
        false
    }
}

#[cfg(test)]
pub(crate) struct AllowAllRights;

#[cfg(test)]
impl RightsEngine for AllowAllRights {
    fn can_do(&self, _ident: &Identity, _target: &Entry, _right: &Right, _as_admin: bool) -> bool {
        true
    }

    fn can_do_via(
        &self,
        _ident: &Identity,
        target: &Entry,
        right: &Right,
        _as_admin: bool,
        via: &mut ViaGrant,
    ) -> bool {
        via.record(
            TargetType::Account,
            target.name().to_string(),
            GranteeType::All,
            "everyone".to_string(),
            right,
            false,
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn test_rights_deny_all() {
        let target = Entry::new(EntryKind::Account, Uuid::new_v4());
        let ident = Identity::from_account(Arc::new(target.clone()));
        let rights = DenyAllRights;
        assert!(!rights.can_do(&ident, &target, &Right::SendAs, true));

        let mut via = ViaGrant::new();
        assert!(!rights.can_do_via(&ident, &target, &Right::SendAs, true, &mut via));
        assert!(!via.available());
    }

    #[test]
    fn test_rights_via_recording() {
        let mut target = Entry::new(EntryKind::Account, Uuid::new_v4());
        target.add_ava(Attribute::Name, "alice@example.com");
        let ident = Identity::from_account(Arc::new(target.clone()));

        let mut via = ViaGrant::new();
        assert!(AllowAllRights.can_do_via(&ident, &target, &Right::SendAs, false, &mut via));
        assert!(via.available());
        assert_eq!(via.target_name(), Some("alice@example.com"));
        assert_eq!(via.right(), Some("send_as"));
        assert!(!via.is_negative_grant());
    }
}
