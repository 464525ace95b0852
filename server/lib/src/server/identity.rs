//! Information about the authenticated principal performing an operation.
//! Every access decision receives one of these, built from the session's
//! account entry (or marking the caller as external). The admin scope is
//! derived once from the account's flags and carried for the life of the
//! request.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::prelude::*;

/// The acting scope a session carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AdminScope {
    None,
    Domain,
    Global,
}

impl fmt::Display for AdminScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminScope::None => write!(f, "none"),
            AdminScope::Domain => write!(f, "domain"),
            AdminScope::Global => write!(f, "global"),
        }
    }
}

/// A directory user and, when the session was handed out by an admin
/// masquerading as them, the id of that admin.
#[derive(Debug, Clone)]
pub struct IdentUser {
    pub entry: Arc<Entry>,
    pub delegating_admin: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub enum IdentType {
    User(IdentUser),
    External,
}

#[derive(Debug, Clone)]
pub struct Identity {
    pub origin: IdentType,
    scope: AdminScope,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            IdentType::User(u) => match u.delegating_admin {
                Some(admin) => write!(
                    f,
                    "user({}, {}, delegated by {})",
                    u.entry.name(),
                    self.scope,
                    admin
                ),
                None => write!(f, "user({}, {})", u.entry.name(), self.scope),
            },
            IdentType::External => write!(f, "external"),
        }
    }
}

fn scope_of(entry: &Entry) -> AdminScope {
    if entry.get_ava_single_bool(Attribute::IsAdminAccount, false) {
        AdminScope::Global
    } else if entry.get_ava_single_bool(Attribute::IsDomainAdminAccount, false) {
        AdminScope::Domain
    } else {
        AdminScope::None
    }
}

impl Identity {
    /// A session for this account, scope derived from its admin flags.
    pub fn from_account(entry: Arc<Entry>) -> Self {
        let scope = scope_of(&entry);
        Identity {
            origin: IdentType::User(IdentUser {
                entry,
                delegating_admin: None,
            }),
            scope,
        }
    }

    /// A session an admin obtained on another account's behalf. The scope is
    /// the *target* account's, not the admin's.
    pub fn from_delegated(entry: Arc<Entry>, delegating_admin: Uuid) -> Self {
        let scope = scope_of(&entry);
        Identity {
            origin: IdentType::User(IdentUser {
                entry,
                delegating_admin: Some(delegating_admin),
            }),
            scope,
        }
    }

    /// A principal with no directory entry, a guest or foreign token.
    pub fn external() -> Self {
        Identity {
            origin: IdentType::External,
            scope: AdminScope::None,
        }
    }

    pub fn is_directory_user(&self) -> bool {
        matches!(self.origin, IdentType::User(_))
    }

    pub fn is_global_admin(&self) -> bool {
        self.scope == AdminScope::Global
    }

    /// Domain admin and nothing more. Global admins are not domain admins.
    pub fn is_domain_admin(&self) -> bool {
        self.scope == AdminScope::Domain
    }

    pub fn scope(&self) -> AdminScope {
        self.scope
    }

    pub fn account(&self) -> Option<&Arc<Entry>> {
        match &self.origin {
            IdentType::User(u) => Some(&u.entry),
            IdentType::External => None,
        }
    }

    pub fn uuid(&self) -> Option<Uuid> {
        self.account().map(|e| e.get_uuid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;

    fn account(name: &str, flags: &[(Attribute, &str)]) -> Arc<Entry> {
        let mut e = Entry::new(EntryKind::Account, Uuid::new_v4());
        e.add_ava(Attribute::Name, name);
        for (attr, value) in flags {
            e.add_ava(attr.clone(), value);
        }
        Arc::new(e)
    }

    #[test]
    fn test_identity_scope_from_flags() {
        let plain = Identity::from_account(account("alice@example.com", &[]));
        assert_eq!(plain.scope(), AdminScope::None);
        assert!(plain.is_directory_user());
        assert!(!plain.is_global_admin());
        assert!(!plain.is_domain_admin());

        let domain_admin = Identity::from_account(account(
            "dadmin@example.com",
            &[(Attribute::IsDomainAdminAccount, "TRUE")],
        ));
        assert!(domain_admin.is_domain_admin());
        assert!(!domain_admin.is_global_admin());

        // The global flag wins when both are present.
        let both = Identity::from_account(account(
            "root@example.com",
            &[
                (Attribute::IsAdminAccount, "TRUE"),
                (Attribute::IsDomainAdminAccount, "TRUE"),
            ],
        ));
        assert!(both.is_global_admin());
        assert!(!both.is_domain_admin());
    }

    #[test]
    fn test_identity_external() {
        let ext = Identity::external();
        assert!(!ext.is_directory_user());
        assert!(ext.account().is_none());
        assert!(ext.uuid().is_none());
        assert_eq!(format!("{}", ext), "external");
    }

    #[test]
    fn test_identity_display() {
        let ident = Identity::from_account(account(
            "dadmin@example.com",
            &[(Attribute::IsDomainAdminAccount, "TRUE")],
        ));
        assert_eq!(format!("{}", ident), "user(dadmin@example.com, domain)");

        let admin_id = Uuid::new_v4();
        let delegated =
            Identity::from_delegated(account("alice@example.com", &[]), admin_id);
        assert_eq!(
            format!("{}", delegated),
            format!("user(alice@example.com, none, delegated by {})", admin_id)
        );
    }
}
