//! The read-only lookup seam between the provisioning core and whatever
//! store actually holds the directory. The access engine asks questions
//! through this trait, it never searches or persists on its own.

use std::sync::Arc;

use uuid::Uuid;

use crate::prelude::*;
use crate::value::split_email;

#[derive(Debug, Clone, Copy)]
pub enum AccountBy<'a> {
    Id(Uuid),
    Name(&'a str),
}

#[derive(Debug, Clone, Copy)]
pub enum DomainBy<'a> {
    Id(Uuid),
    Name(&'a str),
}

pub trait Directory: Send + Sync {
    /// Resolve an account by id or by address. Address lookups cover the
    /// primary name and aliases, case-insensitively.
    fn account_by(&self, by: AccountBy<'_>) -> Option<Arc<Entry>>;

    fn domain_by(&self, by: DomainBy<'_>) -> Option<Arc<Entry>>;

    /// Resolve a group by address, primary name or alias.
    fn group_by_name(&self, name: &str) -> Option<Arc<Entry>>;

    fn domain_by_name(&self, name: &str) -> Option<Arc<Entry>> {
        self.domain_by(DomainBy::Name(name))
    }

    /// The domain an entry belongs to, through its `domain_id` attribute.
    fn domain_of(&self, entry: &Entry) -> Option<Arc<Entry>> {
        entry
            .domain_id()
            .and_then(|id| Uuid::parse_str(id).ok())
            .and_then(|id| self.domain_by(DomainBy::Id(id)))
    }

    /// True when the address's domain part is one of ours.
    fn address_is_internal(&self, address: &str) -> bool {
        split_email(address)
            .map(|(_, domain)| self.domain_by_name(domain).is_some())
            .unwrap_or(false)
    }

    /// True when the address names a distribution list.
    fn is_distribution_list(&self, address: &str) -> bool {
        self.group_by_name(address).is_some()
    }
}

/// In-memory directory for tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct TestDirectory {
    accounts: Vec<Arc<Entry>>,
    domains: Vec<Arc<Entry>>,
    groups: Vec<Arc<Entry>>,
}

#[cfg(test)]
impl TestDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_account(mut self, entry: Entry) -> Self {
        self.accounts.push(Arc::new(entry));
        self
    }

    pub(crate) fn with_domain(mut self, entry: Entry) -> Self {
        self.domains.push(Arc::new(entry));
        self
    }

    pub(crate) fn with_group(mut self, entry: Entry) -> Self {
        self.groups.push(Arc::new(entry));
        self
    }
}

#[cfg(test)]
fn addressed_as(entry: &Entry, name: &str) -> bool {
    entry.name().eq_ignore_ascii_case(name)
        || entry
            .get_ava(Attribute::MailAlias)
            .map(|vs| vs.iter().any(|v| v.eq_ignore_ascii_case(name)))
            .unwrap_or(false)
}

#[cfg(test)]
impl Directory for TestDirectory {
    fn account_by(&self, by: AccountBy<'_>) -> Option<Arc<Entry>> {
        match by {
            AccountBy::Id(id) => self.accounts.iter().find(|e| e.get_uuid() == id).cloned(),
            AccountBy::Name(name) => self
                .accounts
                .iter()
                .find(|e| addressed_as(e, name))
                .cloned(),
        }
    }

    fn domain_by(&self, by: DomainBy<'_>) -> Option<Arc<Entry>> {
        match by {
            DomainBy::Id(id) => self.domains.iter().find(|e| e.get_uuid() == id).cloned(),
            DomainBy::Name(name) => self
                .domains
                .iter()
                .find(|e| e.name().eq_ignore_ascii_case(name))
                .cloned(),
        }
    }

    fn group_by_name(&self, name: &str) -> Option<Arc<Entry>> {
        self.groups.iter().find(|e| addressed_as(e, name)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;

    #[test]
    fn test_directory_provided_lookups() {
        let domain_id = Uuid::new_v4();
        let mut domain = Entry::new(EntryKind::Domain, domain_id);
        domain.add_ava(Attribute::Name, "example.com");

        let mut account = Entry::new(EntryKind::Account, Uuid::new_v4());
        account.add_ava(Attribute::Name, "alice@example.com");
        account.add_ava(Attribute::DomainId, &domain_id.to_string());

        let mut group = Entry::new(EntryKind::Group, Uuid::new_v4());
        group.add_ava(Attribute::Name, "sales@example.com");

        let dir = TestDirectory::new()
            .with_domain(domain)
            .with_account(account.clone())
            .with_group(group);

        assert!(dir.account_by(AccountBy::Name("ALICE@example.com")).is_some());
        assert!(dir.account_by(AccountBy::Name("bob@example.com")).is_none());
        assert!(dir.address_is_internal("anyone@example.com"));
        assert!(!dir.address_is_internal("anyone@elsewhere.net"));
        assert!(!dir.address_is_internal("not-an-address"));
        assert!(dir.is_distribution_list("sales@example.com"));
        assert!(!dir.is_distribution_list("alice@example.com"));

        let owner = dir.domain_of(&account).expect("domain not resolved");
        assert_eq!(owner.get_uuid(), domain_id);
    }
}
