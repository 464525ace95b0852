//! Entries are the unit of object storage in the directory. An [`Entry`] is a
//! collection of attribute-value assertions, or AVAs. The attribute is a "key"
//! and it holds one or more associated string values with no ordering. A
//! pseudo example:
//!
//! ```text
//! Entry {
//!   "name": ["alice@example.com"],
//!   "mail_alias": ["sales@example.com", "info@example.com"],
//! };
//! ```
//!
//! The provisioning core never persists entries. It receives them from the
//! [`Directory`](crate::directory::Directory) seam, reads their attributes to
//! decide access questions, and hands validated modification lists back to
//! the caller.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::prelude::*;

/// The object class of a directory entry. The provisioning core only needs
/// the coarse distinction; fine-grained classing stays with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Account,
    Domain,
    Cos,
    Group,
    Server,
    Config,
}

/// A directory entry snapshot. Values are stored in their string wire form;
/// multi-valued attributes keep their insertion order but compare as sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    kind: EntryKind,
    uuid: Uuid,
    attrs: BTreeMap<Attribute, Vec<String>>,
}

impl Entry {
    pub fn new(kind: EntryKind, uuid: Uuid) -> Self {
        Entry {
            kind,
            uuid,
            attrs: BTreeMap::new(),
        }
    }

    pub fn get_uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// The entry's primary name. For accounts and groups this is the primary
    /// address, for domains the domain name.
    pub fn name(&self) -> &str {
        self.get_ava(Attribute::Name)
            .and_then(|vs| vs.first())
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// The id of the domain this entry belongs to, when it carries one.
    pub fn domain_id(&self) -> Option<&str> {
        self.get_ava_single(Attribute::DomainId)
    }

    /// Append a value to an attribute. Values already present are not
    /// duplicated.
    pub fn add_ava(&mut self, attr: Attribute, value: &str) {
        let vs = self.attrs.entry(attr).or_default();
        if !vs.iter().any(|v| v == value) {
            vs.push(value.to_string());
        }
    }

    /// Replace all values of an attribute.
    pub fn set_ava<T>(&mut self, attr: Attribute, values: T)
    where
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let vs: Vec<String> = values.into_iter().map(|v| v.into()).collect();
        if vs.is_empty() {
            self.attrs.remove(&attr);
        } else {
            self.attrs.insert(attr, vs);
        }
    }

    /// Remove an attribute and all its values.
    pub fn purge_ava(&mut self, attr: &Attribute) {
        self.attrs.remove(attr);
    }

    pub fn get_ava<A: AsRef<Attribute>>(&self, attr: A) -> Option<&[String]> {
        self.attrs.get(attr.as_ref()).map(|vs| vs.as_slice())
    }

    /// Return the value of an attribute that holds exactly one value.
    pub fn get_ava_single<A: AsRef<Attribute>>(&self, attr: A) -> Option<&str> {
        self.get_ava(attr).and_then(|vs| {
            if vs.len() == 1 {
                vs.first().map(|s| s.as_str())
            } else {
                None
            }
        })
    }

    /// All values of an attribute as an order-free set.
    pub fn get_ava_set<A: AsRef<Attribute>>(&self, attr: A) -> BTreeSet<String> {
        self.get_ava(attr)
            .map(|vs| vs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Read a boolean attribute stored as the strings `TRUE`/`FALSE`. Any
    /// other content falls back to the supplied default.
    pub fn get_ava_single_bool<A: AsRef<Attribute>>(&self, attr: A, default: bool) -> bool {
        match self.get_ava_single(attr) {
            Some(BOOL_TRUE) => true,
            Some(BOOL_FALSE) => false,
            _ => default,
        }
    }

    /// Read an integer attribute, falling back to the supplied default when
    /// absent or unparseable.
    pub fn get_ava_single_i64<A: AsRef<Attribute>>(&self, attr: A, default: i64) -> i64 {
        self.get_ava_single(attr)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    pub fn attribute_pres<A: AsRef<Attribute>>(&self, attr: A) -> bool {
        self.attrs.contains_key(attr.as_ref())
    }

    /// Assert if an attribute of this name is present and one of its values
    /// equals the given string.
    pub fn attribute_equality<A: AsRef<Attribute>>(&self, attr: A, value: &str) -> bool {
        self.get_ava(attr)
            .map(|vs| vs.iter().any(|v| v == value))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_ava_access() {
        let mut e = Entry::new(EntryKind::Account, Uuid::new_v4());
        e.add_ava(Attribute::Name, "alice@example.com");
        e.add_ava(Attribute::MailAlias, "sales@example.com");
        e.add_ava(Attribute::MailAlias, "info@example.com");
        // Duplicates collapse.
        e.add_ava(Attribute::MailAlias, "sales@example.com");

        assert_eq!(e.name(), "alice@example.com");
        assert_eq!(e.get_ava(Attribute::MailAlias).map(|vs| vs.len()), Some(2));
        // Single-value reads refuse multi-valued content.
        assert_eq!(e.get_ava_single(Attribute::MailAlias), None);
        assert!(e.attribute_pres(Attribute::MailAlias));
        assert!(e.attribute_equality(Attribute::MailAlias, "info@example.com"));
        assert!(!e.attribute_equality(Attribute::MailAlias, "INFO@example.com"));
    }

    #[test]
    fn test_entry_typed_reads() {
        let mut e = Entry::new(EntryKind::Account, Uuid::new_v4());
        e.add_ava(Attribute::IsAdminAccount, "TRUE");
        e.add_ava(Attribute::MailQuota, "52428800");
        e.add_ava(Attribute::Description, "maybe");

        assert!(e.get_ava_single_bool(Attribute::IsAdminAccount, false));
        assert!(!e.get_ava_single_bool(Attribute::IsDomainAdminAccount, false));
        assert!(e.get_ava_single_bool(Attribute::Description, true));
        assert_eq!(e.get_ava_single_i64(Attribute::MailQuota, -1), 52428800);
        assert_eq!(e.get_ava_single_i64(Attribute::DomainAdminMaxMailQuota, -1), -1);
    }

    #[test]
    fn test_entry_set_and_purge() {
        let mut e = Entry::new(EntryKind::Domain, Uuid::new_v4());
        e.set_ava(Attribute::Name, ["example.com"]);
        e.set_ava(Attribute::DomainStatus, ["active"]);
        assert_eq!(e.get_ava_single(Attribute::DomainStatus), Some("active"));

        e.set_ava(Attribute::DomainStatus, ["shutdown"]);
        assert_eq!(e.get_ava_single(Attribute::DomainStatus), Some("shutdown"));

        e.purge_ava(&Attribute::DomainStatus);
        assert!(!e.attribute_pres(Attribute::DomainStatus));

        // Setting no values is a purge.
        e.set_ava(Attribute::Name, Vec::<String>::new());
        assert_eq!(e.name(), "");
    }
}
