//! Access decisions. Whether an authenticated principal may read, change,
//! or act on a directory entry is answered here, behind the [`AccessEngine`]
//! strategy trait. The engine is chosen once at process start and injected
//! as `Arc<dyn AccessEngine>`; nothing in the crate assumes a particular
//! strategy.
//!
//! The shipped strategy is the domain-scoped one in [`domain`]: global
//! admins act everywhere and domain admins inside their own domain, while
//! family parents may always reach their children. Grant-list evaluation
//! lives outside this crate and is reachable only through the injected
//! [`RightsEngine`](rights::RightsEngine) collaborator.

pub mod domain;
pub mod rights;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::directory::{AccountBy, Directory};
use crate::prelude::*;
use crate::server::identity::Identity;
use crate::value::DomainStatus;

use self::rights::RightsEngine;

/// Abort when the domain refuses provisioning traffic. A missing or
/// unrecognized status reads as active.
pub fn check_domain_status(domain: &Entry) -> Result<(), OperationError> {
    let status = domain
        .get_ava_single(Attribute::DomainStatus)
        .and_then(|s| DomainStatus::try_from(s).ok())
        .unwrap_or(DomainStatus::Active);
    if status.is_serving() {
        Ok(())
    } else {
        security_info!(domain = %domain.name(), status = %status, "refusing operation on domain");
        Err(OperationError::PermissionDenied(Some(format!(
            "domain is {}",
            status
        ))))
    }
}

/// Addresses the entry may put on the wire as its own: the primary name,
/// aliases, and the explicitly allowed external addresses. Lowercased for
/// comparison.
pub fn allowed_send_addresses(entry: &Entry) -> BTreeSet<String> {
    let mut addrs = BTreeSet::new();
    addrs.insert(entry.name().to_lowercase());
    for attr in [Attribute::MailAlias, Attribute::AllowFromAddress] {
        if let Some(vs) = entry.get_ava(attr) {
            addrs.extend(vs.iter().map(|v| v.to_lowercase()));
        }
    }
    addrs
}

/// The access strategy. All checks are pure reads plus logging; errors are
/// reserved for aborts (a gated domain, a malformed request), while an
/// ordinary "no" is `Ok(false)`.
pub trait AccessEngine: Send + Sync {
    fn directory(&self) -> &dyn Directory;
    fn rights(&self) -> &dyn RightsEngine;

    /// May the principal act on the target account? `as_admin` says whether
    /// the session exercises its admin scope for this operation.
    fn can_access_account(
        &self,
        ident: &Identity,
        target: &Entry,
        as_admin: bool,
    ) -> Result<bool, OperationError>;

    fn can_access_domain(
        &self,
        ident: &Identity,
        domain_name: &str,
    ) -> Result<bool, OperationError>;

    fn can_access_cos(&self, ident: &Identity, cos: &Entry) -> Result<bool, OperationError>;

    fn can_access_email(&self, ident: &Identity, email: &str) -> Result<bool, OperationError>;

    fn can_access_group(&self, ident: &Identity, group: &Entry) -> Result<bool, OperationError>;

    fn can_create_group(
        &self,
        ident: &Identity,
        group_email: &str,
    ) -> Result<bool, OperationError>;

    fn can_modify_mail_quota(
        &self,
        ident: &Identity,
        target: &Entry,
        new_quota: i64,
    ) -> Result<bool, OperationError>;

    fn can_do(&self, ident: &Identity, target: &Entry, right: &Right, as_admin: bool) -> bool;

    fn can_get_attrs(
        &self,
        ident: &Identity,
        target: &Entry,
        attrs: &BTreeSet<Attribute>,
        as_admin: bool,
    ) -> Result<bool, OperationError>;

    fn can_set_attrs(
        &self,
        ident: &Identity,
        target: &Entry,
        attrs: &BTreeSet<Attribute>,
        as_admin: bool,
    ) -> Result<bool, OperationError>;

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

    /// The admin form of [`can_access_account`](AccessEngine::can_access_account).
    fn can_access_account_admin(
        &self,
        ident: &Identity,
        target: &Entry,
    ) -> Result<bool, OperationError> {
        self.can_access_account(ident, target, true)
    }

    fn can_access_domain_entry(
        &self,
        ident: &Identity,
        domain: &Entry,
    ) -> Result<bool, OperationError> {
        self.can_access_domain(ident, domain.name())
    }

    /// Domain admin and nothing more.
    fn domain_admin_only(&self, ident: &Identity) -> bool {
        ident.is_domain_admin()
    }

    /// Whether the entry carries any admin flag at all.
    fn adequate_admin_account(&self, entry: &Entry) -> bool {
        entry.get_ava_single_bool(Attribute::IsAdminAccount, false)
            || entry.get_ava_single_bool(Attribute::IsDomainAdminAccount, false)
    }

    /// Private data access: the account itself, or anyone who may reach the
    /// account through the admin rules.
    fn allow_private_access(
        &self,
        auth: &Arc<Entry>,
        target: &Entry,
        as_admin: bool,
    ) -> Result<bool, OperationError> {
        if auth.get_uuid() == target.get_uuid() {
            return Ok(true);
        }
        self.can_access_account(&Identity::from_account(auth.clone()), target, as_admin)
    }

    fn can_send_as(
        &self,
        ident: &Identity,
        target: &Entry,
        address: &str,
        as_admin: bool,
    ) -> Result<bool, OperationError> {
        self.check_send_right(ident, target, address, &Right::SendAs, as_admin)
    }

    fn can_send_on_behalf_of(
        &self,
        ident: &Identity,
        target: &Entry,
        address: &str,
        as_admin: bool,
    ) -> Result<bool, OperationError> {
        self.check_send_right(ident, target, address, &Right::SendOnBehalfOf, as_admin)
    }

    /// The shared flow behind the send delegation checks. The grant target
    /// is the distribution list or account the address resolves to; an
    /// external address must be explicitly allowed by the sending account
    /// before any grant is even consulted. Non-admin sessions additionally
    /// need the address among the sender's own send addresses.
    fn check_send_right(
        &self,
        ident: &Identity,
        target: &Entry,
        address: &str,
        right: &Right,
        as_admin: bool,
    ) -> Result<bool, OperationError> {
        let dl_right = match right {
            Right::SendAs => Right::SendAsDistList,
            Right::SendOnBehalfOf => Right::SendOnBehalfOfDistList,
            other => {
                return Err(OperationError::Failure(format!(
                    "unexpected send right {}",
                    other
                )))
            }
        };

        let directory = self.directory();
        let resolved: Option<Arc<Entry>>;
        let (grant_target, eff_right): (Option<&Entry>, &Right) =
            if directory.address_is_internal(address) {
                if directory.is_distribution_list(address) {
                    resolved = directory.group_by_name(address);
                    (resolved.as_deref(), &dl_right)
                } else {
                    resolved = directory.account_by(AccountBy::Name(address));
                    (resolved.as_deref(), right)
                }
            } else {
                let allowed_from = target
                    .get_ava(Attribute::AllowFromAddress)
                    .map(|vs| vs.iter().any(|v| v.eq_ignore_ascii_case(address)))
                    .unwrap_or(false);
                if allowed_from {
                    (Some(target), right)
                } else {
                    (None, right)
                }
            };

        let Some(grant_target) = grant_target else {
            security_info!(ident = %ident, address, "send request names no grant target");
            return Ok(false);
        };

        let allowed = self.rights().can_do(ident, grant_target, eff_right, as_admin);
        if allowed && !as_admin {
            let own = allowed_send_addresses(target).contains(&address.to_lowercase());
            if !own {
                security_info!(
                    ident = %ident,
                    address,
                    "address is not among the sender's send addresses"
                );
            }
            return Ok(own);
        }
        Ok(allowed)
    }
}
