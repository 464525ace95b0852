//! The domain-scoped access strategy. Decisions come from entry attributes
//! alone: the admin flags, the `domain_id` an entry belongs to, the family
//! `child_account` list, and the per-domain cos and quota grants. A
//! principal with no admin scope and no parent relationship to the target
//! is denied everything here.
//!
//! Grant lists are not consulted here. Operations that need them (the
//! send delegation flow, `can_do`) go through the injected
//! [`RightsEngine`].

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::directory::{AccountBy, Directory};
use crate::prelude::*;
use crate::server::identity::Identity;
use crate::value::split_email;

use super::rights::{DenyAllRights, RightsEngine};
use super::{check_domain_status, AccessEngine};

pub struct DomainAccessEngine {
    directory: Arc<dyn Directory>,
    rights: Arc<dyn RightsEngine>,
}

impl DomainAccessEngine {
    pub fn new(directory: Arc<dyn Directory>, rights: Arc<dyn RightsEngine>) -> Self {
        DomainAccessEngine { directory, rights }
    }

    /// The engine as deployed before grant lists existed: every question
    /// the directory attributes cannot answer is a no.
    pub fn with_deny_all(directory: Arc<dyn Directory>) -> Self {
        Self::new(directory, Arc::new(DenyAllRights))
    }

    fn same_domain(auth: &Entry, target: &Entry) -> bool {
        match (auth.domain_id(), target.domain_id()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Family parents carry their children's ids in `child_account`.
    fn is_parent_of(ident: &Identity, target: &Entry) -> bool {
        ident
            .account()
            .map(|e| {
                e.attribute_equality(Attribute::ChildAccount, &target.get_uuid().to_string())
            })
            .unwrap_or(false)
    }
}

impl AccessEngine for DomainAccessEngine {
    fn directory(&self) -> &dyn Directory {
        self.directory.as_ref()
    }

    fn rights(&self) -> &dyn RightsEngine {
        self.rights.as_ref()
    }

    fn can_access_account(
        &self,
        ident: &Identity,
        target: &Entry,
        as_admin: bool,
    ) -> Result<bool, OperationError> {
        let Some(auth) = ident.account() else {
            security_info!(ident = %ident, "denying account access to non-directory principal");
            return Ok(false);
        };

        // Crossing into another domain runs the status gate on the target's
        // domain. Same-domain access never does.
        let same_domain = Self::same_domain(auth, target);
        if !same_domain {
            if let Some(domain) = self.directory.domain_of(target) {
                check_domain_status(&domain)?;
            }
        }

        if as_admin && ident.is_global_admin() {
            return Ok(true);
        }

        if Self::is_parent_of(ident, target) {
            security_access!(ident = %ident, target = %target.name(), "parent account access");
            return Ok(true);
        }

        if !(as_admin && ident.is_domain_admin()) {
            return Ok(false);
        }

        // Domain admins stop at global admin accounts.
        if target.get_ava_single_bool(Attribute::IsAdminAccount, false) {
            security_info!(
                ident = %ident,
                target = %target.name(),
                "refusing domain admin access to a global admin account"
            );
            return Ok(false);
        }

        Ok(same_domain)
    }

    fn can_access_domain(
        &self,
        ident: &Identity,
        domain_name: &str,
    ) -> Result<bool, OperationError> {
        if !ident.is_directory_user() {
            return Ok(false);
        }

        // The gate applies to everyone, global admins included.
        if let Some(domain) = self.directory.domain_by_name(domain_name) {
            check_domain_status(&domain)?;
        }

        if ident.is_global_admin() {
            return Ok(true);
        }
        if !ident.is_domain_admin() {
            return Ok(false);
        }

        let own = ident
            .account()
            .and_then(|e| self.directory.domain_of(e))
            .map(|d| d.name().eq_ignore_ascii_case(domain_name))
            .unwrap_or(false);
        Ok(own)
    }

    fn can_access_cos(&self, ident: &Identity, cos: &Entry) -> Result<bool, OperationError> {
        if !ident.is_directory_user() {
            return Ok(false);
        }
        if ident.is_global_admin() {
            return Ok(true);
        }
        if !ident.is_domain_admin() {
            return Ok(false);
        }

        let Some(domain) = ident.account().and_then(|e| self.directory.domain_of(e)) else {
            return Ok(false);
        };

        // A domain admin may use the classes of service listed in the
        // domain's `cos-id:limit` grants. Malformed elements are skipped.
        let cos_id = cos.get_uuid().to_string();
        let allowed = domain
            .get_ava(Attribute::DomainCosMaxAccounts)
            .map(|vs| {
                vs.iter().any(|v| {
                    let parts: Vec<&str> = v.split(':').collect();
                    parts.len() == 2 && parts[0] == cos_id
                })
            })
            .unwrap_or(false);
        Ok(allowed)
    }

    fn can_access_email(&self, ident: &Identity, email: &str) -> Result<bool, OperationError> {
        let Some((_, domain_part)) = split_email(email) else {
            return Err(OperationError::InvalidRequest(format!(
                "invalid email address {}",
                email
            )));
        };

        if let Some(account) = self.directory.account_by(AccountBy::Name(email)) {
            if Self::is_parent_of(ident, &account) {
                return Ok(true);
            }
        }

        self.can_access_domain(ident, domain_part)
    }

    fn can_access_group(&self, _ident: &Identity, _group: &Entry) -> Result<bool, OperationError> {
        // Group grants arrived with the ACL engine; this strategy predates
        // them.
        Ok(false)
    }

    fn can_create_group(
        &self,
        _ident: &Identity,
        _group_email: &str,
    ) -> Result<bool, OperationError> {
        Ok(false)
    }

    fn can_modify_mail_quota(
        &self,
        ident: &Identity,
        target: &Entry,
        new_quota: i64,
    ) -> Result<bool, OperationError> {
        if !self.can_access_account_admin(ident, target)? {
            return Ok(false);
        }
        if ident.is_global_admin() {
            return Ok(true);
        }
        let Some(auth) = ident.account() else {
            return Ok(false);
        };

        // 0 grants unlimited quota changes, -1 (unset) grants none. A
        // requested quota of 0 means unlimited and needs the 0 grant.
        let max = auth.get_ava_single_i64(Attribute::DomainAdminMaxMailQuota, -1);
        if max == 0 {
            return Ok(true);
        }
        if max == -1 || new_quota == 0 || new_quota > max {
            admin_warn!(
                admin = %ident,
                account = %target.name(),
                quota = new_quota,
                max_quota = max,
                "invalid attempt to change quota"
            );
            return Ok(false);
        }
        Ok(true)
    }

    fn can_do(&self, _ident: &Identity, _target: &Entry, _right: &Right, _as_admin: bool) -> bool {
        false
    }

    fn can_get_attrs(
        &self,
        _ident: &Identity,
        _target: &Entry,
        _attrs: &BTreeSet<Attribute>,
        _as_admin: bool,
    ) -> Result<bool, OperationError> {
        Ok(false)
    }

    fn can_set_attrs(
        &self,
        _ident: &Identity,
        _target: &Entry,
        _attrs: &BTreeSet<Attribute>,
        _as_admin: bool,
    ) -> Result<bool, OperationError> {
        Ok(false)
    }
}
