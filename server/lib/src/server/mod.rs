//! `server` contains the provisioning core, the high level construction that
//! coordinates a mutation from its raw wire form to the point a store may
//! apply it: parse, safeguards, attribute callbacks, schema validation, and
//! the access decision, in that order, failing at the first refusal.

use std::sync::Arc;

use crate::callback::{CallbackContext, CallbackRegistry};
use crate::config::EngineConfig;
use crate::modify::{ModifyList, ModifyValid};
use crate::prelude::*;
use crate::schema::Schema;
use crate::server::access::AccessEngine;
use crate::server::identity::Identity;

pub mod access;
pub mod identity;

/// One requested mutation: who asks, what entry it lands on (`None` while
/// the entry is still being created), and the raw directives.
pub struct ModifyEvent {
    pub ident: Identity,
    pub target: Option<Arc<Entry>>,
    pub request: ModifyRequest,
    pub as_admin: bool,
}

impl ModifyEvent {
    pub fn new(
        ident: Identity,
        target: Option<Arc<Entry>>,
        request: ModifyRequest,
        as_admin: bool,
    ) -> Self {
        ModifyEvent {
            ident,
            target,
            request,
            as_admin,
        }
    }
}

/// A mutation that passed every check. The callback context rides along so
/// the post phase sees what the pre phase recorded.
#[derive(Debug)]
pub struct CheckedModify {
    pub mods: ModifyList<ModifyValid>,
    pub ctx: CallbackContext,
}

/// The provisioning core. Owns the schema store and the injected policy
/// pieces; stateless per request beyond them.
pub struct ProvisionServer {
    schema: Schema,
    registry: Arc<CallbackRegistry>,
    access: Arc<dyn AccessEngine>,
    config: EngineConfig,
}

impl ProvisionServer {
    /// Assemble the core. The embedding server is expected to have called
    /// [`EngineConfig::install`] already if it wants the process-wide
    /// switches the config carries.
    pub fn new(
        schema: Schema,
        registry: Arc<CallbackRegistry>,
        access: Arc<dyn AccessEngine>,
        config: EngineConfig,
    ) -> Self {
        ProvisionServer {
            schema,
            registry,
            access,
            config,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn access(&self) -> &dyn AccessEngine {
        self.access.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Vet a mutation end to end. On success the caller holds a validated
    /// modification list it may apply to its store, plus the context to
    /// hand back to [`post_modify`](ProvisionServer::post_modify) once the
    /// entry is written.
    pub fn check_modify(&self, event: &ModifyEvent) -> Result<CheckedModify, OperationError> {
        if event.request.is_empty() {
            request_error!(ident = %event.ident, "modify request with no directives");
            return Err(OperationError::EmptyRequest);
        }

        let mods = ModifyList::from_request(&event.request)?;

        let schema_read = self.schema.read();
        mods.check_safeguards(&self.config, &schema_read)?;

        let touched = mods.modified_attrs();
        trace!(?touched, "modify request parsed");

        // Callbacks run on the raw list: they may veto, and they may stash
        // state for the post phase, but they see values before the schema
        // has said anything about them.
        let mut ctx = CallbackContext::new(event.target.is_none());
        for attr in touched.iter() {
            if let Some(cb) = self.registry.get(attr) {
                cb.pre_modify(&mut ctx, attr, &mods, event.target.as_deref())?;
            }
        }

        let valid_mods = mods.validate(&schema_read, true).map_err(|e| {
            admin_error!(ident = %event.ident, err = ?e, "modify request failed schema validation");
            OperationError::SchemaViolation(e)
        })?;

        // A creation has no entry to authorize against yet; the caller's
        // create check covers it.
        if let Some(target) = event.target.as_deref() {
            let allowed =
                self.access
                    .can_set_attrs(&event.ident, target, &touched, event.as_admin)?;
            if !allowed {
                security_info!(
                    ident = %event.ident,
                    target = %target.name(),
                    "refusing modification, access denied"
                );
                return Err(OperationError::PermissionDenied(None));
            }
        }

        Ok(CheckedModify {
            mods: valid_mods,
            ctx,
        })
    }

    /// Run the post phase of the registered callbacks against the entry as
    /// written. Post callbacks observe, they cannot fail the operation.
    pub fn post_modify(&self, checked: &CheckedModify, entry: &Entry) {
        for attr in checked.mods.modified_attrs().iter() {
            if let Some(cb) = self.registry.get(attr) {
                cb.post_modify(&checked.ctx, attr, entry);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::access::rights::{DenyAllRights, RightsEngine};
    use super::*;
    use crate::callback::{AttributeCallback, CallbackRegistryBuilder};
    use crate::directory::{Directory, TestDirectory};
    use crate::entry::EntryKind;
    use crate::modify::SingleValueMod;

    struct FixedAccess {
        directory: TestDirectory,
        rights: DenyAllRights,
        grant: bool,
    }

    impl AccessEngine for FixedAccess {
        fn directory(&self) -> &dyn Directory {
            &self.directory
        }

        fn rights(&self) -> &dyn RightsEngine {
            &self.rights
        }

        fn can_access_account(
            &self,
            _ident: &Identity,
            _target: &Entry,
            _as_admin: bool,
        ) -> Result<bool, OperationError> {
            Ok(self.grant)
        }

        fn can_access_domain(
            &self,
            _ident: &Identity,
            _domain_name: &str,
        ) -> Result<bool, OperationError> {
            Ok(self.grant)
        }

        fn can_access_cos(&self, _ident: &Identity, _cos: &Entry) -> Result<bool, OperationError> {
            Ok(self.grant)
        }

        fn can_access_email(
            &self,
            _ident: &Identity,
            _email: &str,
        ) -> Result<bool, OperationError> {
            Ok(self.grant)
        }

        fn can_access_group(
            &self,
            _ident: &Identity,
            _group: &Entry,
        ) -> Result<bool, OperationError> {
            Ok(self.grant)
        }

        fn can_create_group(
            &self,
            _ident: &Identity,
            _group_email: &str,
        ) -> Result<bool, OperationError> {
            Ok(self.grant)
        }

        fn can_modify_mail_quota(
            &self,
            _ident: &Identity,
            _target: &Entry,
            _new_quota: i64,
        ) -> Result<bool, OperationError> {
            Ok(self.grant)
        }

        fn can_do(
            &self,
            _ident: &Identity,
            _target: &Entry,
            _right: &Right,
            _as_admin: bool,
        ) -> bool {
            self.grant
        }

        fn can_get_attrs(
            &self,
            _ident: &Identity,
            _target: &Entry,
            _attrs: &BTreeSet<Attribute>,
            _as_admin: bool,
        ) -> Result<bool, OperationError> {
            Ok(self.grant)
        }

        fn can_set_attrs(
            &self,
            _ident: &Identity,
            _target: &Entry,
            _attrs: &BTreeSet<Attribute>,
            _as_admin: bool,
        ) -> Result<bool, OperationError> {
            Ok(self.grant)
        }
    }

    fn empty_registry() -> CallbackRegistry {
        CallbackRegistryBuilder::new().build()
    }

    fn server_with(grant: bool, registry: CallbackRegistry) -> ProvisionServer {
        ProvisionServer::new(
            Schema::core(),
            Arc::new(registry),
            Arc::new(FixedAccess {
                directory: TestDirectory::new(),
                rights: DenyAllRights,
                grant,
            }),
            EngineConfig::default(),
        )
    }

    fn target_account() -> Arc<Entry> {
        Arc::new(entry_init!(
            EntryKind::Account,
            Uuid::new_v4(),
            (Attribute::Name, "alice@example.com")
        ))
    }

    fn admin_event(request: ModifyRequest, target: Option<Arc<Entry>>) -> ModifyEvent {
        let mut admin = entry_init!(
            EntryKind::Account,
            Uuid::new_v4(),
            (Attribute::Name, "root@example.com")
        );
        admin.add_ava(Attribute::IsAdminAccount, "TRUE");
        ModifyEvent::new(Identity::from_account(Arc::new(admin)), target, request, true)
    }

    #[test]
    fn test_server_empty_request() {
        jotting::test_init();
        let server = server_with(true, empty_registry());
        let event = admin_event(modreq!(), Some(target_account()));
        assert_eq!(
            server.check_modify(&event).err(),
            Some(OperationError::EmptyRequest)
        );
    }

    #[test]
    fn test_server_contradiction_rejected_before_validation() {
        let server = server_with(true, empty_registry());
        // The port value is also schema-invalid; the contradiction must win
        // because parsing happens before any validation.
        let event = admin_event(
            modreq!((ATTR_MAIL_PORT, Some("70000")), ("+mail_port", Some("443"))),
            Some(target_account()),
        );
        let err = server.check_modify(&event).unwrap_err();
        assert!(matches!(err, OperationError::InvalidRequest(_)));
        assert_eq!(
            err.message(),
            Some("contradictory directives for attribute mail_port".to_string())
        );
    }

    #[test]
    fn test_server_safeguard_before_validation() {
        let server = server_with(true, empty_registry());
        // A single-value replacement of a safeguarded attribute, where the
        // value would also fail syntax checks. The safeguard answers first.
        let event = admin_event(
            modreq!((ATTR_MAIL_ALIAS, Some("not-an-address"))),
            Some(target_account()),
        );
        let err = server.check_modify(&event).unwrap_err();
        assert_eq!(
            err.message(),
            Some("replacing all values of mail_alias with a single value".to_string())
        );
    }

    #[test]
    fn test_server_schema_violation() {
        let server = server_with(true, empty_registry());
        let event = admin_event(
            modreq!((ATTR_MAIL_PORT, Some("70000"))),
            Some(target_account()),
        );
        match server.check_modify(&event).unwrap_err() {
            OperationError::SchemaViolation(SchemaError::InvalidAttributeValue(attr, _)) => {
                assert_eq!(attr, "mail_port")
            }
            e => panic!("expected a schema violation, got {:?}", e),
        }

        // In-range ports pass.
        let event = admin_event(
            modreq!((ATTR_MAIL_PORT, Some("443"))),
            Some(target_account()),
        );
        assert!(server.check_modify(&event).is_ok());
    }

    #[test]
    fn test_server_immutable_attribute() {
        let server = server_with(true, empty_registry());
        // Identical to the current value or not, immutable means immutable.
        let event = admin_event(
            modreq!((ATTR_DOMAIN_NAME, Some("example.com"))),
            Some(target_account()),
        );
        match server.check_modify(&event).unwrap_err() {
            OperationError::SchemaViolation(inner) => assert_eq!(
                inner,
                SchemaError::ImmutableAttribute("domain_name".to_string())
            ),
            e => panic!("expected a schema violation, got {:?}", e),
        }
    }

    #[test]
    fn test_server_access_denied() {
        let server = server_with(false, empty_registry());
        let request = modreq!((ATTR_DESCRIPTION, Some("a test account")));

        let event = admin_event(request.clone(), Some(target_account()));
        assert_eq!(
            server.check_modify(&event).err(),
            Some(OperationError::PermissionDenied(None))
        );

        // A creation has no target to authorize against; the access check
        // belongs to the caller's create path.
        let event = admin_event(request, None);
        let checked = server.check_modify(&event).expect("creation refused");
        assert!(checked.ctx.is_creating());
    }

    struct MailStamp {
        post_saw_stamp: AtomicBool,
    }

    impl AttributeCallback for MailStamp {
        fn pre_modify(
            &self,
            ctx: &mut CallbackContext,
            attr: &Attribute,
            mods: &ModifyList<crate::modify::ModifyInvalid>,
            _entry: Option<&Entry>,
        ) -> Result<(), OperationError> {
            if let Some(SingleValueMod::Setting(v)) = mods.single_value_mod(attr)? {
                if v == "reserved@example.com" {
                    return Err(OperationError::InvalidRequest(
                        "address is reserved".to_string(),
                    ));
                }
                ctx.set_data("pending_mail", v);
            }
            Ok(())
        }

        fn post_modify(&self, ctx: &CallbackContext, _attr: &Attribute, _entry: &Entry) {
            if ctx.get_data("pending_mail").is_some() {
                self.post_saw_stamp.store(true, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn test_server_callback_phases() {
        let stamp = Arc::new(MailStamp {
            post_saw_stamp: AtomicBool::new(false),
        });
        let registry = CallbackRegistryBuilder::new()
            .register(Attribute::Mail, stamp.clone())
            .build();
        let server = server_with(true, registry);
        let target = target_account();

        // The pre phase may veto.
        let event = admin_event(
            modreq!((ATTR_MAIL, Some("reserved@example.com"))),
            Some(target.clone()),
        );
        let err = server.check_modify(&event).unwrap_err();
        assert_eq!(err.message(), Some("address is reserved".to_string()));
        assert!(!stamp.post_saw_stamp.load(Ordering::Relaxed));

        // The post phase sees what the pre phase recorded.
        let event = admin_event(
            modreq!((ATTR_MAIL, Some("new@example.com"))),
            Some(target.clone()),
        );
        let checked = server.check_modify(&event).expect("modify refused");
        server.post_modify(&checked, &target);
        assert!(stamp.post_saw_stamp.load(Ordering::Relaxed));
    }
}
