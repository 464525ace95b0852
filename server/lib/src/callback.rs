//! Per-attribute callbacks. Some attributes need checks or bookkeeping that
//! go beyond value syntax, so a callback can be attached to an attribute
//! name. The pre phase runs before schema validation and may veto the
//! request; the post phase runs after the caller has persisted the change.
//! Registration happens once at startup through the builder, after which
//! the table is immutable and shared for the process lifetime.

use std::collections::BTreeMap;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::modify::{ModifyInvalid, ModifyList};
use crate::prelude::*;

/// Scratch state carried from the pre phase to the post phase of one
/// request.
#[derive(Debug, Default)]
pub struct CallbackContext {
    data: BTreeMap<String, String>,
    creating: bool,
}

impl CallbackContext {
    pub fn new(creating: bool) -> Self {
        CallbackContext {
            data: BTreeMap::new(),
            creating,
        }
    }

    /// True when the request creates a new entry rather than modifying an
    /// existing one.
    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn set_data(&mut self, key: &str, value: impl Into<String>) {
        self.data.insert(key.to_string(), value.into());
    }

    pub fn get_data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|v| v.as_str())
    }
}

pub trait AttributeCallback: Send + Sync {
    /// Runs before schema validation. An error vetoes the whole request.
    /// `entry` is the current target, absent on creation.
    fn pre_modify(
        &self,
        ctx: &mut CallbackContext,
        attr: &Attribute,
        list: &ModifyList<ModifyInvalid>,
        entry: Option<&Entry>,
    ) -> Result<(), OperationError>;

    /// Runs after the caller has persisted the change. Must not fail, the
    /// write has already happened.
    fn post_modify(&self, ctx: &CallbackContext, attr: &Attribute, entry: &Entry);
}

/// The immutable attribute-to-callback table.
pub struct CallbackRegistry {
    callbacks: HashMap<Attribute, Arc<dyn AttributeCallback>>,
}

impl CallbackRegistry {
    pub fn get(&self, attr: &Attribute) -> Option<&dyn AttributeCallback> {
        self.callbacks.get(attr).map(|cb| cb.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }
}

#[derive(Default)]
pub struct CallbackRegistryBuilder {
    callbacks: HashMap<Attribute, Arc<dyn AttributeCallback>>,
}

impl CallbackRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a callback to an attribute. A later registration for the same
    /// attribute replaces the earlier one.
    pub fn register(mut self, attr: Attribute, cb: Arc<dyn AttributeCallback>) -> Self {
        self.callbacks.insert(attr, cb);
        self
    }

    pub fn build(self) -> CallbackRegistry {
        CallbackRegistry {
            callbacks: self.callbacks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modify::m_replace;

    struct RefuseValue {
        value: &'static str,
    }

    impl AttributeCallback for RefuseValue {
        fn pre_modify(
            &self,
            ctx: &mut CallbackContext,
            attr: &Attribute,
            list: &ModifyList<ModifyInvalid>,
            _entry: Option<&Entry>,
        ) -> Result<(), OperationError> {
            ctx.set_data("checked_attr", attr.as_str());
            match list.single_value_mod(attr)? {
                Some(crate::modify::SingleValueMod::Setting(v)) if v == self.value => Err(
                    OperationError::InvalidRequest(format!("{} may not be {}", attr, v)),
                ),
                _ => Ok(()),
            }
        }

        fn post_modify(&self, _ctx: &CallbackContext, _attr: &Attribute, _entry: &Entry) {}
    }

    #[test]
    fn test_callback_registry_lookup() {
        let registry = CallbackRegistryBuilder::new()
            .register(
                Attribute::MailHost,
                Arc::new(RefuseValue { value: "localhost" }),
            )
            .build();
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&Attribute::MailHost).is_some());
        assert!(registry.get(&Attribute::MailPort).is_none());
    }

    #[test]
    fn test_callback_veto_and_context() {
        let registry = CallbackRegistryBuilder::new()
            .register(
                Attribute::MailHost,
                Arc::new(RefuseValue { value: "localhost" }),
            )
            .build();
        let cb = registry
            .get(&Attribute::MailHost)
            .expect("callback not registered");

        let mut ctx = CallbackContext::new(false);
        let bad = ModifyList::new_list(vec![m_replace(Attribute::MailHost, &["localhost"])]);
        assert!(cb
            .pre_modify(&mut ctx, &Attribute::MailHost, &bad, None)
            .is_err());
        assert_eq!(ctx.get_data("checked_attr"), Some("mail_host"));
        assert!(!ctx.is_creating());

        let mut ctx = CallbackContext::new(true);
        let good =
            ModifyList::new_list(vec![m_replace(Attribute::MailHost, &["mail.example.com"])]);
        assert!(cb
            .pre_modify(&mut ctx, &Attribute::MailHost, &good, None)
            .is_ok());
        assert!(ctx.is_creating());
    }
}
