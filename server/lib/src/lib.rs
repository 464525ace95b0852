//! The Petreld server library. This implements the provisioning core of the
//! server, which parses attribute mutations, validates them against the
//! schema, and enforces access decisions before anything reaches a store.

#![deny(warnings)]
#![recursion_limit = "512"]
#![warn(unused_extern_crates)]
// Enable some groups of clippy lints.
#![deny(clippy::suspicious)]
#![deny(clippy::perf)]
// Specific lints to enforce.
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::disallowed_types)]
#![deny(clippy::manual_let_else)]
#![allow(clippy::unreachable)]

#[macro_use]
extern crate tracing;
#[macro_use]
extern crate lazy_static;

// This has to be before the other modules so the fixture macros are in
// scope for their tests.
#[cfg(test)]
#[macro_use]
mod macros;

pub mod callback;
pub mod config;
pub mod directory;
pub mod entry;
pub mod modify;
pub mod schema;
pub mod server;
pub mod value;

/// A prelude of imports that should be imported by all other Petrel modules
/// to help make imports cleaner.
pub mod prelude {
    pub use jotting::{
        admin_debug, admin_error, admin_info, admin_warn, perf_trace, request_error, request_info,
        request_trace, request_warn, schema_error, schema_info, schema_trace, schema_warn,
        security_access, security_critical, security_debug, security_error, security_info,
        tagged_event, EventTag,
    };
    pub use petrel_proto::attribute::{AttrString, Attribute};
    pub use petrel_proto::constants::*;
    pub use petrel_proto::internal::{
        AccessDecision, GranteeType, ModifyRequest, OperationError, RawMod, Right, SchemaError,
        TargetType, ViaGrant,
    };
    pub use uuid::{uuid, Uuid};

    pub use crate::callback::{
        AttributeCallback, CallbackContext, CallbackRegistry, CallbackRegistryBuilder,
    };
    pub use crate::config::EngineConfig;
    pub use crate::directory::{AccountBy, Directory, DomainBy};
    pub use crate::entry::{Entry, EntryKind};
    pub use crate::modify::{
        m_add, m_purge, m_remove, m_replace, new_values_to_be, Modify, ModifyInvalid, ModifyList,
        ModifyValid, MultiValueMod, SingleValueMod,
    };
    pub use crate::schema::{Schema, SchemaAttribute, SchemaTransaction};
    pub use crate::server::access::domain::DomainAccessEngine;
    pub use crate::server::access::rights::{DenyAllRights, RightsEngine};
    pub use crate::server::access::{allowed_send_addresses, check_domain_status, AccessEngine};
    pub use crate::server::identity::{AdminScope, IdentType, IdentUser, Identity};
    pub use crate::server::{CheckedModify, ModifyEvent, ProvisionServer};
    pub use crate::value::{DomainStatus, SyntaxType};
}
