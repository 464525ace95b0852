//! Wire types and shared definitions for the petrel provisioning servers.
//! Everything in this crate is serialisable so that the engine, the admin
//! surfaces, and the directory layers agree on one vocabulary.

#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]

pub mod attribute;
pub mod constants;
pub mod internal;
