//! Petrel internal elements
//!
//! Items defined in this module *may* change between releases without notice.

mod access;
mod error;
mod modify;

pub use self::access::*;
pub use self::error::*;
pub use self::modify::*;
