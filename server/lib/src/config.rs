//! Engine configuration. Loaded once at startup (from whatever source the
//! embedding server prefers, serde does the shape) and handed to
//! [`ProvisionServer`](crate::server::ProvisionServer) by value. The only
//! process-wide piece is the deprecated-write override, which the schema
//! validator consults at check time.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;

use crate::prelude::*;

static ALLOW_DEPRECATED_WRITES: AtomicBool = AtomicBool::new(false);

/// Whether writes to deprecated attributes are currently permitted. Off
/// unless [`EngineConfig::install`] turned it on.
pub fn allow_deprecated_writes() -> bool {
    ALLOW_DEPRECATED_WRITES.load(Ordering::Relaxed)
}

fn default_safeguarded_attrs() -> BTreeSet<String> {
    [ATTR_MAIL_ALIAS, ATTR_ALLOW_FROM_ADDRESS, ATTR_CHILD_ACCOUNT]
        .iter()
        .map(|a| a.to_string())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Multi-valued attributes protected against accidental whole-set
    /// replacement with a single value. Names compare case-insensitively.
    #[serde(default = "default_safeguarded_attrs")]
    pub safeguarded_attrs: BTreeSet<String>,
    /// Permit single-value replacement of safeguarded attributes.
    #[serde(default)]
    pub allow_multivalued_replacement: bool,
    /// Permit writes to attributes marked deprecated in the schema.
    #[serde(default)]
    pub allow_deprecated_writes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            safeguarded_attrs: default_safeguarded_attrs(),
            allow_multivalued_replacement: false,
            allow_deprecated_writes: false,
        }
    }
}

impl EngineConfig {
    /// Publish the process-wide switches carried by this config. The
    /// embedding server calls this once at startup, before serving.
    pub fn install(&self) {
        ALLOW_DEPRECATED_WRITES.store(self.allow_deprecated_writes, Ordering::Relaxed);
    }

    pub fn is_safeguarded(&self, attr: &Attribute) -> bool {
        let name: &str = attr.as_ref();
        self.safeguarded_attrs
            .iter()
            .any(|a| a.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert!(config.is_safeguarded(&Attribute::MailAlias));
        assert!(config.is_safeguarded(&Attribute::AllowFromAddress));
        assert!(config.is_safeguarded(&Attribute::ChildAccount));
        assert!(!config.is_safeguarded(&Attribute::Description));
        assert!(!config.allow_multivalued_replacement);
        assert!(!config.allow_deprecated_writes);
    }

    #[test]
    fn test_config_safeguard_case_insensitive() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "safeguarded_attrs": ["Mail_Alias"] }"#)
                .expect("failed to parse config");
        assert!(config.is_safeguarded(&Attribute::MailAlias));
        assert!(!config.is_safeguarded(&Attribute::ChildAccount));
    }
}
