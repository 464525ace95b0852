//! [`Schema`] is the set of rules the directory enforces on attribute
//! values before a modification is considered for commit. Every attribute
//! carries a definition naming its value syntax, multiplicity, and
//! mutability flags. The store is concurrently readable and transactionally
//! writable so that a long validation pass always sees a consistent
//! generation of definitions.
//!
//! Validation here is purely value-level. Whether the *principal* may touch
//! an attribute at all is the access engine's question, not the schema's.

use std::collections::BTreeSet;

use base64::{engine::general_purpose, Engine as _};
use concread::cowcell::*;
use hashbrown::HashMap;
use regex::Regex;

use crate::config;
use crate::prelude::*;
use crate::value::{parse_duration_millis, validate_email_address, SyntaxType};
use crate::value::{GENERALIZED_TIME_RE, ID_RE};

/// The definition of one attribute: its syntax, multiplicity, and flags.
///
/// `min`/`max` bound the parsed value for numeric syntaxes, the millisecond
/// magnitude for durations, the decoded byte length for binary syntaxes,
/// and the raw byte length for string syntaxes. Both bounds are inclusive.
#[derive(Debug, Clone)]
pub struct SchemaAttribute {
    pub name: Attribute,
    pub description: String,
    pub multivalue: bool,
    pub immutable: bool,
    pub deprecated: bool,
    pub syntax: SyntaxType,
    pub min: i64,
    pub max: i64,
    /// Permitted values for the `Enum` syntax. Membership is case-sensitive.
    pub enum_values: BTreeSet<String>,
    /// Compiled pattern for the `Regex` syntax. Must match the whole value.
    pub pattern: Option<Regex>,
}

impl Default for SchemaAttribute {
    fn default() -> Self {
        SchemaAttribute {
            name: Attribute::default(),
            description: String::new(),
            multivalue: false,
            immutable: false,
            deprecated: false,
            syntax: SyntaxType::default(),
            min: i64::MIN,
            max: i64::MAX,
            enum_values: BTreeSet::new(),
            pattern: None,
        }
    }
}

impl SchemaAttribute {
    fn invalid(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidAttributeValue(self.name.to_string(), reason.into())
    }

    fn check_length(&self, value: &str) -> Result<(), SchemaError> {
        if value.len() as i64 > self.max {
            Err(self.invalid(format!("value exceeds {} bytes", self.max)))
        } else {
            Ok(())
        }
    }

    /// Check one value against this definition's syntax and bounds. Empty
    /// values pass: an empty string means "unset" at the directive layer
    /// and never reaches per-syntax checks.
    pub fn validate_value(&self, value: &str) -> Result<(), SchemaError> {
        if value.is_empty() {
            return Ok(());
        }
        match self.syntax {
            SyntaxType::Boolean => {
                if value == BOOL_TRUE || value == BOOL_FALSE {
                    Ok(())
                } else {
                    Err(self.invalid(format!("must be {} or {}", BOOL_TRUE, BOOL_FALSE)))
                }
            }
            SyntaxType::Binary | SyntaxType::Certificate => {
                let decoded = general_purpose::STANDARD
                    .decode(value)
                    .map_err(|_| self.invalid("not valid base64 content"))?;
                if decoded.len() as i64 > self.max {
                    Err(self.invalid(format!("decoded content exceeds {} bytes", self.max)))
                } else {
                    Ok(())
                }
            }
            SyntaxType::Duration => {
                let millis = parse_duration_millis(value)
                    .ok_or_else(|| self.invalid("not a valid duration"))?;
                if millis < self.min || millis > self.max {
                    Err(self.invalid(format!(
                        "duration must be between {}ms and {}ms",
                        self.min, self.max
                    )))
                } else {
                    Ok(())
                }
            }
            SyntaxType::EmailAddress | SyntaxType::EmailAddressPermissive => {
                self.check_length(value)?;
                let permissive = self.syntax == SyntaxType::EmailAddressPermissive;
                if validate_email_address(value, permissive) {
                    Ok(())
                } else {
                    Err(self.invalid("not a valid email address"))
                }
            }
            SyntaxType::EmailAddressList => {
                self.check_length(value)?;
                if value
                    .split(',')
                    .map(str::trim)
                    .all(|addr| validate_email_address(addr, true))
                {
                    Ok(())
                } else {
                    Err(self.invalid("not a valid list of email addresses"))
                }
            }
            SyntaxType::Enum => {
                if self.enum_values.contains(value) {
                    Ok(())
                } else {
                    Err(self.invalid(format!("must be one of {:?}", self.enum_values)))
                }
            }
            SyntaxType::GeneralizedTime => {
                if GENERALIZED_TIME_RE.is_match(value) {
                    Ok(())
                } else {
                    Err(self.invalid("not a valid generalized time"))
                }
            }
            SyntaxType::Id => {
                if ID_RE.is_match(value) {
                    Ok(())
                } else {
                    Err(self.invalid("not a valid id"))
                }
            }
            SyntaxType::Integer => match value.parse::<i32>() {
                Ok(v) if (v as i64) >= self.min && (v as i64) <= self.max => Ok(()),
                Ok(_) => Err(self.invalid(format!(
                    "value must be between {} and {}",
                    self.min, self.max
                ))),
                Err(_) => Err(self.invalid("not a valid integer")),
            },
            SyntaxType::Long => match value.parse::<i64>() {
                Ok(v) if v >= self.min && v <= self.max => Ok(()),
                Ok(_) => Err(self.invalid(format!(
                    "value must be between {} and {}",
                    self.min, self.max
                ))),
                Err(_) => Err(self.invalid("not a valid long")),
            },
            // Ports ignore min/max, the bound is the protocol's.
            SyntaxType::Port => match value.parse::<i64>() {
                Ok(v) if (0..=65535).contains(&v) => Ok(()),
                Ok(_) => Err(self.invalid("port must be between 0 and 65535")),
                Err(_) => Err(self.invalid("not a valid port")),
            },
            SyntaxType::Utf8String
            | SyntaxType::OctetString
            | SyntaxType::CaseSensitiveString
            | SyntaxType::Phone => self.check_length(value),
            SyntaxType::AsciiString => {
                self.check_length(value)?;
                if value.is_ascii() {
                    Ok(())
                } else {
                    Err(self.invalid("contains non-ascii content"))
                }
            }
            SyntaxType::Regex => match &self.pattern {
                Some(re) => {
                    let whole = re
                        .find(value)
                        .map(|m| m.start() == 0 && m.end() == value.len())
                        .unwrap_or(false);
                    if whole {
                        Ok(())
                    } else {
                        Err(self.invalid("does not match the required pattern"))
                    }
                }
                None => Err(SchemaError::MissingSyntax(self.name.to_string())),
            },
        }
    }

    /// The full per-attribute check used by the modify path. Immutability is
    /// checked first, before any value is looked at, so an immutable
    /// attribute rejects even a no-op rewrite. The deprecation check runs
    /// last and consults the process-wide override at check time, so an
    /// unset of a deprecated attribute always passes.
    pub fn validate_ava(
        &self,
        values: Option<&[String]>,
        check_immutable: bool,
    ) -> Result<(), SchemaError> {
        if check_immutable && self.immutable {
            return Err(SchemaError::ImmutableAttribute(self.name.to_string()));
        }

        let values = match values {
            Some(vs) if !vs.is_empty() => vs,
            _ => return Ok(()),
        };

        if !self.multivalue && values.len() > 1 {
            return Err(SchemaError::SingleValueConstraint(self.name.to_string()));
        }

        values.iter().try_for_each(|v| self.validate_value(v))?;

        if self.deprecated && !config::allow_deprecated_writes() {
            return Err(SchemaError::DeprecatedAttribute(self.name.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SchemaInner {
    attributes: HashMap<Attribute, SchemaAttribute>,
}

pub trait SchemaTransaction {
    fn get_attributes(&self) -> &HashMap<Attribute, SchemaAttribute>;

    fn get_attribute(&self, attr: &Attribute) -> Option<&SchemaAttribute> {
        self.get_attributes().get(attr)
    }
}

pub struct SchemaWriteTransaction<'a> {
    inner: CowCellWriteTxn<'a, SchemaInner>,
}

impl SchemaTransaction for SchemaWriteTransaction<'_> {
    fn get_attributes(&self) -> &HashMap<Attribute, SchemaAttribute> {
        &self.inner.attributes
    }
}

impl SchemaWriteTransaction<'_> {
    /// Insert or replace attribute definitions by name.
    pub fn update_attributes(&mut self, attributes: Vec<SchemaAttribute>) {
        for sa in attributes {
            self.inner.attributes.insert(sa.name.clone(), sa);
        }
    }

    pub fn commit(self) -> Result<(), OperationError> {
        trace!("schema commit");
        self.inner.commit();
        Ok(())
    }
}

pub struct SchemaReadTransaction {
    inner: CowCellReadTxn<SchemaInner>,
}

impl SchemaTransaction for SchemaReadTransaction {
    fn get_attributes(&self) -> &HashMap<Attribute, SchemaAttribute> {
        &self.inner.attributes
    }
}

/// The attribute definition store. Readers take a point-in-time snapshot;
/// a single writer prepares the next generation and publishes it on commit.
pub struct Schema {
    inner: CowCell<SchemaInner>,
}

impl Schema {
    /// A schema holding the built-in attribute definitions.
    pub fn core() -> Self {
        let attributes = core_attribute_set()
            .into_iter()
            .map(|sa| (sa.name.clone(), sa))
            .collect();
        Schema {
            inner: CowCell::new(SchemaInner { attributes }),
        }
    }

    pub fn read(&self) -> SchemaReadTransaction {
        SchemaReadTransaction {
            inner: self.inner.read(),
        }
    }

    pub fn write(&self) -> SchemaWriteTransaction<'_> {
        SchemaWriteTransaction {
            inner: self.inner.write(),
        }
    }
}

fn status_values<const N: usize>(names: [&str; N]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// The built-in attribute definitions.
fn core_attribute_set() -> Vec<SchemaAttribute> {
    vec![
        SchemaAttribute {
            name: Attribute::Name,
            description: "The primary name of the entry. Renames are a separate operation."
                .to_string(),
            immutable: true,
            max: 255,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::Description,
            description: "Free form description of the entry.".to_string(),
            multivalue: true,
            max: 1024,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::AccountStatus,
            description: "Lifecycle status of an account.".to_string(),
            syntax: SyntaxType::Enum,
            enum_values: status_values([
                "active",
                "closed",
                "locked",
                "lockout",
                "maintenance",
                "pending",
            ]),
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::DomainId,
            description: "Id of the domain the entry belongs to.".to_string(),
            immutable: true,
            syntax: SyntaxType::Id,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::DomainName,
            description: "Name of the domain the entry belongs to.".to_string(),
            immutable: true,
            max: 255,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::DomainStatus,
            description: "Lifecycle status of a domain.".to_string(),
            syntax: SyntaxType::Enum,
            enum_values: status_values([
                "active",
                "closed",
                "locked",
                "maintenance",
                "suspended",
                "shutdown",
            ]),
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::Mail,
            description: "Addresses of the entry, primary first.".to_string(),
            multivalue: true,
            syntax: SyntaxType::EmailAddress,
            max: 255,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::MailAlias,
            description: "Alias addresses delivered to this entry.".to_string(),
            multivalue: true,
            syntax: SyntaxType::EmailAddressPermissive,
            max: 255,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::AllowFromAddress,
            description: "External addresses this account may send as.".to_string(),
            multivalue: true,
            syntax: SyntaxType::EmailAddressPermissive,
            max: 255,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::ChildAccount,
            description: "Ids of accounts this account is the family parent of.".to_string(),
            multivalue: true,
            syntax: SyntaxType::Id,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::MailQuota,
            description: "Mailbox quota in bytes. Zero means unlimited.".to_string(),
            syntax: SyntaxType::Long,
            min: 0,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::MailHost,
            description: "Hostname of the server holding the mailbox.".to_string(),
            syntax: SyntaxType::AsciiString,
            max: 255,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::MailPort,
            description: "Submission port on the mailbox server.".to_string(),
            syntax: SyntaxType::Port,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::IsAdminAccount,
            description: "Marks a global administrator account.".to_string(),
            syntax: SyntaxType::Boolean,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::IsDomainAdminAccount,
            description: "Marks a domain administrator account.".to_string(),
            syntax: SyntaxType::Boolean,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::DomainAdminMaxMailQuota,
            description: "Largest quota a domain admin may grant. Zero means no limit."
                .to_string(),
            syntax: SyntaxType::Long,
            min: 0,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::DomainCosMaxAccounts,
            description: "cos-id:limit pairs naming the classes of service usable in a domain."
                .to_string(),
            multivalue: true,
            max: 255,
            ..Default::default()
        },
        SchemaAttribute {
            name: Attribute::CosId,
            description: "Id of the class of service assigned to an account.".to_string(),
            syntax: SyntaxType::Id,
            ..Default::default()
        },
    ]
}
