//! Value level checks and shared value vocabulary. Attribute values stay in
//! their string wire form throughout the engine; this module holds the
//! syntax identifiers, the compiled patterns behind them, and the parsers
//! for the value shapes that carry structure (durations, addresses, domain
//! statuses).

use std::fmt;

use num_enum::TryFromPrimitive;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    pub static ref ID_RE: Regex = {
        #[allow(clippy::expect_used)]
        Regex::new("^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("Invalid id regex found")
    };

    pub static ref GENERALIZED_TIME_RE: Regex = {
        #[allow(clippy::expect_used)]
        Regex::new(r"^\d{14}(\.\d{1,3})?[zZ]$").expect("Invalid generalized time regex found")
    };

    // A single magnitude with at most one trailing unit. Compounds like
    // 1h30m are not durations on the wire.
    pub static ref DURATION_RE: Regex = {
        #[allow(clippy::expect_used)]
        Regex::new(r"^(\d+)([hmsd]|ms)?$").expect("Invalid duration regex found")
    };

    pub static ref VALIDATE_EMAIL_RE: Regex = {
        #[allow(clippy::expect_used)]
        Regex::new(r"^[a-zA-Z0-9.!#$%&'*+=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
            .expect("Invalid email regex found")
    };
}

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    PartialOrd,
    Ord,
    Deserialize,
    Serialize,
    TryFromPrimitive,
    Default,
)]
#[repr(u16)]
pub enum SyntaxType {
    #[default]
    Utf8String = 0,
    AsciiString = 1,
    OctetString = 2,
    CaseSensitiveString = 3,
    Boolean = 4,
    Binary = 5,
    Certificate = 6,
    Duration = 7,
    EmailAddress = 8,
    EmailAddressPermissive = 9,
    EmailAddressList = 10,
    Enum = 11,
    GeneralizedTime = 12,
    Id = 13,
    Integer = 14,
    Long = 15,
    Port = 16,
    Phone = 17,
    Regex = 18,
}

impl TryFrom<&str> for SyntaxType {
    type Error = ();

    fn try_from(value: &str) -> Result<SyntaxType, Self::Error> {
        let n_value = value.to_uppercase();
        match n_value.as_str() {
            "UTF8STRING" => Ok(SyntaxType::Utf8String),
            "ASCIISTRING" => Ok(SyntaxType::AsciiString),
            "OCTETSTRING" => Ok(SyntaxType::OctetString),
            "CASE_SENSITIVE_STRING" => Ok(SyntaxType::CaseSensitiveString),
            "BOOLEAN" => Ok(SyntaxType::Boolean),
            "BINARY" => Ok(SyntaxType::Binary),
            "CERTIFICATE" => Ok(SyntaxType::Certificate),
            "DURATION" => Ok(SyntaxType::Duration),
            "EMAIL_ADDRESS" => Ok(SyntaxType::EmailAddress),
            "EMAIL_ADDRESS_PERMISSIVE" => Ok(SyntaxType::EmailAddressPermissive),
            "EMAIL_ADDRESS_LIST" => Ok(SyntaxType::EmailAddressList),
            "ENUM" => Ok(SyntaxType::Enum),
            "GENERALIZED_TIME" => Ok(SyntaxType::GeneralizedTime),
            "ID" => Ok(SyntaxType::Id),
            "INTEGER" => Ok(SyntaxType::Integer),
            "LONG" => Ok(SyntaxType::Long),
            "PORT" => Ok(SyntaxType::Port),
            "PHONE" => Ok(SyntaxType::Phone),
            "REGEX" => Ok(SyntaxType::Regex),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SyntaxType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            SyntaxType::Utf8String => "UTF8STRING",
            SyntaxType::AsciiString => "ASCIISTRING",
            SyntaxType::OctetString => "OCTETSTRING",
            SyntaxType::CaseSensitiveString => "CASE_SENSITIVE_STRING",
            SyntaxType::Boolean => "BOOLEAN",
            SyntaxType::Binary => "BINARY",
            SyntaxType::Certificate => "CERTIFICATE",
            SyntaxType::Duration => "DURATION",
            SyntaxType::EmailAddress => "EMAIL_ADDRESS",
            SyntaxType::EmailAddressPermissive => "EMAIL_ADDRESS_PERMISSIVE",
            SyntaxType::EmailAddressList => "EMAIL_ADDRESS_LIST",
            SyntaxType::Enum => "ENUM",
            SyntaxType::GeneralizedTime => "GENERALIZED_TIME",
            SyntaxType::Id => "ID",
            SyntaxType::Integer => "INTEGER",
            SyntaxType::Long => "LONG",
            SyntaxType::Port => "PORT",
            SyntaxType::Phone => "PHONE",
            SyntaxType::Regex => "REGEX",
        })
    }
}

/// Parse a wire duration into milliseconds. No unit means seconds. Returns
/// None when the shape is wrong or the magnitude overflows.
pub fn parse_duration_millis(raw: &str) -> Option<i64> {
    let caps = DURATION_RE.captures(raw)?;
    let magnitude: i64 = caps.get(1)?.as_str().parse().ok()?;
    let scale = match caps.get(2).map(|m| m.as_str()) {
        Some("ms") => 1,
        Some("s") | None => 1_000,
        Some("m") => 60_000,
        Some("h") => 3_600_000,
        Some("d") => 86_400_000,
        _ => return None,
    };
    magnitude.checked_mul(scale)
}

/// Shape check for mail addresses. The permissive form only demands
/// `local@domain` with both sides present and no whitespace, which is what
/// the allow-from and alias attributes historically accepted.
pub fn validate_email_address(addr: &str, permissive: bool) -> bool {
    if permissive {
        match split_email(addr) {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !addr.chars().any(|c| c.is_whitespace() || c.is_control())
            }
            None => false,
        }
    } else {
        VALIDATE_EMAIL_RE.is_match(addr)
    }
}

/// Split an address into local part and domain. None when there is no `@`,
/// more than one `@`, or either side is empty.
pub fn split_email(addr: &str) -> Option<(&str, &str)> {
    let (local, domain) = addr.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        None
    } else {
        Some((local, domain))
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DomainStatus {
    Active,
    Closed,
    Locked,
    Maintenance,
    Suspended,
    Shutdown,
}

impl TryFrom<&str> for DomainStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<DomainStatus, Self::Error> {
        match value {
            "active" => Ok(DomainStatus::Active),
            "closed" => Ok(DomainStatus::Closed),
            "locked" => Ok(DomainStatus::Locked),
            "maintenance" => Ok(DomainStatus::Maintenance),
            "suspended" => Ok(DomainStatus::Suspended),
            "shutdown" => Ok(DomainStatus::Shutdown),
            _ => Err(()),
        }
    }
}

impl DomainStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DomainStatus::Active => "active",
            DomainStatus::Closed => "closed",
            DomainStatus::Locked => "locked",
            DomainStatus::Maintenance => "maintenance",
            DomainStatus::Suspended => "suspended",
            DomainStatus::Shutdown => "shutdown",
        }
    }

    /// Suspended and shutdown domains refuse provisioning traffic.
    pub fn is_serving(self) -> bool {
        !matches!(self, DomainStatus::Suspended | DomainStatus::Shutdown)
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_duration_parse() {
        assert_eq!(parse_duration_millis("90"), Some(90_000));
        assert_eq!(parse_duration_millis("90s"), Some(90_000));
        assert_eq!(parse_duration_millis("250ms"), Some(250));
        assert_eq!(parse_duration_millis("2m"), Some(120_000));
        assert_eq!(parse_duration_millis("3h"), Some(10_800_000));
        assert_eq!(parse_duration_millis("1d"), Some(86_400_000));
        // Compounds and junk are not durations.
        assert_eq!(parse_duration_millis("1h30m"), None);
        assert_eq!(parse_duration_millis("h"), None);
        assert_eq!(parse_duration_millis("-30s"), None);
        assert_eq!(parse_duration_millis(""), None);
    }

    #[test]
    fn test_value_generalized_time_shape() {
        assert!(GENERALIZED_TIME_RE.is_match("20250101120000Z"));
        assert!(GENERALIZED_TIME_RE.is_match("20250101120000.123z"));
        assert!(!GENERALIZED_TIME_RE.is_match("20250101120000"));
        assert!(!GENERALIZED_TIME_RE.is_match("2025-01-01T12:00:00Z"));
        assert!(!GENERALIZED_TIME_RE.is_match("20250101120000.1234Z"));
    }

    #[test]
    fn test_value_id_shape() {
        assert!(ID_RE.is_match("3b6b42da-1bd8-4f95-8d3f-3a44a9e08495"));
        assert!(ID_RE.is_match("3B6B42DA-1BD8-4F95-8D3F-3A44A9E08495"));
        assert!(!ID_RE.is_match("3b6b42da-1bd8-4f95-8d3f"));
        assert!(!ID_RE.is_match("3b6b42da1bd84f958d3f3a44a9e08495"));
    }

    #[test]
    fn test_value_email_shapes() {
        assert!(validate_email_address("alice@example.com", false));
        assert!(!validate_email_address("alice@", false));
        assert!(!validate_email_address("alice", false));
        // The permissive form tolerates local parts the strict form refuses.
        assert!(!validate_email_address("\"quoted\"@example.com", false));
        assert!(validate_email_address("\"quoted\"@example.com", true));
        assert!(!validate_email_address("a b@example.com", true));
        assert!(!validate_email_address("@example.com", true));
    }

    #[test]
    fn test_value_split_email() {
        assert_eq!(
            split_email("alice@example.com"),
            Some(("alice", "example.com"))
        );
        assert_eq!(split_email("alice"), None);
        assert_eq!(split_email("alice@"), None);
        assert_eq!(split_email("a@b@c"), None);
    }

    #[test]
    fn test_value_domain_status() {
        assert_eq!(DomainStatus::try_from("shutdown"), Ok(DomainStatus::Shutdown));
        assert!(DomainStatus::try_from("SHUTDOWN").is_err());
        assert!(DomainStatus::Active.is_serving());
        assert!(DomainStatus::Locked.is_serving());
        assert!(!DomainStatus::Suspended.is_serving());
        assert!(!DomainStatus::Shutdown.is_serving());
    }
}
