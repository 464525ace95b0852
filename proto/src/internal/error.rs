use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/* ===== errors ===== */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SchemaError {
    AttributeNotFound(String),
    ImmutableAttribute(String),
    DeprecatedAttribute(String),
    SingleValueConstraint(String),
    MissingSyntax(String),
    // Attribute, reason. The reason is operator facing.
    InvalidAttributeValue(String, String),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "lowercase")]
pub enum OperationError {
    EmptyRequest,
    InvalidRequest(String),
    SchemaViolation(SchemaError),
    // Carries the operator facing detail, eg "domain is suspended".
    PermissionDenied(Option<String>),
    NoMatchingEntries,
    Unsupported(String),
    Failure(String),
}

impl PartialEq for OperationError {
    fn eq(&self, other: &Self) -> bool {
        // Generally we only use the PartialEq for TESTING anyway.
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl Display for OperationError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let mut output = format!("{:?}", self)
            .split("::")
            .last()
            .unwrap_or("")
            .to_string();

        if let Some(msg) = self.message() {
            output += &format!(" - {}", msg);
        };
        f.write_str(&output)
    }
}

impl OperationError {
    /// Return the message associated with the error if there is one.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::EmptyRequest => None,
            Self::InvalidRequest(reason) => Some(reason.clone()),
            Self::SchemaViolation(_) => None,
            Self::PermissionDenied(detail) => detail.clone(),
            Self::NoMatchingEntries => None,
            Self::Unsupported(what) => Some(format!("not supported: {}", what)),
            Self::Failure(reason) => Some(reason.clone()),
        }
    }
}

#[test]
fn test_operationerror_as_nice_string() {
    assert_eq!(
        OperationError::EmptyRequest.to_string(),
        "EmptyRequest".to_string()
    );
    assert_eq!(
        OperationError::PermissionDenied(Some("domain is suspended".to_string())).to_string(),
        "PermissionDenied(Some(\"domain is suspended\")) - domain is suspended".to_string()
    );
    assert_eq!(
        OperationError::NoMatchingEntries.to_string(),
        "NoMatchingEntries".to_string()
    );
}
