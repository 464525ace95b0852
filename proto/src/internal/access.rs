use serde::{Deserialize, Serialize};
use std::fmt;

/// A named permission evaluated by the rights engine. The send rights are
/// well known because the access engine substitutes the distribution-list
/// variant when the target address resolves to a group.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase", from = "&str", into = "String")]
pub enum Right {
    SendAs,
    SendAsDistList,
    SendOnBehalfOf,
    SendOnBehalfOfDistList,
    Custom(String),
}

impl Right {
    pub fn as_str(&self) -> &str {
        match self {
            Right::SendAs => "send_as",
            Right::SendAsDistList => "send_as_dist_list",
            Right::SendOnBehalfOf => "send_on_behalf_of",
            Right::SendOnBehalfOfDistList => "send_on_behalf_of_dist_list",
            Right::Custom(value) => value.as_str(),
        }
    }
}

impl From<&str> for Right {
    fn from(value: &str) -> Self {
        match value {
            "send_as" => Right::SendAs,
            "send_as_dist_list" => Right::SendAsDistList,
            "send_on_behalf_of" => Right::SendOnBehalfOf,
            "send_on_behalf_of_dist_list" => Right::SendOnBehalfOfDistList,
            _ => Right::Custom(value.to_string()),
        }
    }
}

impl From<Right> for String {
    fn from(val: Right) -> Self {
        val.as_str().to_string()
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Account,
    Cos,
    DistList,
    Group,
    Domain,
    Server,
    Config,
    Global,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum GranteeType {
    User,
    Group,
    Domain,
    All,
    Guest,
    Public,
}

/// Diagnostic record of the grant that decided a rights check. Filled in by
/// `can_do_via` implementations so operators can answer "why was this
/// allowed".
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ViaGrant {
    target_type: Option<TargetType>,
    target_name: Option<String>,
    grantee_type: Option<GranteeType>,
    grantee_name: Option<String>,
    right: Option<String>,
    negative_grant: bool,
}

impl ViaGrant {
    pub fn new() -> Self {
        ViaGrant::default()
    }

    pub fn record(
        &mut self,
        target_type: TargetType,
        target_name: String,
        grantee_type: GranteeType,
        grantee_name: String,
        right: &Right,
        negative_grant: bool,
    ) {
        self.target_type = Some(target_type);
        self.target_name = Some(target_name);
        self.grantee_type = Some(grantee_type);
        self.grantee_name = Some(grantee_name);
        self.right = Some(right.as_str().to_string());
        self.negative_grant = negative_grant;
    }

    pub fn available(&self) -> bool {
        self.target_type.is_some()
    }

    pub fn target_name(&self) -> Option<&str> {
        self.target_name.as_deref()
    }

    pub fn grantee_name(&self) -> Option<&str> {
        self.grantee_name.as_deref()
    }

    pub fn right(&self) -> Option<&str> {
        self.right.as_deref()
    }

    pub fn is_negative_grant(&self) -> bool {
        self.negative_grant
    }
}

/// The outcome of an access check at an API boundary: the verdict plus the
/// grant that produced it, when one was consulted.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessDecision {
    pub allow: bool,
    pub via: Option<ViaGrant>,
}

impl From<bool> for AccessDecision {
    fn from(allow: bool) -> Self {
        AccessDecision { allow, via: None }
    }
}

#[cfg(test)]
mod test {
    use super::{GranteeType, Right, TargetType, ViaGrant};

    #[test]
    fn test_right_round_trip() {
        assert_eq!(Right::from("send_as"), Right::SendAs);
        assert_eq!(
            Right::from("admin_login_as"),
            Right::Custom("admin_login_as".to_string())
        );
        assert_eq!(Right::SendOnBehalfOfDistList.as_str(), "send_on_behalf_of_dist_list");
    }

    #[test]
    fn test_via_grant_availability() {
        let mut via = ViaGrant::new();
        assert!(!via.available());
        via.record(
            TargetType::DistList,
            "staff@example.com".to_string(),
            GranteeType::User,
            "alice@example.com".to_string(),
            &Right::SendAsDistList,
            false,
        );
        assert!(via.available());
        assert_eq!(via.right(), Some("send_as_dist_list"));
        assert!(!via.is_negative_grant());
    }
}
