use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::internal::OperationError;
use std::fmt;

pub use smartstring::alias::String as AttrString;

#[derive(
    Serialize, Deserialize, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase", try_from = "&str", into = "AttrString")]
pub enum Attribute {
    AccountStatus,
    AllowFromAddress,
    ChildAccount,
    CosId,
    Description,
    DomainAdminMaxMailQuota,
    DomainCosMaxAccounts,
    DomainId,
    DomainName,
    DomainStatus,
    IsAdminAccount,
    IsDomainAdminAccount,
    Mail,
    MailAlias,
    MailHost,
    MailPort,
    MailQuota,
    #[default]
    Name,
    Custom(AttrString),
}

impl AsRef<str> for Attribute {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<Attribute> for Attribute {
    fn as_ref(&self) -> &Attribute {
        self
    }
}

impl TryFrom<&AttrString> for Attribute {
    type Error = OperationError;

    fn try_from(value: &AttrString) -> Result<Self, Self::Error> {
        Ok(Attribute::from_str(value.as_str()))
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Self::from_str(value)
    }
}

impl<'a> From<&'a Attribute> for &'a str {
    fn from(val: &'a Attribute) -> Self {
        val.as_str()
    }
}

impl From<Attribute> for AttrString {
    fn from(val: Attribute) -> Self {
        AttrString::from(val.as_str())
    }
}

impl Attribute {
    pub fn as_str(&self) -> &str {
        match self {
            Attribute::AccountStatus => ATTR_ACCOUNT_STATUS,
            Attribute::AllowFromAddress => ATTR_ALLOW_FROM_ADDRESS,
            Attribute::ChildAccount => ATTR_CHILD_ACCOUNT,
            Attribute::CosId => ATTR_COS_ID,
            Attribute::Description => ATTR_DESCRIPTION,
            Attribute::DomainAdminMaxMailQuota => ATTR_DOMAIN_ADMIN_MAX_MAIL_QUOTA,
            Attribute::DomainCosMaxAccounts => ATTR_DOMAIN_COS_MAX_ACCOUNTS,
            Attribute::DomainId => ATTR_DOMAIN_ID,
            Attribute::DomainName => ATTR_DOMAIN_NAME,
            Attribute::DomainStatus => ATTR_DOMAIN_STATUS,
            Attribute::IsAdminAccount => ATTR_IS_ADMIN_ACCOUNT,
            Attribute::IsDomainAdminAccount => ATTR_IS_DOMAIN_ADMIN_ACCOUNT,
            Attribute::Mail => ATTR_MAIL,
            Attribute::MailAlias => ATTR_MAIL_ALIAS,
            Attribute::MailHost => ATTR_MAIL_HOST,
            Attribute::MailPort => ATTR_MAIL_PORT,
            Attribute::MailQuota => ATTR_MAIL_QUOTA,
            Attribute::Name => ATTR_NAME,
            Attribute::Custom(value) => value.as_str(),
        }
    }

    // We allow this because the standard lib from_str is fallible, and we want an infallible version.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            ATTR_ACCOUNT_STATUS => Attribute::AccountStatus,
            ATTR_ALLOW_FROM_ADDRESS => Attribute::AllowFromAddress,
            ATTR_CHILD_ACCOUNT => Attribute::ChildAccount,
            ATTR_COS_ID => Attribute::CosId,
            ATTR_DESCRIPTION => Attribute::Description,
            ATTR_DOMAIN_ADMIN_MAX_MAIL_QUOTA => Attribute::DomainAdminMaxMailQuota,
            ATTR_DOMAIN_COS_MAX_ACCOUNTS => Attribute::DomainCosMaxAccounts,
            ATTR_DOMAIN_ID => Attribute::DomainId,
            ATTR_DOMAIN_NAME => Attribute::DomainName,
            ATTR_DOMAIN_STATUS => Attribute::DomainStatus,
            ATTR_IS_ADMIN_ACCOUNT => Attribute::IsAdminAccount,
            ATTR_IS_DOMAIN_ADMIN_ACCOUNT => Attribute::IsDomainAdminAccount,
            ATTR_MAIL => Attribute::Mail,
            ATTR_MAIL_ALIAS => Attribute::MailAlias,
            ATTR_MAIL_HOST => Attribute::MailHost,
            ATTR_MAIL_PORT => Attribute::MailPort,
            ATTR_MAIL_QUOTA => Attribute::MailQuota,
            ATTR_NAME => Attribute::Name,
            _ => Attribute::Custom(AttrString::from(value)),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::Attribute;

    #[test]
    fn test_attribute_from_str() {
        assert_eq!(Attribute::MailAlias, Attribute::from_str("MAIL_ALIAS"));
        assert_eq!(Attribute::MailAlias, Attribute::from_str("Mail_Alias"));
        assert_eq!(Attribute::MailAlias, Attribute::from_str("mail_alias"));
    }

    #[test]
    fn test_attribute_round_trip() {
        let attr = Attribute::from_str("some_vendor_extension");
        assert_eq!(attr.as_str(), "some_vendor_extension");
        assert_eq!(Attribute::DomainStatus.to_string(), "domain_status");
    }
}
