//! Attribute names and well-known values, shared between the engine and
//! every admin surface.

pub const ATTR_ACCOUNT_STATUS: &str = "account_status";
pub const ATTR_ALLOW_FROM_ADDRESS: &str = "allow_from_address";
pub const ATTR_CHILD_ACCOUNT: &str = "child_account";
pub const ATTR_COS_ID: &str = "cos_id";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_DOMAIN_ADMIN_MAX_MAIL_QUOTA: &str = "domain_admin_max_mail_quota";
pub const ATTR_DOMAIN_COS_MAX_ACCOUNTS: &str = "domain_cos_max_accounts";
pub const ATTR_DOMAIN_ID: &str = "domain_id";
pub const ATTR_DOMAIN_NAME: &str = "domain_name";
pub const ATTR_DOMAIN_STATUS: &str = "domain_status";
pub const ATTR_IS_ADMIN_ACCOUNT: &str = "is_admin_account";
pub const ATTR_IS_DOMAIN_ADMIN_ACCOUNT: &str = "is_domain_admin_account";
pub const ATTR_MAIL: &str = "mail";
pub const ATTR_MAIL_ALIAS: &str = "mail_alias";
pub const ATTR_MAIL_HOST: &str = "mail_host";
pub const ATTR_MAIL_PORT: &str = "mail_port";
pub const ATTR_MAIL_QUOTA: &str = "mail_quota";
pub const ATTR_NAME: &str = "name";

/// Boolean attribute values keep their legacy wire form.
pub const BOOL_TRUE: &str = "TRUE";
pub const BOOL_FALSE: &str = "FALSE";
