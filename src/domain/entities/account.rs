use super::ids::AccountId;

/// CRM-side entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub account_id: AccountId,
    pub account_name: String,
    pub email_domain: Option<String>,
}

impl Account {
    pub const SOURCE: &'static str = "CRM";
}
