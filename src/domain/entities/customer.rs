use super::ids::CustomerId;

/// Billing-side entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub email_domain: Option<String>,
}

impl Customer {
    pub const SOURCE: &'static str = "Billing";
}
