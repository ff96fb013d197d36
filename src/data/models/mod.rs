pub(crate) mod iso_date_model;
pub(crate) mod money_model;
