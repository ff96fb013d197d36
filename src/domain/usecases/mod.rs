pub(crate) mod analyze_usecase;
pub(crate) mod export_usecase;
pub(crate) mod identity_usecase;
pub(crate) mod query_usecase;
pub(crate) mod validate_usecase;
