pub(crate) mod records_repository_impl;
