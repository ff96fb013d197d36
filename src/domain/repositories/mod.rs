pub mod records_repository;
