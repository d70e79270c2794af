pub mod catalog;
pub mod file;
pub mod table_store;
