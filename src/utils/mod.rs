pub mod config;
pub mod custom_error;
