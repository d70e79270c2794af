pub mod engine;
pub mod executor;
pub mod parser;
pub mod schema;
pub mod types;
