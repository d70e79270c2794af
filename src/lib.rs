pub mod sql;
pub mod storage;
pub mod utils;

pub use utils::custom_error;
pub use sql::engine::{execute, Session, Store};
pub use sql::executor::ResultSet;
