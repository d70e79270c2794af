use std::io::Error;
use std::sync::{Arc, PoisonError};

//自定义错误类型
pub type FlatDBResult<T> = Result<T, FlatDBError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum FlatDBError {
    // 元数据或数据文件无法读取、格式错误，整个加载失败
    #[error("load error: {0}")]
    Load(String),
    #[error("parse error: {0}")]
    Parser(String),
    // 需要整数的位置出现了非整数
    #[error("value error: {0}")]
    Value(String),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("table exists: {0}")]
    Conflict(String),
    #[error("integrity error: {0}")]
    Integrity(String),
    #[error("io error: {0}")]
    Io(#[from] Arc<Error>),
    #[error("config error: {0}")]
    Config(String),
    #[error("internal error {0}")]
    Internal(String),
}

impl From<Error> for FlatDBError {
    fn from(value: Error) -> Self {
        FlatDBError::Io(Arc::new(value))
    }
}

impl<E> From<PoisonError<E>> for FlatDBError {
    fn from(value: PoisonError<E>) -> Self {
        FlatDBError::Internal(value.to_string())
    }
}
