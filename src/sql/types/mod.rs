use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

pub const NULL_LITERAL: &str = "NULL";

// 存储的值只有整数和NULL两种，浮点数只会出现在聚合结果中
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
}

impl Value {
    // 数据文件中的字面量转换为 Value，无法转换为整数的记为 NULL
    pub fn coerce(literal: &str) -> Self {
        let literal = literal.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        match literal.parse::<i64>() {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Null,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str(NULL_LITERAL),
            Value::Integer(i) => write!(f, "{}", i),
        }
    }
}

pub type Row = Vec<Value>;
