use std::fmt::{Display, Formatter};
use serde::Serialize;
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Select {
        projection: Projection,
        tables: Vec<String>,
        predicates: Option<PredicateGroup>,
    },
    Create { table_name: String, columns: Vec<String> },
    // 值保留原始字面量，下次加载时才做类型转换
    Insert { table_name: String, values: Vec<String> },
    Delete { table_name: String, predicate: Predicate },
    Truncate { table_name: String },
    Drop { table_name: String },
}

#[derive(Debug, PartialEq, Clone)]
pub enum Projection {
    Wildcard,
    Columns(Vec<String>),
    Aggregate { function: AggregateFunction, field: String },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Max,
    Min,
    Avg,
    Sum,
    Count,
    Distinct,
}

impl AggregateFunction {
    pub fn from_str(name: &str) -> FlatDBResult<Self> {
        Ok(match name.to_lowercase().as_ref() {
            "max" => AggregateFunction::Max,
            "min" => AggregateFunction::Min,
            "avg" => AggregateFunction::Avg,
            "sum" => AggregateFunction::Sum,
            "count" => AggregateFunction::Count,
            "distinct" => AggregateFunction::Distinct,
            _ => return Err(FlatDBError::Parser(format!("[Parser] This function {} is not currently supported", name))),
        })
    }

    pub fn to_str(&self) -> &str {
        match self {
            AggregateFunction::Max => "max",
            AggregateFunction::Min => "min",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Count => "count",
            AggregateFunction::Distinct => "distinct",
        }
    }
}

impl Display for AggregateFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operator {
    Equal,
    GreaterThan,
    LessThan,
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operator::Equal => "=",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
        })
    }
}

// 单个条件 field op value，value只能是整数
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Predicate {
    pub field: String,
    pub operator: Operator,
    pub value: i64,
}

impl Predicate {
    pub fn new(field: impl Into<String>, operator: Operator, value: i64) -> Self {
        Predicate { field: field.into(), operator, value }
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.field, self.operator, self.value)
    }
}

// 最多两个条件，不支持嵌套
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PredicateGroup {
    Single(Predicate),
    And(Predicate, Predicate),
    Or(Predicate, Predicate),
}

impl PredicateGroup {
    pub fn predicates(&self) -> Vec<&Predicate> {
        match self {
            PredicateGroup::Single(p) => vec![p],
            PredicateGroup::And(p, q) | PredicateGroup::Or(p, q) => vec![p, q],
        }
    }
}
