mod agg;
pub mod filter;
mod mutation;
mod query;
mod schema;

use std::fmt::{Display, Formatter};
use serde::Serialize;
use crate::sql::engine::Store;
use crate::sql::executor::agg::AggregateExecutor;
use crate::sql::executor::mutation::{Delete, Insert, Truncate};
use crate::sql::executor::query::{Projection, Scan};
use crate::sql::executor::schema::{CreateTable, DropTable};
use crate::sql::parser::ast::{self, AggregateFunction, Statement};
use crate::sql::schema::{Database, Table};
use crate::sql::types::Value;
use crate::utils::custom_error::FlatDBResult;

// 抽象执行器定义
// 读操作基于当前的数据库快照，写操作直接修改磁盘文件
pub trait Executor<S: Store> {
    fn execute(self: Box<Self>, db: &Database, store: &mut S) -> FlatDBResult<ResultSet>;
}

impl<S: Store + 'static> dyn Executor<S> {
    pub fn build(stmt: Statement) -> Box<dyn Executor<S>> {
        match stmt {
            Statement::Select { projection, tables, predicates } => {
                let scan: Box<dyn Executor<S>> = Scan::new(tables, predicates);
                match projection {
                    ast::Projection::Wildcard => scan,
                    ast::Projection::Columns(columns) => Projection::new(scan, columns),
                    ast::Projection::Aggregate { function, field } => AggregateExecutor::new(scan, function, field),
                }
            }
            Statement::Create { table_name, columns } => CreateTable::new(table_name, columns),
            Statement::Insert { table_name, values } => Insert::new(table_name, values),
            Statement::Delete { table_name, predicate } => Delete::new(table_name, predicate),
            Statement::Truncate { table_name } => Truncate::new(table_name),
            Statement::Drop { table_name } => DropTable::new(table_name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Create,
    Insert,
    Delete,
    Truncate,
    Drop,
}

impl Display for MutationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MutationKind::Create => "CREATE",
            MutationKind::Insert => "INSERT",
            MutationKind::Delete => "DELETE",
            MutationKind::Truncate => "TRUNCATE",
            MutationKind::Drop => "DROP",
        })
    }
}

// 聚合结果，avg 总是浮点数，distinct 是一组值组成的伪行
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregateValue {
    Null,
    Integer(i64),
    Float(f64),
    Distinct(Vec<Value>),
}

impl Display for AggregateValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateValue::Null => write!(f, "{}", Value::Null),
            AggregateValue::Integer(i) => write!(f, "{}", i),
            AggregateValue::Float(v) => write!(f, "{:?}", v),
            AggregateValue::Distinct(values) => {
                let values = values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
                write!(f, "{{{}}}", values.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub table_name: String,
    pub value: AggregateValue,
}

// 查询结果集
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResultSet {
    Select {
        tables: Vec<Table>,
    },
    Aggregate {
        function: AggregateFunction,
        field: String,
        results: Vec<AggregateResult>,
    },
    // 写操作不会修改内存中的快照，需要调用方重新加载
    Mutation {
        kind: MutationKind,
        table_name: String,
    },
}

impl ResultSet {
    pub fn reload_required(&self) -> bool {
        matches!(self, ResultSet::Mutation { .. })
    }
}

impl Display for ResultSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultSet::Select { tables } => {
                if tables.is_empty() {
                    return f.write_str("(no tables)");
                }
                let tables = tables.iter().map(|t| t.to_string()).collect::<Vec<_>>();
                f.write_str(&tables.join("\n\n"))
            }
            ResultSet::Aggregate { function, field, results } => {
                if results.is_empty() {
                    return write!(f, "(no table has column {})", field);
                }
                let results = results
                    .iter()
                    .map(|r| format!("{}\n{}({})\n{}", r.table_name, function, field, r.value))
                    .collect::<Vec<_>>();
                f.write_str(&results.join("\n\n"))
            }
            ResultSet::Mutation { kind, table_name } => write!(f, "{} {}: ok, reload required", kind, table_name),
        }
    }
}
