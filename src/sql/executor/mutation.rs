use tracing::debug;
use crate::sql::engine::Store;
use crate::sql::executor::{Executor, MutationKind, ResultSet};
use crate::sql::parser::ast::{Operator, Predicate};
use crate::sql::schema::Database;
use crate::sql::types::Value;
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

// 追加一行，值不做类型检查，下次加载时无法转换的值会变成 NULL
pub struct Insert {
    table_name: String,
    values: Vec<String>,
}

impl Insert {
    pub fn new(table_name: String, values: Vec<String>) -> Box<Self> {
        Box::new(Insert { table_name, values })
    }
}

impl<S: Store> Executor<S> for Insert {
    fn execute(self: Box<Self>, _db: &Database, store: &mut S) -> FlatDBResult<ResultSet> {
        if !store.table_exists(&self.table_name) {
            return Err(FlatDBError::Schema(format!("table {} does not exist", self.table_name)));
        }
        store.append_row(&self.table_name, &self.values)?;
        Ok(ResultSet::Mutation {
            kind: MutationKind::Insert,
            table_name: self.table_name,
        })
    }
}

// 删除第一条字段值等于给定值的记录
// 无论解析出的操作符是什么都按等于处理，且只删除第一条匹配的记录
pub struct Delete {
    table_name: String,
    predicate: Predicate,
}

impl Delete {
    pub fn new(table_name: String, predicate: Predicate) -> Box<Self> {
        Box::new(Delete { table_name, predicate })
    }
}

impl<S: Store> Executor<S> for Delete {
    fn execute(self: Box<Self>, db: &Database, store: &mut S) -> FlatDBResult<ResultSet> {
        let mut table = db.get_table_must(&self.table_name)?.clone();
        if self.predicate.operator != Operator::Equal {
            debug!("delete on {} treats {} as =", self.table_name, self.predicate.operator);
        }
        let column = table.get_column(&self.predicate.field).ok_or_else(|| {
            FlatDBError::Schema(format!("column {} not found in table {}", self.predicate.field, self.table_name))
        })?;
        let target = Value::Integer(self.predicate.value);
        let position = column.values.iter().position(|v| *v == target).ok_or_else(|| {
            FlatDBError::Schema(format!(
                "no row in {} where {} = {}",
                self.table_name, self.predicate.field, self.predicate.value
            ))
        })?;
        table.remove_rows(vec![position]);
        store.rewrite_table(&table)?;
        Ok(ResultSet::Mutation {
            kind: MutationKind::Delete,
            table_name: self.table_name,
        })
    }
}

// 清空数据，保留表头
pub struct Truncate {
    table_name: String,
}

impl Truncate {
    pub fn new(table_name: String) -> Box<Self> {
        Box::new(Truncate { table_name })
    }
}

impl<S: Store> Executor<S> for Truncate {
    fn execute(self: Box<Self>, db: &Database, store: &mut S) -> FlatDBResult<ResultSet> {
        let mut table = db.get_table_must(&self.table_name)?.clone();
        table.truncate();
        store.rewrite_table(&table)?;
        Ok(ResultSet::Mutation {
            kind: MutationKind::Truncate,
            table_name: self.table_name,
        })
    }
}
