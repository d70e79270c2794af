use crate::sql::engine::Store;
use crate::sql::executor::filter;
use crate::sql::executor::{Executor, ResultSet};
use crate::sql::parser::ast::PredicateGroup;
use crate::sql::schema::Database;
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

// 扫描：深拷贝快照中列出的表，再按 where 条件过滤
pub struct Scan {
    tables: Vec<String>,
    filter: Option<PredicateGroup>,
}

impl Scan {
    pub fn new(tables: Vec<String>, filter: Option<PredicateGroup>) -> Box<Self> {
        Box::new(Scan { tables, filter })
    }
}

impl<S: Store> Executor<S> for Scan {
    fn execute(self: Box<Self>, db: &Database, _store: &mut S) -> FlatDBResult<ResultSet> {
        let mut working = db.restrict(&self.tables);
        if let Some(group) = &self.filter {
            filter::apply_group(&mut working, group)?;
        }
        Ok(ResultSet::Select { tables: working.tables })
    }
}

// 只保留查询的列，保持表中原有的顺序，表中没有的列直接忽略
pub struct Projection<S: Store> {
    source: Box<dyn Executor<S>>,
    columns: Vec<String>,
}

impl<S: Store> Projection<S> {
    pub fn new(source: Box<dyn Executor<S>>, columns: Vec<String>) -> Box<Self> {
        Box::new(Projection { source, columns })
    }
}

impl<S: Store> Executor<S> for Projection<S> {
    fn execute(self: Box<Self>, db: &Database, store: &mut S) -> FlatDBResult<ResultSet> {
        match self.source.execute(db, store)? {
            ResultSet::Select { mut tables } => {
                for table in tables.iter_mut() {
                    table.columns.retain(|c| self.columns.contains(&c.name));
                }
                Ok(ResultSet::Select { tables })
            }
            _ => Err(FlatDBError::Internal("Unexpected result set".to_string())),
        }
    }
}
