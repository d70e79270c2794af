use crate::sql::engine::Store;
use crate::sql::executor::{Executor, MutationKind, ResultSet};
use crate::sql::schema::Database;
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

pub struct CreateTable {
    table_name: String,
    columns: Vec<String>,
}

impl CreateTable {
    pub fn new(table_name: String, columns: Vec<String>) -> Box<Self> {
        Box::new(CreateTable { table_name, columns })
    }
}

impl<S: Store> Executor<S> for CreateTable {
    fn execute(self: Box<Self>, _db: &Database, store: &mut S) -> FlatDBResult<ResultSet> {
        if store.table_exists(&self.table_name) {
            return Err(FlatDBError::Conflict(self.table_name));
        }
        store.create_table(&self.table_name, &self.columns)?;
        Ok(ResultSet::Mutation {
            kind: MutationKind::Create,
            table_name: self.table_name,
        })
    }
}

// 只有空表才能删除，行数以磁盘上的数据文件为准
pub struct DropTable {
    table_name: String,
}

impl DropTable {
    pub fn new(table_name: String) -> Box<Self> {
        Box::new(Self { table_name })
    }
}

impl<S: Store> Executor<S> for DropTable {
    fn execute(self: Box<Self>, _db: &Database, store: &mut S) -> FlatDBResult<ResultSet> {
        let rows = store.row_count(&self.table_name)?;
        if rows > 0 {
            return Err(FlatDBError::Integrity(format!(
                "table {} has {} rows, truncate it before dropping",
                self.table_name, rows
            )));
        }
        store.drop_table(&self.table_name)?;
        Ok(ResultSet::Mutation {
            kind: MutationKind::Drop,
            table_name: self.table_name,
        })
    }
}
