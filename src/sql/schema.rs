use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use crate::sql::types::{Row, Value};
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Column { name: name.into(), values }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }
}

// 表，列的顺序为元数据文件中声明的顺序
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Table { name: name.into(), columns }
    }

    // 只有表头没有数据的表
    pub fn empty(name: impl Into<String>, column_names: &[String]) -> Self {
        Self::new(name, column_names.iter().map(Column::empty).collect())
    }

    // 校验所有列的长度一致
    pub fn validate(&self) -> FlatDBResult<()> {
        let rows = self.row_count();
        match self.columns.iter().find(|c| c.values.len() != rows) {
            Some(c) => Err(FlatDBError::Internal(format!(
                "column {}.{} has {} values, expected {}",
                self.name, c.name, c.values.len(), rows
            ))),
            None => Ok(()),
        }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    pub fn row(&self, index: usize) -> Option<Row> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[index]).collect())
    }

    pub fn rows(&self) -> Vec<Row> {
        (0..self.row_count()).filter_map(|i| self.row(i)).collect()
    }

    // 从所有列中删除行，先排序去重后倒序删除，保证前面的删除不影响后面的下标
    pub fn remove_rows(&mut self, mut indices: Vec<usize>) {
        indices.sort_unstable();
        indices.dedup();
        for index in indices.into_iter().rev() {
            for column in self.columns.iter_mut() {
                if index < column.values.len() {
                    column.values.remove(index);
                }
            }
        }
    }

    pub fn truncate(&mut self) {
        for column in self.columns.iter_mut() {
            column.values.clear();
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.name)?;
        write!(f, "{}", self.column_names().join(","))?;
        for row in self.rows() {
            let line = row.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
            write!(f, "\n{}", line)?;
        }
        Ok(())
    }
}

// 内存中的数据库快照，表按元数据文件中的顺序排列
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Database {
    pub tables: Vec<Table>,
}

impl Database {
    pub fn new(tables: Vec<Table>) -> Self {
        Database { tables }
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    // 获取表信息，不存在则报错
    pub fn get_table_must(&self, name: &str) -> FlatDBResult<&Table> {
        self.get_table(name)
            .ok_or_else(|| FlatDBError::Schema(format!("table {} not found", name)))
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    // 按给定的表名深拷贝一份，不存在的表直接忽略，重复的表只保留第一次出现
    pub fn restrict(&self, names: &[String]) -> Database {
        let mut tables: Vec<Table> = Vec::with_capacity(names.len());
        for table in names.iter().filter_map(|name| self.get_table(name)) {
            if !tables.iter().any(|t| t.name == table.name) {
                tables.push(table.clone());
            }
        }
        Database::new(tables)
    }
}
