use tracing::debug;
use crate::sql::executor::{Executor, ResultSet};
use crate::sql::parser::Parser;
use crate::sql::schema::{Database, Table};
use crate::utils::custom_error::FlatDBResult;

// 抽象的存储层定义，包含加载和所有写磁盘的操作
// 目前只有基于目录的 FileStore
pub trait Store {
    // 读取元数据和所有数据文件，构建完整的数据库
    fn load(&self) -> FlatDBResult<Database>;

    // 表的数据文件是否存在
    fn table_exists(&self, table_name: &str) -> bool;

    // 从磁盘读取表当前的行数，表不存在时报错
    fn row_count(&self, table_name: &str) -> FlatDBResult<usize>;

    // 创建表：写元数据和只有表头的数据文件
    fn create_table(&mut self, table_name: &str, columns: &[String]) -> FlatDBResult<()>;

    // 追加一行
    fn append_row(&mut self, table_name: &str, values: &[String]) -> FlatDBResult<()>;

    // 全量重写数据文件
    fn rewrite_table(&mut self, table: &Table) -> FlatDBResult<()>;

    // 删除表：删除数据文件和元数据中的定义
    fn drop_table(&mut self, table_name: &str) -> FlatDBResult<()>;
}

// 客户端Session定义，持有当前的数据库快照
// 写操作之后快照不会自动更新，需要显式调用 reload
pub struct Session<S: Store> {
    store: S,
    database: Database,
}

impl<S: Store + 'static> Session<S> {
    pub fn open(store: S) -> FlatDBResult<Self> {
        let database = store.load()?;
        Ok(Session { store, database })
    }

    // 执行客户端SQL语句
    pub fn execute(&mut self, sql: &str) -> FlatDBResult<ResultSet> {
        let stmt = Parser::new(sql).parse()?;
        debug!("executing {:?}", stmt);
        <dyn Executor<S>>::build(stmt).execute(&self.database, &mut self.store)
    }

    // 重新读取元数据和数据文件，整体替换快照，失败时保留原来的快照
    pub fn reload(&mut self) -> FlatDBResult<()> {
        self.database = self.store.load()?;
        debug!("reloaded {} tables", self.database.tables.len());
        Ok(())
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn table_names(&self) -> Vec<String> {
        self.database.table_names()
    }

    // 表的列信息和行数
    pub fn describe_table(&self, table_name: &str) -> FlatDBResult<String> {
        let table = self.database.get_table_must(table_name)?;
        Ok(format!(
            "{} ({}) {} rows",
            table.name,
            table.column_names().join(", "),
            table.row_count()
        ))
    }
}

pub fn execute<S: Store + 'static>(sql: &str, session: &mut Session<S>) -> FlatDBResult<ResultSet> {
    session.execute(sql)
}
