// 基于目录的存储：一个元数据文件 + 每张表一个数据文件

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use crate::sql::engine::Store;
use crate::sql::schema::{Database, Table};
use crate::storage::catalog::{Catalog, TableSchema};
use crate::storage::table_store;
use crate::utils::config::{Config, DEFAULT_CATALOG_FILE, DEFAULT_DATA_EXTENSION};
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    catalog_file: String,
    extension: String,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore {
            dir: dir.into(),
            catalog_file: DEFAULT_CATALOG_FILE.to_string(),
            extension: DEFAULT_DATA_EXTENSION.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        FileStore {
            dir: config.data_dir.clone(),
            catalog_file: config.catalog_file.clone(),
            extension: config.data_extension.clone(),
        }
    }

    // 元数据文件不存在时创建一个空的
    pub fn init(dir: impl Into<PathBuf>) -> FlatDBResult<Self> {
        let store = Self::new(dir);
        if !store.dir.exists() {
            fs::create_dir_all(&store.dir)?;
        }
        if !store.catalog_path().exists() {
            Catalog::default().save(&store.catalog_path())?;
            info!("created empty catalog {}", store.catalog_path().display());
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.join(&self.catalog_file)
    }

    pub fn data_path(&self, table_name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", table_name, self.extension))
    }

    fn catalog(&self) -> FlatDBResult<Catalog> {
        Catalog::load(&self.catalog_path())
    }

    // 语句中的表名都是小写，数据文件名使用元数据中声明的表名
    fn declared_name(&self, table_name: &str) -> String {
        self.catalog()
            .ok()
            .and_then(|catalog| catalog.get(table_name).map(|t| t.name.clone()))
            .unwrap_or_else(|| table_name.to_string())
    }
}

impl Store for FileStore {
    fn load(&self) -> FlatDBResult<Database> {
        let catalog = self.catalog()?;
        let mut tables = Vec::with_capacity(catalog.tables.len());
        for schema in &catalog.tables {
            let table = table_store::load_table(schema, &self.data_path(&schema.name))?;
            table
                .validate()
                .map_err(|e| FlatDBError::Load(format!("table {} is inconsistent: {}", schema.name, e)))?;
            debug!("loaded table {} with {} rows", table.name, table.row_count());
            tables.push(table);
        }
        info!("loaded {} tables from {}", tables.len(), self.dir.display());
        Ok(Database::new(tables))
    }

    fn table_exists(&self, table_name: &str) -> bool {
        self.data_path(&self.declared_name(table_name)).is_file()
    }

    // 直接读取数据文件，不依赖内存中的快照
    fn row_count(&self, table_name: &str) -> FlatDBResult<usize> {
        let catalog = self.catalog()?;
        let schema = catalog
            .get(table_name)
            .ok_or_else(|| FlatDBError::Schema(format!("table {} not found", table_name)))?;
        let table = table_store::load_table(schema, &self.data_path(&schema.name))?;
        Ok(table.row_count())
    }

    fn create_table(&mut self, table_name: &str, columns: &[String]) -> FlatDBResult<()> {
        let mut catalog = self.catalog()?;
        if self.data_path(table_name).is_file() || catalog.contains(table_name) {
            return Err(FlatDBError::Conflict(table_name.to_string()));
        }
        catalog.push(TableSchema::new(table_name, columns.to_vec()));
        // 先写元数据再写数据文件，两步之间失败会导致不一致
        catalog.save(&self.catalog_path())?;
        table_store::write_header(&self.data_path(table_name), columns)?;
        info!("created table {} ({})", table_name, columns.join(", "));
        Ok(())
    }

    fn append_row(&mut self, table_name: &str, values: &[String]) -> FlatDBResult<()> {
        let path = self.data_path(&self.declared_name(table_name));
        if !path.is_file() {
            return Err(FlatDBError::Schema(format!("table {} does not exist", table_name)));
        }
        table_store::append_row(&path, values)?;
        info!("inserted 1 row into {}", table_name);
        Ok(())
    }

    fn rewrite_table(&mut self, table: &Table) -> FlatDBResult<()> {
        let catalog = self.catalog()?;
        let (name, header) = match catalog.get(&table.name) {
            Some(schema) if schema.columns.len() == table.columns.len() => (schema.name.clone(), schema.columns.clone()),
            _ => (table.name.clone(), table.column_names()),
        };
        table_store::write_table(&self.data_path(&name), &header, table)?;
        info!("rewrote table {} with {} rows", name, table.row_count());
        Ok(())
    }

    fn drop_table(&mut self, table_name: &str) -> FlatDBResult<()> {
        let mut catalog = self.catalog()?;
        let name = catalog.get(table_name).map_or_else(|| table_name.to_string(), |t| t.name.clone());
        let path = self.data_path(&name);
        if path.is_file() {
            fs::remove_file(&path)?;
        }
        if catalog.remove(&name).is_some() {
            catalog.save(&self.catalog_path())?;
        }
        info!("dropped table {}", name);
        Ok(())
    }
}
