// 数据文件的读写
// 第一行为表头，之后每行为一条记录，逗号分隔
//
// a,b
// 1,10
// 2,20

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, warn};
use crate::sql::schema::{Column, Table};
use crate::sql::types::Value;
use crate::storage::catalog::TableSchema;
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

pub const FIELD_SEPARATOR: char = ',';

// 读取数据文件，文件不存在视为空表
pub fn load_table(schema: &TableSchema, path: &Path) -> FlatDBResult<Table> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse_table(schema, &content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("data file {} not found, table {} is empty", path.display(), schema.name);
            Ok(Table::empty(schema.name.clone(), &column_keys(schema)))
        }
        Err(e) => Err(FlatDBError::Load(format!("can not read data file {}: {}", path.display(), e))),
    }
}

// 内存中的列名统一为小写，与语句中的标识符一致
fn column_keys(schema: &TableSchema) -> Vec<String> {
    schema.columns.iter().map(|c| c.to_lowercase()).collect()
}

// 按表头的位置为元数据中的每一列取值，无法转换为整数的值记为 NULL
pub fn parse_table(schema: &TableSchema, content: &str) -> Table {
    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
    let header = match lines.next() {
        Some(line) => split_fields(line).map(|h| h.to_lowercase()).collect::<Vec<_>>(),
        None => return Table::empty(schema.name.clone(), &column_keys(schema)),
    };
    let rows = lines.map(|l| split_fields(l).collect::<Vec<_>>()).collect::<Vec<_>>();

    let mut columns = Vec::with_capacity(schema.columns.len());
    for name in column_keys(schema) {
        let position = header.iter().position(|h| *h == name);
        if position.is_none() {
            debug!("column {}.{} is missing from the data file header", schema.name, name);
        }
        let values = rows
            .iter()
            .map(|row| {
                let literal = position.and_then(|p| row.get(p)).copied().unwrap_or_default();
                let value = Value::coerce(literal);
                if value.is_null() && !literal.is_empty() {
                    debug!("value {:?} in {}.{} is not an integer, stored as NULL", literal, schema.name, name);
                }
                value
            })
            .collect();
        columns.push(Column::new(name, values));
    }
    if let Some(row) = rows.iter().find(|r| r.len() > header.len()) {
        warn!("table {} has a row with {} fields but only {} headers", schema.name, row.len(), header.len());
    }
    Table::new(schema.name.clone(), columns)
}

fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(FIELD_SEPARATOR)
        .map(|f| f.trim().trim_matches('"').trim())
}

pub fn format_header(columns: &[String]) -> String {
    columns.join(&FIELD_SEPARATOR.to_string())
}

// 全量序列化，表头使用元数据中声明的列名，列按元数据中的顺序输出
pub fn format_table(header: &[String], table: &Table) -> String {
    let mut out = format_header(header);
    out.push('\n');
    for row in table.rows() {
        let line = row.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        out.push_str(&line.join(&FIELD_SEPARATOR.to_string()));
        out.push('\n');
    }
    out
}

pub fn write_table(path: &Path, header: &[String], table: &Table) -> FlatDBResult<()> {
    fs::write(path, format_table(header, table))?;
    Ok(())
}

pub fn write_header(path: &Path, columns: &[String]) -> FlatDBResult<()> {
    fs::write(path, format_header(columns) + "\n")?;
    Ok(())
}

// 追加一行，不读取已有内容，只检查文件末尾是否有换行
pub fn append_row(path: &Path, values: &[String]) -> FlatDBResult<()> {
    let mut file = OpenOptions::new().read(true).append(true).open(path)?;
    let mut line = String::new();
    if file.metadata()?.len() > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            line.push('\n');
        }
    }
    line.push_str(&values.join(&FIELD_SEPARATOR.to_string()));
    line.push('\n');
    file.write_all(line.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> TableSchema {
        TableSchema::new("t", vec!["a".to_string(), "b".to_string()])
    }

    fn values(table: &Table, column: &str) -> Vec<Value> {
        table.get_column(column).map(|c| c.values.clone()).unwrap_or_default()
    }

    #[test]
    fn test_parse_by_header_position() -> FlatDBResult<()> {
        let table = parse_table(&schema(), "B,A\n10,1\n20,2\n");
        table.validate()?;
        assert_eq!(table.column_names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(values(&table, "a"), vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(values(&table, "b"), vec![Value::Integer(10), Value::Integer(20)]);
        Ok(())
    }

    #[test]
    fn test_parse_bad_values_become_null() -> FlatDBResult<()> {
        let table = parse_table(&schema(), "a,b\n1,x\n\"2\"\n3.5,30\n");
        table.validate()?;
        assert_eq!(table.row_count(), 3);
        assert_eq!(values(&table, "a"), vec![Value::Integer(1), Value::Integer(2), Value::Null]);
        assert_eq!(values(&table, "b"), vec![Value::Null, Value::Null, Value::Integer(30)]);
        Ok(())
    }

    #[test]
    fn test_parse_missing_header_column() -> FlatDBResult<()> {
        let table = parse_table(&schema(), "a\n1\n2\n");
        table.validate()?;
        assert_eq!(values(&table, "b"), vec![Value::Null, Value::Null]);
        Ok(())
    }

    #[test]
    fn test_empty_and_missing_file() -> FlatDBResult<()> {
        let table = parse_table(&schema(), "");
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.columns.len(), 2);

        let dir = tempfile::tempdir()?;
        let table = load_table(&schema(), &dir.path().join("t.csv"))?;
        assert_eq!(table, Table::empty("t", &schema().columns));
        Ok(())
    }

    #[test]
    fn test_mixed_case_header() -> FlatDBResult<()> {
        let schema = TableSchema::new("Table1", vec!["A".to_string(), "B".to_string()]);
        let table = parse_table(&schema, "A,B\n1,10\n2,20\n");
        assert_eq!(table.name, "Table1");
        assert_eq!(table.column_names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(values(&table, "b"), vec![Value::Integer(10), Value::Integer(20)]);
        assert_eq!(format_table(&schema.columns, &table), "A,B\n1,10\n2,20\n");
        Ok(())
    }

    #[test]
    fn test_write_and_append() -> FlatDBResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("t.csv");
        let table = parse_table(&schema(), "b,a\n10,1\nx,2\n");
        write_table(&path, &schema().columns, &table)?;
        assert_eq!(fs::read_to_string(&path)?, "a,b\n1,10\n2,NULL\n");

        append_row(&path, &["3".to_string(), "30".to_string()])?;
        assert_eq!(fs::read_to_string(&path)?, "a,b\n1,10\n2,NULL\n3,30\n");

        // 文件末尾没有换行时先补一个换行
        fs::write(&path, "a,b\n1,10")?;
        append_row(&path, &["4".to_string(), "40".to_string()])?;
        assert_eq!(fs::read_to_string(&path)?, "a,b\n1,10\n4,40\n");
        Ok(())
    }
}
