// 元数据文件(catalog)的解析与序列化
//
// <begin_table>
// table1
// a
// b
// <end_table>

use std::fs;
use std::path::Path;
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

pub const BEGIN_TABLE: &str = "<begin_table>";
pub const END_TABLE: &str = "<end_table>";

#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        TableSchema { name: name.into(), columns }
    }
}

// 表名到列名的有序映射，顺序即文件中声明的顺序
// 表名和列名保留声明时的大小写，用于定位数据文件和写回元数据，查找时不区分大小写
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalog {
    pub tables: Vec<TableSchema>,
}

impl Catalog {
    pub fn load(path: &Path) -> FlatDBResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| FlatDBError::Load(format!("can not read catalog {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> FlatDBResult<Self> {
        let mut catalog = Catalog::default();
        // 当前正在解析的块，None 表示在块外
        let mut block: Option<Vec<String>> = None;
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            match line {
                BEGIN_TABLE => {
                    if block.is_some() {
                        return Err(FlatDBError::Load(format!("line {}: missing {} before {}", number + 1, END_TABLE, BEGIN_TABLE)));
                    }
                    block = Some(Vec::new());
                }
                END_TABLE => match block.take() {
                    Some(lines) => catalog.add_block(lines, number + 1)?,
                    None => {
                        return Err(FlatDBError::Load(format!("line {}: {} without {}", number + 1, END_TABLE, BEGIN_TABLE)));
                    }
                },
                "" => {}
                name => match block.as_mut() {
                    Some(lines) => lines.push(name.to_string()),
                    None => {
                        return Err(FlatDBError::Load(format!("line {}: unexpected {} outside of a table block", number + 1, name)));
                    }
                },
            }
        }
        if block.is_some() {
            return Err(FlatDBError::Load(format!("missing {} at end of catalog", END_TABLE)));
        }
        Ok(catalog)
    }

    fn add_block(&mut self, mut lines: Vec<String>, line_number: usize) -> FlatDBResult<()> {
        if lines.is_empty() {
            return Err(FlatDBError::Load(format!("line {}: table block without a name", line_number)));
        }
        let name = lines.remove(0);
        if self.contains(&name) {
            return Err(FlatDBError::Load(format!("line {}: duplicate table {}", line_number, name)));
        }
        self.tables.push(TableSchema::new(name, lines));
        Ok(())
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            out.push_str(BEGIN_TABLE);
            out.push('\n');
            out.push_str(&table.name);
            out.push('\n');
            for column in &table.columns {
                out.push_str(column);
                out.push('\n');
            }
            out.push_str(END_TABLE);
            out.push('\n');
        }
        out
    }

    pub fn save(&self, path: &Path) -> FlatDBResult<()> {
        fs::write(path, self.serialize())?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn push(&mut self, table: TableSchema) {
        self.tables.push(table);
    }

    pub fn remove(&mut self, name: &str) -> Option<TableSchema> {
        let position = self.tables.iter().position(|t| t.name.eq_ignore_ascii_case(name))?;
        Some(self.tables.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = "<begin_table>
table1
A
B
<end_table>

<begin_table>
table2
c
<end_table>
";

    #[test]
    fn test_parse_catalog() -> FlatDBResult<()> {
        let catalog = Catalog::parse(CATALOG)?;
        assert_eq!(
            catalog.tables,
            vec![
                TableSchema::new("table1", vec!["A".to_string(), "B".to_string()]),
                TableSchema::new("table2", vec!["c".to_string()]),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_serialize_catalog() -> FlatDBResult<()> {
        let catalog = Catalog::parse(CATALOG)?;
        let text = catalog.serialize();
        assert_eq!(text, "<begin_table>\ntable1\nA\nB\n<end_table>\n<begin_table>\ntable2\nc\n<end_table>\n");
        assert_eq!(Catalog::parse(&text)?, catalog);
        Ok(())
    }

    #[test]
    fn test_malformed_catalog() {
        let cases = [
            "<begin_table>\nt\na\n",
            "<begin_table>\n<end_table>\n",
            "<begin_table>\nt\n<begin_table>\nu\n<end_table>\n",
            "t\n<begin_table>\nu\n<end_table>\n",
            "<end_table>\n",
            "<begin_table>\nt\n<end_table>\n<begin_table>\nt\n<end_table>\n",
            "<begin_table>\nt\n<end_table>\n<begin_table>\nT\n<end_table>\n",
        ];
        for case in cases {
            assert!(matches!(Catalog::parse(case), Err(FlatDBError::Load(_))), "{:?}", case);
        }
    }

    #[test]
    fn test_mixed_case_names() -> FlatDBResult<()> {
        let mut catalog = Catalog::parse("<begin_table>\nTable1\nA\n<end_table>\n<begin_table>\nt2\nx\n<end_table>\n")?;
        assert_eq!(catalog.get("table1").map(|t| t.name.as_str()), Some("Table1"));
        assert!(catalog.contains("TABLE1"));

        // 删除其他表后，剩下的表保留原有的大小写
        assert!(catalog.remove("T2").is_some());
        assert_eq!(catalog.serialize(), "<begin_table>\nTable1\nA\n<end_table>\n");
        Ok(())
    }

    #[test]
    fn test_missing_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = Catalog::load(&dir.path().join("metadata.txt"));
        assert!(matches!(result, Err(FlatDBError::Load(_))));
    }
}
