// 配置文件定义，格式为 key = value，# 开头为注释
//
// data_dir = /var/lib/flat_db
// catalog_file = metadata.txt
// data_extension = csv
// bind_address = 0.0.0.0
// port = 8080

use std::fs;
use std::path::{Path, PathBuf};
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

pub const DEFAULT_CATALOG_FILE: &str = "metadata.txt";
pub const DEFAULT_DATA_EXTENSION: &str = "csv";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub catalog_file: String,
    pub data_extension: String,
    pub bind_address: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("."),
            catalog_file: DEFAULT_CATALOG_FILE.to_string(),
            data_extension: DEFAULT_DATA_EXTENSION.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> FlatDBResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| FlatDBError::Config(format!("can not read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> FlatDBResult<Self> {
        let mut config = Config::default();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .ok_or_else(|| FlatDBError::Config(format!("line {}: expected key = value", number + 1)))?;
            match key {
                "data_dir" => config.data_dir = PathBuf::from(value),
                "catalog_file" => config.catalog_file = value.to_string(),
                "data_extension" => config.data_extension = value.trim_start_matches('.').to_string(),
                "bind_address" => config.bind_address = value.to_string(),
                "port" => {
                    config.port = value
                        .parse()
                        .map_err(|_| FlatDBError::Config(format!("line {}: invalid port {}", number + 1, value)))?
                }
                k => return Err(FlatDBError::Config(format!("line {}: unknown key {}", number + 1, k))),
            }
        }
        Ok(config)
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() -> FlatDBResult<()> {
        let config = Config::parse(
            "
            # server
            data_dir = /tmp/flat_db
            data_extension = .dat
            port = 9000
            ",
        )?;
        assert_eq!(config.data_dir, PathBuf::from("/tmp/flat_db"));
        assert_eq!(config.data_extension, "dat");
        assert_eq!(config.catalog_file, DEFAULT_CATALOG_FILE);
        assert_eq!(config.endpoint(), "0.0.0.0:9000");
        Ok(())
    }

    #[test]
    fn test_parse_config_errors() {
        assert!(matches!(Config::parse("port = abc"), Err(FlatDBError::Config(_))));
        assert!(matches!(Config::parse("colour = red"), Err(FlatDBError::Config(_))));
        assert!(matches!(Config::parse("just a line"), Err(FlatDBError::Config(_))));
    }
}
