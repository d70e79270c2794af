use futures::SinkExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::StreamExt;
use tokio_util::codec::{Framed, LinesCodec};

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use flat_db::custom_error::FlatDBResult;
use flat_db::storage::file::FileStore;
use flat_db::utils::config::Config;
use flat_db::Session;

const RESPONSE_END: &str = "!!!end!!!";

#[derive(Debug, Parser)]
#[command(name = "flat_db_server", version, about = "Line-oriented TCP server for a flat-file database")]
struct Args {
    /// 配置文件，格式为 key = value
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    bind: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(short, long)]
    verbose: bool,
}

/// Possible requests our clients can send us
#[derive(Debug, PartialEq)]
enum SqlRequest {
    SQL(String),
    ListTables,
    TableInfo(String),
    Reload,
}

impl SqlRequest {
    pub fn parse(cmd: &str) -> Self {
        let cmd = cmd.trim().trim_end_matches(';').trim();
        let upper_cmd = cmd.to_uppercase();
        if upper_cmd == "SHOW TABLES" {
            return SqlRequest::ListTables;
        }
        if upper_cmd == "RELOAD" {
            return SqlRequest::Reload;
        }
        if upper_cmd.starts_with("SHOW TABLE") {
            let args = upper_cmd.split_ascii_whitespace().collect::<Vec<_>>();
            if args.len() == 3 {
                return SqlRequest::TableInfo(args[2].to_lowercase());
            }
        }
        SqlRequest::SQL(cmd.into())
    }
}

type SharedSession = Arc<Mutex<Session<FileStore>>>;

// 锁只在同步代码中持有，不跨越 await
fn handle_line(session: &SharedSession, line: &str) -> FlatDBResult<String> {
    let mut session = session.lock()?;
    let response = match SqlRequest::parse(line) {
        SqlRequest::SQL(sql) => {
            let rs = session.execute(&sql)?;
            // 写操作已经落盘，重新加载失败时同时返回两者的结果
            match rs.reload_required().then(|| session.reload()) {
                Some(Err(e)) => format!("{}\n{}", rs, e),
                _ => rs.to_string(),
            }
        }
        SqlRequest::ListTables => {
            let names = session.table_names();
            if names.is_empty() { "(no tables)".to_string() } else { names.join("\n") }
        }
        SqlRequest::TableInfo(table_name) => session.describe_table(&table_name)?,
        SqlRequest::Reload => {
            session.reload()?;
            format!("reloaded {} tables", session.table_names().len())
        }
    };
    Ok(response)
}

async fn handle_connection(session: SharedSession, socket: TcpStream) -> FlatDBResult<()> {
    let mut lines = Framed::new(socket, LinesCodec::new());
    while let Some(result) = lines.next().await {
        match result {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                debug!("request: {}", line);
                let response = handle_line(&session, &line).unwrap_or_else(|e| e.to_string());

                // 发送执行结果
                if let Err(e) = lines.send(response.as_str()).await {
                    warn!("error on sending response; error = {e:?}");
                }
                if let Err(e) = lines.send(RESPONSE_END).await {
                    warn!("error on sending response; error = {e:?}");
                }
            }
            Err(e) => {
                warn!("error on decoding from socket; error = {e:?}");
            }
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("flat_db=debug,flat_db_server=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flat_db=warn,flat_db_server=info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

// 命令行参数覆盖配置文件
fn load_config(args: &Args) -> FlatDBResult<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(bind) = &args.bind {
        config.bind_address = bind.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> FlatDBResult<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = load_config(&args)?;

    // 初始化 DB
    let session = Session::open(FileStore::from_config(&config))?;
    info!("loaded {} tables from {}", session.table_names().len(), config.data_dir.display());
    let shared_session: SharedSession = Arc::new(Mutex::new(session));

    // 启动 TCP 服务
    let endpoint = config.endpoint();
    let listener = TcpListener::bind(&endpoint).await?;
    info!("flat_db server starts, listening on: {endpoint}");

    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                debug!("accepted connection from {peer}");
                let session = shared_session.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(session, socket).await {
                        error!("internal server error {:?}", e);
                    }
                });
            }
            Err(e) => warn!("error accepting socket; error = {e:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use super::*;

    fn shared_session(dir: &std::path::Path) -> FlatDBResult<SharedSession> {
        fs::write(
            dir.join("metadata.txt"),
            "<begin_table>\nt\na\n<end_table>\n<begin_table>\nu\nb\n<end_table>\n",
        )?;
        fs::write(dir.join("t.csv"), "a\n1\n")?;
        Ok(Arc::new(Mutex::new(Session::open(FileStore::new(dir))?)))
    }

    #[test]
    fn test_handle_line() -> FlatDBResult<()> {
        let dir = tempfile::tempdir()?;
        let session = shared_session(dir.path())?;
        assert_eq!(handle_line(&session, "show tables")?, "t\nu");
        assert_eq!(handle_line(&session, "insert into t values (2)")?, "INSERT t: ok, reload required");
        assert_eq!(handle_line(&session, "show table t")?, "t (a) 2 rows");
        assert_eq!(handle_line(&session, "RELOAD;")?, "reloaded 2 tables");
        Ok(())
    }

    #[test]
    fn test_mutation_reported_when_reload_fails() -> FlatDBResult<()> {
        let dir = tempfile::tempdir()?;
        let session = shared_session(dir.path())?;
        fs::create_dir(dir.path().join("u.csv"))?;
        let response = handle_line(&session, "insert into t values (2)")?;
        assert!(response.starts_with("INSERT t: ok, reload required\nload error"), "{}", response);
        assert_eq!(fs::read_to_string(dir.path().join("t.csv"))?, "a\n1\n2\n");
        Ok(())
    }

    #[test]
    fn test_parse_request() {
        assert_eq!(SqlRequest::parse("show tables"), SqlRequest::ListTables);
        assert_eq!(SqlRequest::parse("SHOW TABLE Table1;"), SqlRequest::TableInfo("table1".to_string()));
        assert_eq!(SqlRequest::parse("reload"), SqlRequest::Reload);
        assert_eq!(
            SqlRequest::parse("select * from t1;"),
            SqlRequest::SQL("select * from t1".to_string())
        );
    }
}
