use std::path::PathBuf;
use clap::{Parser, ValueEnum};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use flat_db::custom_error::{FlatDBError, FlatDBResult};
use flat_db::storage::file::FileStore;
use flat_db::{ResultSet, Session};

const PROMPT: &str = "flat_db> ";
const DIR_PROMPT: &str = "data directory> ";
const MAX_DIR_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "flat_db", version, about = "Interactive shell for a flat-file database")]
struct Args {
    /// 数据目录，包含元数据文件和数据文件
    path: Option<PathBuf>,

    /// 执行一条语句后退出
    #[arg(short = 'c', long = "command")]
    command: Option<String>,

    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// 目录或元数据文件不存在时创建
    #[arg(long)]
    init: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("flat_db=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flat_db=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn open_session(path: PathBuf, init: bool) -> FlatDBResult<Session<FileStore>> {
    let store = if init { FileStore::init(path)? } else { FileStore::new(path) };
    if !store.dir().is_dir() {
        return Err(FlatDBError::Load(format!("{} is not a directory", store.dir().display())));
    }
    Session::open(store)
}

// 最多尝试 MAX_DIR_ATTEMPTS 次进入一个有效的目录
fn choose_session(editor: &mut DefaultEditor, args: &Args) -> FlatDBResult<Session<FileStore>> {
    let mut path = args.path.clone();
    for attempt in 1..=MAX_DIR_ATTEMPTS {
        let candidate = match path.take() {
            Some(p) => p,
            None => match editor.readline(DIR_PROMPT) {
                Ok(line) => PathBuf::from(line.trim()),
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(FlatDBError::Internal(e.to_string())),
            },
        };
        match open_session(candidate.clone(), args.init) {
            Ok(session) => return Ok(session),
            Err(e) => {
                eprintln!("{}", e);
                warn!("attempt {}/{} to open {} failed", attempt, MAX_DIR_ATTEMPTS, candidate.display());
            }
        }
    }
    Err(FlatDBError::Load(format!("no valid data directory after {} attempts", MAX_DIR_ATTEMPTS)))
}

fn render(rs: &ResultSet, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => rs.to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(rs).unwrap_or_else(|e| e.to_string()),
    }
}

// 执行一条语句，写操作成功后重新加载快照
// 重新加载失败时写操作已经落盘，先输出写操作的结果再返回错误
fn run(session: &mut Session<FileStore>, sql: &str, format: OutputFormat) -> FlatDBResult<String> {
    let rs = session.execute(sql)?;
    let output = render(&rs, format);
    if rs.reload_required() {
        debug!("reloading after {}", sql);
        if let Err(e) = session.reload() {
            println!("{}", output);
            return Err(e);
        }
    }
    Ok(output)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut editor = DefaultEditor::new()?;
    let mut session = choose_session(&mut editor, &args)?;

    if let Some(sql) = &args.command {
        println!("{}", run(&mut session, sql, args.format)?);
        return Ok(());
    }

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let sql = line.trim();
                if sql.is_empty() {
                    continue;
                }
                if sql == ".exit" || sql == ".quit" {
                    break;
                }
                editor.add_history_entry(sql)?;
                match run(&mut session, sql, args.format) {
                    Ok(output) => println!("{}", output),
                    Err(e) => println!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use super::*;

    fn setup() -> FlatDBResult<(tempfile::TempDir, Session<FileStore>)> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("metadata.txt"),
            "<begin_table>\nt\na\n<end_table>\n<begin_table>\nu\nb\n<end_table>\n",
        )?;
        fs::write(dir.path().join("t.csv"), "a\n1\n")?;
        let session = Session::open(FileStore::new(dir.path()))?;
        Ok((dir, session))
    }

    #[test]
    fn test_run_reloads_after_mutation() -> FlatDBResult<()> {
        let (_dir, mut session) = setup()?;
        assert_eq!(run(&mut session, "insert into t values (2)", OutputFormat::Table)?, "INSERT t: ok, reload required");
        assert_eq!(session.database().get_table_must("t")?.row_count(), 2);
        let json = run(&mut session, "select max(a) from t", OutputFormat::Json)?;
        assert!(json.contains("\"type\": \"aggregate\""));
        Ok(())
    }

    #[test]
    fn test_run_keeps_write_when_reload_fails() -> FlatDBResult<()> {
        let (dir, mut session) = setup()?;
        // u 的数据文件无法读取，重新加载会失败
        fs::create_dir(dir.path().join("u.csv"))?;
        let result = run(&mut session, "insert into t values (2)", OutputFormat::Table);
        assert!(matches!(result, Err(FlatDBError::Load(_))));
        assert_eq!(fs::read_to_string(dir.path().join("t.csv"))?, "a\n1\n2\n");
        assert_eq!(session.database().get_table_must("t")?.row_count(), 1);
        Ok(())
    }
}
