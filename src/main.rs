use tabledb::config::load_config;
use tabledb::{Columns, Database, DbError, Filter, Limit};
use tracing::{error, info};

const USAGE: &str =
    "usage: tabledb <config.toml> [table] [--where <fragment>] [--limit <count>] [--offset <n>]";

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    config: String,
    table: Option<String>,
    filter: Option<String>,
    limit: Option<u64>,
    offset: u64,
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = raw.iter();
    let mut positional = Vec::new();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--where" => {
                args.filter = Some(iter.next().ok_or("--where needs a value")?.clone());
            }
            "--limit" => {
                let value = iter.next().ok_or("--limit needs a value")?;
                args.limit = Some(value.parse().map_err(|_| format!("invalid --limit: {value}"))?);
            }
            "--offset" => {
                let value = iter.next().ok_or("--offset needs a value")?;
                args.offset = value.parse().map_err(|_| format!("invalid --offset: {value}"))?;
            }
            other if other.starts_with("--") => return Err(format!("unknown option {other}")),
            other => positional.push(other.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    args.config = positional.next().ok_or(USAGE)?;
    args.table = positional.next();
    if positional.next().is_some() {
        return Err(USAGE.to_string());
    }
    Ok(args)
}

fn dump(args: &Args) -> Result<usize, DbError> {
    let config = load_config(&args.config)?;
    let mut db = Database::open(&config)?;

    let filter = args.filter.as_deref().map(Filter::new);
    let limit = args.limit.map(|count| Limit::new(args.offset, count));
    let records = db.select_as_mapping(args.table.as_deref(), Columns::All, filter, limit)?;

    for record in &records {
        let line = serde_json::to_string(record).map_err(|e| DbError::Io(e.into()))?;
        println!("{}", line);
    }
    db.close()?;
    Ok(records.len())
}

fn main() {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            std::process::exit(2);
        }
    };

    match dump(&args) {
        Ok(count) => info!("Printed {} rows", count),
        Err(e) => {
            error!("{}", e);
            eprintln!("tabledb: {}", e);
            std::process::exit(1);
        }
    }
}
