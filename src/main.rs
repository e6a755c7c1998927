//! txsession - run SQL statements inside one transaction
//!
//! This is the main entry point for the txsession command-line interface.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use txsession::session::{Client, Driver, Session, SessionConfig, SessionError, Transactional};
use txsession::transaction::IsolationLevel;

struct Args {
    driver: String,
    url: Option<String>,
    statements: Vec<String>,
    config: Option<PathBuf>,
    isolation: Option<IsolationLevel>,
    read_only: bool,
    timeout_ms: Option<u64>,
    dry_run: bool,
    verbose: bool,
}

enum Parsed {
    Run(Args),
    Exit(ExitCode),
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1).collect()) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Exit(code)) => return code,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Parsed, String> {
    let mut parsed = Args {
        driver: "sqlite".to_string(),
        url: None,
        statements: Vec::new(),
        config: None,
        isolation: None,
        read_only: false,
        timeout_ms: None,
        dry_run: false,
        verbose: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .ok_or_else(|| format!("Missing value for {}", flag))
        };
        match arg.as_str() {
            "-d" | "--driver" => parsed.driver = value(&arg)?,
            "-u" | "--url" => parsed.url = Some(value(&arg)?),
            "-e" | "--execute" => parsed.statements.push(value(&arg)?),
            "-c" | "--config" => parsed.config = Some(PathBuf::from(value(&arg)?)),
            "--isolation" => parsed.isolation = Some(value(&arg)?.parse()?),
            "--timeout-ms" => {
                let raw = value(&arg)?;
                let ms = raw
                    .parse()
                    .map_err(|_| format!("Invalid timeout: {}", raw))?;
                parsed.timeout_ms = Some(ms);
            }
            "--read-only" => parsed.read_only = true,
            "--dry-run" => parsed.dry_run = true,
            "-v" | "--verbose" => parsed.verbose = true,
            "-h" | "--help" => {
                print_help();
                return Ok(Parsed::Exit(ExitCode::SUCCESS));
            }
            "--version" => {
                println!("txsession v{}", env!("CARGO_PKG_VERSION"));
                return Ok(Parsed::Exit(ExitCode::SUCCESS));
            }
            other => return Err(format!("Unknown option: {}", other)),
        }
    }

    if parsed.url.is_none() {
        return Err("Missing --url (see --help)".to_string());
    }
    Ok(Parsed::Run(parsed))
}

fn print_help() {
    println!("txsession - run SQL statements inside one transaction");
    println!();
    println!("Usage: txsession [OPTIONS] -u URL -e SQL [-e SQL ...]");
    println!();
    println!("Options:");
    println!("  -d, --driver NAME      postgres, mysql, sqlite or sea-orm (default: sqlite)");
    println!("  -u, --url URL          Database URL");
    println!("  -e, --execute SQL      Statement to run, repeatable");
    println!("  -c, --config PATH      JSON session configuration");
    println!("  --isolation LEVEL      Isolation level, e.g. 'read committed'");
    println!("  --read-only            Start the transaction read-only");
    println!("  --timeout-ms N         Abort the transaction after N milliseconds");
    println!("  --dry-run              Roll back instead of committing");
    println!("  -v, --verbose          Enable debug logging");
    println!("  -h, --help             Show this help message");
    println!("  --version              Show version");
    println!();
    println!("Examples:");
    println!("  txsession -u 'sqlite://app.db?mode=rwc' -e 'CREATE TABLE t (x INTEGER)'");
    println!("  txsession -d postgres -u postgres://localhost/app --dry-run -e 'DELETE FROM t'");
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_config(args: &Args) -> Result<SessionConfig, SessionError> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    // Command-line flags override the file.
    if let Some(level) = args.isolation {
        config.options = config.options.isolation(level);
    }
    if args.read_only {
        config.options = config.options.read_only(true);
    }
    if let Some(ms) = args.timeout_ms {
        config = config.timeout(Duration::from_millis(ms));
    }
    Ok(config)
}

async fn run(args: Args) -> Result<(), SessionError> {
    let config = build_config(&args)?;
    let driver: Driver = args.driver.parse()?;
    let url = args.url.as_deref().unwrap_or_default();

    let client = Client::connect(driver, url).await?;
    let session = Session::try_new(&args.driver, client.clone(), config)?;

    let statements = args.statements;
    let dry_run = args.dry_run;
    let s = session.clone();
    let result = session
        .transaction(move |tx| async move {
            for sql in &statements {
                let outcome = s.exec_query(Some(&tx), sql, &[]).await?;
                println!("{} row(s) affected", outcome.rows_affected());
            }
            if dry_run {
                return Err(SessionError::aborted("dry run"));
            }
            Ok::<(), SessionError>(())
        })
        .await;

    client.close().await?;
    match result {
        Err(SessionError::Aborted(_)) if dry_run => {
            println!("Rolled back (dry run)");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let Ok(Parsed::Run(parsed)) = parse_args(args(&[
            "-d",
            "postgres",
            "-u",
            "postgres://localhost/app",
            "-e",
            "DELETE FROM t",
            "-e",
            "INSERT INTO t VALUES (1)",
            "--isolation",
            "repeatable_read",
            "--timeout-ms",
            "250",
            "--dry-run",
        ])) else {
            panic!("expected arguments to parse");
        };

        assert_eq!(parsed.driver, "postgres");
        assert_eq!(parsed.statements.len(), 2);
        assert_eq!(parsed.isolation, Some(IsolationLevel::RepeatableRead));
        assert_eq!(parsed.timeout_ms, Some(250));
        assert!(parsed.dry_run);
        assert!(!parsed.read_only);

        let config = build_config(&parsed).unwrap();
        assert_eq!(config.transaction_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.options.isolation, Some(IsolationLevel::RepeatableRead));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(args(&["-e", "SELECT 1"])).is_err());
        assert!(parse_args(args(&["-u"])).is_err());
        assert!(parse_args(args(&["-u", "x", "--bogus"])).is_err());
        assert!(parse_args(args(&["-u", "x", "--timeout-ms", "soon"])).is_err());
        assert!(parse_args(args(&["-u", "x", "--isolation", "chaos"])).is_err());
    }

    #[tokio::test]
    async fn test_dry_run_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("cli.db").display());

        let Ok(Parsed::Run(create)) =
            parse_args(args(&["-u", &url, "-e", "CREATE TABLE t (x INTEGER)"]))
        else {
            panic!("expected arguments to parse");
        };
        run(create).await.unwrap();

        let Ok(Parsed::Run(dry)) = parse_args(args(&[
            "-u",
            &url,
            "--dry-run",
            "-e",
            "INSERT INTO t VALUES (1)",
        ])) else {
            panic!("expected arguments to parse");
        };
        run(dry).await.unwrap();

        let client = Client::connect(Driver::Sqlite, &url).await.unwrap();
        let session = Session::new("sqlite", client, SessionConfig::default());
        let rows = session
            .query_rows(None, "SELECT x FROM t", &[])
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
