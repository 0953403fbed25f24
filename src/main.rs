use std::io::{stderr, stdout, BufWriter, Write};
use std::process::exit;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use wallet_ledger::engine::{CommandReplayer, TransferEngine};
use wallet_ledger::storage::{AccountStorage, LedgerStorage};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: wallet-ledger [input].csv [log_level:optional] [lock_timeout_ms:optional] > [output].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        exit(1);
    }

    let path = &args[1];
    let log_level = args.get(2)
        .map(|s| parse_log_level(s)).unwrap_or_else(|| LevelFilter::ERROR);
    let lock_timeout = args.get(3).and_then(|s| parse_lock_timeout(s));

    setup_logging(log_level);

    let accounts = Arc::new(AccountStorage::new());
    let mut engine = TransferEngine::new(accounts.clone(), Arc::new(LedgerStorage::new()));

    if let Some(lock_timeout) = lock_timeout {
        engine = engine.with_lock_timeout(lock_timeout);
    }

    let engine = Arc::new(engine);
    let replayer = CommandReplayer::new(engine.clone());

    let timer = Instant::now();
    let summary = replayer.run(path).await?;
    let duration = timer.elapsed();

    info!(
        "Replay took {duration:?}: [{}] transfers completed, [{}] failed, [{}] commands rejected",
        summary.completed, summary.failed, summary.rejected
    );
    info!("Ledger holds [{}] transaction records", engine.ledger().len());

    write_results_to_stdout(&accounts)?;

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn parse_lock_timeout(millis: &str) -> Option<Duration> {
    match millis.parse::<u64>() {
        Ok(0) => None,
        Ok(millis) => Some(Duration::from_millis(millis)),
        Err(_) => {
            eprintln!("Invalid lock timeout '{}', waiting without a timeout", millis);
            None
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries the account table, logging goes to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_results_to_stdout(accounts: &AccountStorage) -> Result<()> {
    let mut output = BufWriter::new(stdout().lock());

    writeln!(output, "account,balance,currency,status")?;

    for account in accounts.snapshot() {
        writeln!(
            output,
            "{},{},{},{}",
            account.id,
            account.balance.normalize(),
            account.currency,
            account.status_label()
        )?;
    }

    output.flush()?;

    Ok(())
}
