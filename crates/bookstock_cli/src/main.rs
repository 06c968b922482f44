//! Fixture loading entry point.
//!
//! # Responsibility
//! - Bootstrap file logging for the process.
//! - Open (and migrate) the target database.
//! - Load one fixture file and report the outcome.

use std::path::Path;
use std::process::ExitCode;

const DEFAULT_DB_PATH: &str = "bookstock.db";

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(fixture_path) = args.next() else {
        eprintln!("usage: bookstock <fixture.json> [db-path]");
        return ExitCode::FAILURE;
    };
    let db_path = args.next().unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    // Core modules emit event=... lines through the `log` facade; without
    // this bootstrap they would be dropped. A logging failure must not
    // block the load itself.
    match std::env::current_dir() {
        Ok(base_dir) => {
            if let Err(err) = bootstrap_logging(&base_dir) {
                eprintln!("logging disabled: {err}");
            }
        }
        Err(err) => eprintln!("logging disabled: cannot resolve current directory: {err}"),
    }

    let mut conn = match bookstock_core::db::open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open database `{db_path}`: {err}");
            return ExitCode::FAILURE;
        }
    };

    match bookstock_core::load_fixture_file(&mut conn, &fixture_path) {
        Ok(count) => {
            println!("loaded {count} rows from {fixture_path}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("fixture load failed, nothing was committed: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes rotating file logs under `<base_dir>/logs`.
fn bootstrap_logging(base_dir: &Path) -> Result<(), String> {
    let log_dir = base_dir.join("logs");
    let log_dir = log_dir
        .to_str()
        .ok_or_else(|| "log directory path is not valid UTF-8".to_string())?;
    bookstock_core::init_logging(bookstock_core::default_log_level(), log_dir)
}

#[cfg(test)]
mod tests {
    use super::bootstrap_logging;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn bootstrap_activates_logging_under_base_dir() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after unix epoch")
            .as_nanos();
        let base_dir = std::env::temp_dir().join(format!(
            "bookstock-cli-logging-{}-{nanos}",
            std::process::id()
        ));

        bootstrap_logging(&base_dir).expect("bootstrap should succeed");
        // A second call with the same base dir must stay idempotent.
        bootstrap_logging(&base_dir).expect("bootstrap should be idempotent");

        let (_, active_dir) =
            bookstock_core::logging_status().expect("logging should be active");
        assert_eq!(active_dir, base_dir.join("logs"));
    }
}
