//! Logging bootstrap.
//!
//! Human-readable events go to stderr (stdout carries command output). When a
//! log directory is configured, the same events are also written as JSON
//! lines to a daily-rolling file there.
//!
//! Level selection, highest priority first:
//! - `-v` / `-vv` on the command line (debug / trace)
//! - the `HABITUAL_LOG` filter directive
//! - `info`

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV: &str = "HABITUAL_LOG";
const LOG_FILE_PREFIX: &str = "habitual.log";

/// Install the global subscriber.
///
/// Never panics; a second call is a no-op. Keep the returned guard alive for
/// the life of the process so buffered file output is flushed on exit.
pub fn init(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let directive = filter_directive(verbose, std::env::var(LOG_ENV).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (Some(fmt::layer().json().with_writer(writer)), Some(guard))
            }
            Err(e) => {
                eprintln!(
                    "warning: cannot create log directory {}: {}",
                    dir.display(),
                    e
                );
                (None, None)
            }
        },
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    guard
}

fn filter_directive(verbose: u8, env_value: Option<String>) -> String {
    match verbose {
        0 => env_value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "info".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}
