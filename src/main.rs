//! Habitual CLI - daily habit records and weekly completion rollups.

use clap::Parser;
use habitual::cli::{Cli, Commands, WeekArgs};
use habitual::commands::{self, CommandResult, DailyOverrides, RollupOptions};
use habitual::config::{ResolvedSettings, resolve_settings};
use habitual::logging;
use habitual::publish::PublishOutcome;
use habitual::week::WeekSelector;
use std::process;
use tracing::{error, warn};

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;
    let today = chrono::Local::now().date_naive();

    // `week` needs no configuration at all.
    if let Commands::Week { ref select } = cli.command {
        let _guard = logging::init(cli.verbose, None);
        match commands::week(selector(select), today) {
            Ok(result) => output(&result, human),
            Err(e) => process::exit(report_error(&e, human)),
        }
        return;
    }

    let settings = match resolve_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            let _guard = logging::init(cli.verbose, None);
            process::exit(report_error(&e, human));
        }
    };
    let guard = logging::init(cli.verbose, settings.log_dir());

    let code = run_command(cli.command, &settings, today, human);
    // Flush file logs before exiting.
    drop(guard);
    process::exit(code);
}

/// Run a configured command; returns the process exit code.
///
/// `daily` exits 0 once its arguments are valid; failures are reported on
/// stderr or in its output, not the code.
fn run_command(
    command: Commands,
    settings: &ResolvedSettings,
    today: chrono::NaiveDate,
    human: bool,
) -> i32 {
    match command {
        Commands::Week { .. } => 0,
        Commands::Rollup {
            select,
            dry_run,
            output: output_path,
        } => {
            let options = RollupOptions {
                dry_run,
                output: output_path,
            };
            match commands::rollup(settings, selector(&select), today, &options) {
                Ok(result) => {
                    if let Some(PublishOutcome::AssumedPublished { ref reason }) = result.publish {
                        warn!(reason = %reason, "publish reported a late timeout; treating as success");
                    }
                    output(&result, human);
                    0
                }
                Err(e) => {
                    error!(error = %e, "rollup failed");
                    report_error(&e, human)
                }
            }
        }
        Commands::Daily {
            date,
            reuse_existing,
            link_mode,
        } => {
            let overrides = DailyOverrides {
                reuse_existing,
                link_mode,
            };
            let options = match commands::daily_options(settings, &overrides) {
                Ok(options) => options,
                Err(e) => return report_error(&e, human),
            };
            match commands::daily(settings, date.unwrap_or(today), options) {
                Ok(result) => output(&result, human),
                Err(e) => {
                    error!(error = %e, "daily run could not start");
                    report_error(&e, human);
                }
            }
            // The scheduled daily run always completes successfully.
            0
        }
        Commands::Catalog => {
            output(&commands::catalog(settings), human);
            0
        }
    }
}

fn selector(args: &WeekArgs) -> WeekSelector {
    WeekSelector::from_args(args.date, args.week, args.year)
}

/// Print output in JSON or human-readable format.
fn output<T: CommandResult>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

/// Report `e` on stderr; returns the exit code for a failed command.
fn report_error(e: &habitual::Error, human: bool) -> i32 {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
    1
}
