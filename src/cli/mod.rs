//! CLI argument definitions for Habitual.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("HABITUAL_GIT_COMMIT"),
    ", built ",
    env!("HABITUAL_BUILD_TIMESTAMP"),
    ")"
);

/// Habitual - daily habit records and weekly completion rollups.
///
/// Run `habitual daily` once a day to create linked records, and
/// `habitual rollup` once a week to publish the completion chart.
#[derive(Parser, Debug)]
#[command(name = "habitual")]
#[command(author, version, long_version = LONG_VERSION, about = "Daily habit records and weekly completion rollups", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Read configuration from <path> instead of the default location
    #[arg(long = "config", global = true, env = "HABITUAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Week selection shared by `week` and `rollup`.
///
/// With neither flag the current week is used.
#[derive(Args, Debug, Clone, Default)]
pub struct WeekArgs {
    /// Any date inside the week (YYYY-MM-DD)
    #[arg(long, conflicts_with = "week")]
    pub date: Option<NaiveDate>,

    /// ISO week number (1-53)
    #[arg(long)]
    pub week: Option<u32>,

    /// ISO year for --week (defaults to the current year)
    #[arg(long, requires = "week")]
    pub year: Option<i32>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the Monday-Sunday window a selection resolves to
    Week {
        #[command(flatten)]
        select: WeekArgs,
    },

    /// Compute the weekly completion rollup and publish its chart
    Rollup {
        #[command(flatten)]
        select: WeekArgs,

        /// Compute and print the rows without rendering or publishing
        #[arg(long)]
        dry_run: bool,

        /// Also write the rendered chart to <file>
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Create today's record for every habit and link it to its week
    Daily {
        /// Treat <date> as today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Re-link an existing record for the day instead of creating another
        #[arg(long)]
        reuse_existing: bool,

        /// Sibling linking: "one-way" or "clique" (overrides config)
        #[arg(long, value_name = "MODE")]
        link_mode: Option<String>,
    },

    /// List the habit catalog in effect
    Catalog,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rollup_with_iso_week() {
        let cli = Cli::try_parse_from(["habitual", "rollup", "--week", "1", "--year", "2021", "--dry-run"])
            .unwrap();
        match cli.command {
            Commands::Rollup { select, dry_run, output } => {
                assert_eq!(select.week, Some(1));
                assert_eq!(select.year, Some(2021));
                assert!(dry_run);
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_date_conflicts_with_week() {
        let result = Cli::try_parse_from(["habitual", "week", "--date", "2024-01-03", "--week", "2"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_year_requires_week() {
        assert!(Cli::try_parse_from(["habitual", "week", "--year", "2021"]).is_err());
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["habitual", "daily", "--date", "2024-13-01"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["habitual", "catalog", "-H", "-vv"]).unwrap();
        assert!(cli.human_readable);
        assert_eq!(cli.verbose, 2);
    }
}
