//! Configuration for Habitual.
//!
//! Settings come from an optional KDL file plus environment variables:
//!
//! ## config.kdl
//!
//! Located at `~/.config/habitual/config.kdl` unless `--config` or
//! `HABITUAL_CONFIG` points elsewhere. Contains:
//! - `store` - database id, page size, API version
//! - `properties` - property names in the habit database
//! - `dashboard` - page the weekly chart is embedded on
//! - `publisher` - image host cloud name, folder and signing algorithm
//! - `daily` - re-run policy and link mode
//! - `logging` - directory for JSON log files
//! - `habit` nodes - the habit catalog (replaces the built-in one)
//!
//! ## Secrets
//!
//! API tokens and secrets are only read from the environment, never from
//! the config file.
//!
//! ## Precedence
//!
//! env var > config file > defaults
//!
//! Use the [`resolver`] module for unified precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    NotionCredentials, Resolved, ResolvedSettings, ValueSource, default_config_path,
    resolve_settings, resolve_settings_with_env,
};
pub use schema::{HabitualConfig, PropertyNames, default_habits};
