//! Unified precedence resolution for settings.
//!
//! ## Config file location (highest to lowest)
//!
//! 1. `--config` CLI flag
//! 2. `HABITUAL_CONFIG` environment variable
//! 3. `<config_dir>/habitual/config.kdl` (if it exists)
//! 4. None - built-in defaults only
//!
//! ## Value precedence (highest to lowest)
//!
//! 1. Environment variable
//! 2. config.kdl
//! 3. Built-in defaults
//!
//! Secrets (`NOTION_TOKEN`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`)
//! only ever come from the environment.

use crate::config::schema::{HabitualConfig, PropertyNames, default_habits, expand_home};
use crate::daily::{DailyOptions, ExistingPolicy, LinkMode};
use crate::models::HabitCatalog;
use crate::publish::cloudinary::{CloudinaryCredentials, SignatureAlgorithm};
use crate::store::DEFAULT_PAGE_SIZE;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "HABITUAL_CONFIG";
pub const NOTION_TOKEN_ENV: &str = "NOTION_TOKEN";
pub const DATABASE_ID_ENV: &str = "DATABASE_ID";
pub const DASHBOARD_PAGE_ID_ENV: &str = "DASHBOARD_PAGE_ID";
pub const CLOUD_NAME_ENV: &str = "CLOUDINARY_CLOUD_NAME";
pub const CLOUD_API_KEY_ENV: &str = "CLOUDINARY_API_KEY";
pub const CLOUD_API_SECRET_ENV: &str = "CLOUDINARY_API_SECRET";
pub const CLOUD_FOLDER_ENV: &str = "CLOUDINARY_UPLOAD_FOLDER";
pub const LOG_DIR_ENV: &str = "HABITUAL_LOG_DIR";

pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
pub const DEFAULT_CLOUD_FOLDER: &str = "notion-charts";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    File(String),
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::File(path) => write!(f, "file:{}", path),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Credentials and addressing for the hosted record store.
#[derive(Debug, Clone)]
pub struct NotionCredentials {
    pub token: String,
    pub database_id: String,
    pub notion_version: String,
}

/// Fully resolved settings with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    /// Config file that was read, if any
    pub config_path: Option<PathBuf>,
    pub notion_token: Option<Resolved<String>>,
    pub database_id: Option<Resolved<String>>,
    pub notion_version: Resolved<String>,
    pub page_size: Resolved<usize>,
    pub properties: PropertyNames,
    pub dashboard_page_id: Option<Resolved<String>>,
    pub cloud_name: Option<Resolved<String>>,
    pub cloud_api_key: Option<Resolved<String>>,
    pub cloud_api_secret: Option<Resolved<String>>,
    pub cloud_folder: Resolved<String>,
    pub signature_algorithm: Resolved<SignatureAlgorithm>,
    pub on_existing: Resolved<ExistingPolicy>,
    pub link_mode: Resolved<LinkMode>,
    pub log_dir: Option<Resolved<PathBuf>>,
    pub catalog: Resolved<HabitCatalog>,
}

impl ResolvedSettings {
    pub fn page_size(&self) -> usize {
        self.page_size.value
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_ref().map(|r| r.value.as_path())
    }

    pub fn catalog(&self) -> &HabitCatalog {
        &self.catalog.value
    }

    /// Store credentials, or a config error naming the first missing variable.
    pub fn notion_credentials(&self) -> Result<NotionCredentials> {
        Ok(NotionCredentials {
            token: required(&self.notion_token, NOTION_TOKEN_ENV)?,
            database_id: required(&self.database_id, DATABASE_ID_ENV)?,
            notion_version: self.notion_version.value.clone(),
        })
    }

    pub fn dashboard_page_id(&self) -> Result<String> {
        required(&self.dashboard_page_id, DASHBOARD_PAGE_ID_ENV)
    }

    pub fn cloudinary(&self) -> Result<CloudinaryCredentials> {
        Ok(CloudinaryCredentials {
            cloud_name: required(&self.cloud_name, CLOUD_NAME_ENV)?,
            api_key: required(&self.cloud_api_key, CLOUD_API_KEY_ENV)?,
            api_secret: required(&self.cloud_api_secret, CLOUD_API_SECRET_ENV)?,
            folder: self.cloud_folder.value.clone(),
            signature_algorithm: self.signature_algorithm.value,
        })
    }

    pub fn daily_options(&self) -> DailyOptions {
        DailyOptions {
            on_existing: self.on_existing.value,
            link_mode: self.link_mode.value,
            page_size: self.page_size(),
        }
    }
}

fn required(value: &Option<Resolved<String>>, env_name: &str) -> Result<String> {
    value
        .as_ref()
        .map(|r| r.value.clone())
        .ok_or_else(|| Error::Config(format!("{} is not set", env_name)))
}

/// Resolve settings from the process environment and the config file.
pub fn resolve_settings(explicit_config: Option<&Path>) -> Result<ResolvedSettings> {
    resolve_settings_with_env(explicit_config, |name| std::env::var(name).ok())
}

/// Resolve settings using `env` for environment lookups.
pub fn resolve_settings_with_env(
    explicit_config: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedSettings> {
    let env = |name: &str| env(name).filter(|v| !v.is_empty());

    let config_path = locate_config_file(explicit_config, &env)?;
    let (file, file_source) = match config_path {
        Some(ref path) => (
            HabitualConfig::load(path)?,
            ValueSource::File(path.display().to_string()),
        ),
        None => (HabitualConfig::new(), ValueSource::Default),
    };

    let layered = |env_name: &str, file_value: &Option<String>| -> Option<Resolved<String>> {
        if let Some(value) = env(env_name) {
            return Some(Resolved::new(value, ValueSource::EnvVar(env_name.to_string())));
        }
        file_value
            .clone()
            .map(|v| Resolved::new(v, file_source.clone()))
    };
    let from_env = |env_name: &str| -> Option<Resolved<String>> {
        env(env_name).map(|v| Resolved::new(v, ValueSource::EnvVar(env_name.to_string())))
    };

    let cloud_folder = layered(CLOUD_FOLDER_ENV, &file.cloud_folder).unwrap_or_else(|| {
        Resolved::new(DEFAULT_CLOUD_FOLDER.to_string(), ValueSource::Default)
    });

    let log_dir = match env(LOG_DIR_ENV) {
        Some(dir) => Some(Resolved::new(
            expand_home(Path::new(&dir)),
            ValueSource::EnvVar(LOG_DIR_ENV.to_string()),
        )),
        None => file
            .log_dir
            .clone()
            .map(|d| Resolved::new(d, file_source.clone())),
    };

    let catalog = if file.habits.is_empty() {
        Resolved::new(HabitCatalog::new(default_habits()?)?, ValueSource::Default)
    } else {
        let catalog = HabitCatalog::new(file.habits.clone())
            .map_err(|e| Error::Config(e.to_string()))?;
        Resolved::new(catalog, file_source.clone())
    };

    Ok(ResolvedSettings {
        notion_token: from_env(NOTION_TOKEN_ENV),
        database_id: layered(DATABASE_ID_ENV, &file.database_id),
        notion_version: from_file(
            file.notion_version.clone(),
            DEFAULT_NOTION_VERSION.to_string(),
            &file_source,
        ),
        page_size: from_file(file.page_size, DEFAULT_PAGE_SIZE, &file_source),
        properties: file.properties.clone(),
        dashboard_page_id: layered(DASHBOARD_PAGE_ID_ENV, &file.dashboard_page_id),
        cloud_name: layered(CLOUD_NAME_ENV, &file.cloud_name),
        cloud_api_key: from_env(CLOUD_API_KEY_ENV),
        cloud_api_secret: from_env(CLOUD_API_SECRET_ENV),
        cloud_folder,
        signature_algorithm: from_file(
            file.signature_algorithm,
            SignatureAlgorithm::default(),
            &file_source,
        ),
        on_existing: from_file(file.on_existing, ExistingPolicy::default(), &file_source),
        link_mode: from_file(file.link_mode, LinkMode::default(), &file_source),
        log_dir,
        catalog,
        config_path,
    })
}

/// A file value when set, otherwise the built-in default.
fn from_file<T>(value: Option<T>, default: T, file_source: &ValueSource) -> Resolved<T> {
    match value {
        Some(v) => Resolved::new(v, file_source.clone()),
        None => Resolved::new(default, ValueSource::Default),
    }
}

/// Find the config file to read, if any.
///
/// An explicitly named file (flag or env var) must exist; the default
/// location is optional.
fn locate_config_file(
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Option<PathBuf>> {
    let named = explicit
        .map(Path::to_path_buf)
        .or_else(|| env(CONFIG_ENV).map(PathBuf::from));

    if let Some(path) = named {
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file does not exist: {}",
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    Ok(default_config_path().filter(|p| p.exists()))
}

/// `<config_dir>/habitual/config.kdl`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("habitual").join("config.kdl"))
}
