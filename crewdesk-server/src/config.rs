//! Service configuration resolution
//!
//! Combines command-line overrides, environment variables and the TOML
//! file into one `ServiceConfig`. Credentials are read from the
//! environment first and the TOML file second; surrounding quotes are
//! stripped and empty values count as missing.

use crewdesk_common::config::{
    self, env_or_toml, env_value, CompiledDefaults, DataFolderResolver, TomlConfig,
    DEFAULT_ACCOUNTING_URL, DEFAULT_CALL_STATS_URL, DEFAULT_DIRECTORY_ROLE,
    DEFAULT_DIRECTORY_ROLE_ALIAS, DEFAULT_DIRECTORY_URL, DEFAULT_HTTP_TIMEOUT_SECS,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub const WORDPRESS_URL_ENV: &str = "WORDPRESS_URL";
pub const WORDPRESS_USERNAME_ENV: &str = "WORDPRESS_USERNAME";
pub const WORDPRESS_APP_PASSWORD_ENV: &str = "WORDPRESS_APP_PASSWORD";
pub const WORDPRESS_ROLE_ENV: &str = "WORDPRESS_ROLE";
pub const MYPHONER_BASE_URL_ENV: &str = "MYPHONER_BASE_URL";
pub const MYPHONER_API_KEY_ENV: &str = "MYPHONER_API_KEY";
pub const LUCA_API_URL_ENV: &str = "LUCA_API_URL";
pub const LUCA_API_KEY_ENV: &str = "LUCA_API_KEY";

/// Values supplied on the command line (clap already folds in their env
/// fallbacks)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub data_folder: Option<PathBuf>,
}

/// WordPress directory settings
#[derive(Debug, Clone)]
pub struct DirectorySettings {
    pub url: String,
    pub username: Option<String>,
    pub app_password: Option<String>,
    /// Role a user must hold to count as a worker
    pub role: String,
    /// Alternate-language name for the same role
    pub role_alias: Option<String>,
    /// Remove directory-created workers that disappeared upstream
    pub prune_missing: bool,
}

impl DirectorySettings {
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.app_password.is_some()
    }
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_DIRECTORY_URL.to_string(),
            username: None,
            app_password: None,
            role: DEFAULT_DIRECTORY_ROLE.to_string(),
            role_alias: Some(DEFAULT_DIRECTORY_ROLE_ALIAS.to_string()),
            prune_missing: true,
        }
    }
}

/// MyPhoner call-tracking settings
#[derive(Debug, Clone)]
pub struct CallStatsSettings {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for CallStatsSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CALL_STATS_URL.to_string(),
            api_key: None,
        }
    }
}

/// Luca accounting settings
#[derive(Debug, Clone)]
pub struct AccountingSettings {
    pub api_url: String,
    pub api_key: Option<String>,
}

impl Default for AccountingSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_ACCOUNTING_URL.to_string(),
            api_key: None,
        }
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: String,
    pub port: u16,
    pub data_folder: PathBuf,
    pub log_level: String,
    pub http_timeout: Duration,
    pub directory: DirectorySettings,
    pub call_stats: CallStatsSettings,
    pub accounting: AccountingSettings,
}

impl ServiceConfig {
    pub fn resolve(cli: CliOverrides, toml: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_platform();

        let data_folder =
            DataFolderResolver::new(cli.data_folder.as_deref(), toml).resolve();

        let directory = DirectorySettings {
            url: env_or_toml(WORDPRESS_URL_ENV, toml.directory.url.as_ref())
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_DIRECTORY_URL.to_string()),
            username: env_or_toml(WORDPRESS_USERNAME_ENV, toml.directory.username.as_ref()),
            app_password: env_or_toml(
                WORDPRESS_APP_PASSWORD_ENV,
                toml.directory.app_password.as_ref(),
            ),
            role: env_or_toml(WORDPRESS_ROLE_ENV, toml.directory.role.as_ref())
                .unwrap_or_else(|| DEFAULT_DIRECTORY_ROLE.to_string()),
            role_alias: match &toml.directory.role_alias {
                Some(alias) => Some(config::strip_quotes(alias)).filter(|a| !a.is_empty()),
                None => Some(DEFAULT_DIRECTORY_ROLE_ALIAS.to_string()),
            },
            prune_missing: toml.directory.prune_missing.unwrap_or(true),
        };

        let call_stats = CallStatsSettings {
            base_url: env_or_toml(MYPHONER_BASE_URL_ENV, toml.call_stats.base_url.as_ref())
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_CALL_STATS_URL.to_string()),
            api_key: env_or_toml(MYPHONER_API_KEY_ENV, toml.call_stats.api_key.as_ref()),
        };

        let accounting = AccountingSettings {
            api_url: env_or_toml(LUCA_API_URL_ENV, toml.accounting.api_url.as_ref())
                .unwrap_or_else(|| DEFAULT_ACCOUNTING_URL.to_string()),
            api_key: env_or_toml(LUCA_API_KEY_ENV, toml.accounting.api_key.as_ref()),
        };

        Self {
            bind: cli
                .bind
                .or_else(|| toml.bind.clone())
                .unwrap_or(defaults.bind),
            port: cli.port.or(toml.port).unwrap_or(defaults.port),
            data_folder,
            log_level: env_value("CREWDESK_LOG_LEVEL").unwrap_or_else(|| toml.logging.level.clone()),
            http_timeout: Duration::from_secs(
                toml.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            directory,
            call_stats,
            accounting,
        }
    }

    /// Log which integrations are configured (never the secrets themselves)
    pub fn log_summary(&self) {
        info!("Data folder: {}", self.data_folder.display());
        info!("WordPress URL: {}", self.directory.url);
        info!(
            "WordPress username: {}",
            config::describe_secret(self.directory.username.as_deref())
        );
        info!(
            "WordPress app password: {}",
            config::describe_secret(self.directory.app_password.as_deref())
        );
        info!(
            "WordPress role filter: {} (alias: {})",
            self.directory.role,
            self.directory.role_alias.as_deref().unwrap_or("none")
        );
        info!(
            "MyPhoner API key: {}",
            config::describe_secret(self.call_stats.api_key.as_deref())
        );
        info!(
            "Luca API key: {}",
            config::describe_secret(self.accounting.api_key.as_deref())
        );
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        Self {
            bind: defaults.bind,
            port: defaults.port,
            data_folder: defaults.data_folder,
            log_level: defaults.log_level,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            directory: DirectorySettings::default(),
            call_stats: CallStatsSettings::default(),
            accounting: AccountingSettings::default(),
        }
    }
}
