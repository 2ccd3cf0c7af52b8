//! Environment-driven settings.

use service_migration_shared::LegacyRecordFilter;
use std::env;
use std::time::Duration;
use tracing::warn;

use crate::orchestrator::OrchestratorConfig;
use crate::MigrationError;

/// Default legacy database URL.
const DEFAULT_LEGACY_DATABASE_URL: &str = "postgres://localhost:5432/pathwaysdos";

/// Default canonical store database URL.
const DEFAULT_CANONICAL_DATABASE_URL: &str = "postgres://localhost:5432/service_migration";

/// Default number of records per legacy page.
const DEFAULT_PAGE_SIZE: usize = 500;

/// Default page ceiling for one full sync.
const DEFAULT_MAX_PAGES: usize = 10_000;

/// Default legacy service types scanned by a full sync.
const DEFAULT_TYPE_IDS: &str = "100,136,159";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for the databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry the connection at a fixed interval until it succeeds.
    Retry,
}

impl ConnectionMode {
    /// Valid values: "fail-fast" or "retry" (case-insensitive). Anything else is "retry".
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid DATABASE_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Everything the binary reads from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub legacy_database_url: String,
    pub canonical_database_url: String,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub orchestrator: OrchestratorConfig,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `LEGACY_DATABASE_URL`: legacy directory database
    /// - `CANONICAL_DATABASE_URL`: canonical store and version history database
    /// - `SYNC_PAGE_SIZE`: records per page (default: 500)
    /// - `SYNC_MAX_PAGES`: page ceiling for a full sync (default: 10000)
    /// - `SYNC_TYPE_IDS`: comma-separated type ids to scan (default: 100,136,159)
    /// - `SYNC_STATUS_IDS`: comma-separated status ids to scan (default: all)
    /// - `INVOCATION_TIMEOUT_SECS`: invocation deadline (default: none)
    /// - `DATABASE_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `DATABASE_RETRY_INTERVAL_SECS`: retry interval in seconds (default: 15)
    pub fn from_env() -> Result<Self, MigrationError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`, which returns the value of a variable if set.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MigrationError> {
        let legacy_database_url = lookup("LEGACY_DATABASE_URL")
            .unwrap_or_else(|| DEFAULT_LEGACY_DATABASE_URL.to_string());
        let canonical_database_url = lookup("CANONICAL_DATABASE_URL")
            .unwrap_or_else(|| DEFAULT_CANONICAL_DATABASE_URL.to_string());
        let connection_mode = ConnectionMode::parse(lookup("DATABASE_CONNECTION_MODE"));
        let retry_interval = lookup("DATABASE_RETRY_INTERVAL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);

        let page_size = parse_or("SYNC_PAGE_SIZE", lookup("SYNC_PAGE_SIZE"), DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(MigrationError::config("SYNC_PAGE_SIZE must be greater than 0"));
        }
        let max_pages = parse_or("SYNC_MAX_PAGES", lookup("SYNC_MAX_PAGES"), DEFAULT_MAX_PAGES)?;
        let type_ids = parse_id_list(
            "SYNC_TYPE_IDS",
            &lookup("SYNC_TYPE_IDS").unwrap_or_else(|| DEFAULT_TYPE_IDS.to_string()),
        )?;
        let status_ids = parse_id_list("SYNC_STATUS_IDS", &lookup("SYNC_STATUS_IDS").unwrap_or_default())?;
        let invocation_timeout = lookup("INVOCATION_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                    MigrationError::config(format!("INVOCATION_TIMEOUT_SECS is not a number: {raw}"))
                })
            })
            .transpose()?;

        Ok(Self {
            legacy_database_url,
            canonical_database_url,
            connection_mode,
            retry_interval: Duration::from_secs(retry_interval),
            orchestrator: OrchestratorConfig {
                page_size,
                max_pages,
                invocation_timeout,
                filter: LegacyRecordFilter {
                    type_ids,
                    status_ids,
                },
            },
        })
    }
}

fn parse_or(name: &str, raw: Option<String>, default: usize) -> Result<usize, MigrationError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| MigrationError::config(format!("{name} is not a number: {raw}"))),
        None => Ok(default),
    }
}

fn parse_id_list(name: &str, raw: &str) -> Result<Vec<i64>, MigrationError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| MigrationError::config(format!("{name} contains an invalid id: {part}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, MigrationError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.legacy_database_url, DEFAULT_LEGACY_DATABASE_URL);
        assert_eq!(settings.connection_mode, ConnectionMode::Retry);
        assert_eq!(settings.retry_interval, Duration::from_secs(15));
        assert_eq!(settings.orchestrator.page_size, 500);
        assert_eq!(settings.orchestrator.max_pages, 10_000);
        assert_eq!(settings.orchestrator.filter.type_ids, vec![100, 136, 159]);
        assert!(settings.orchestrator.filter.status_ids.is_empty());
        assert_eq!(settings.orchestrator.invocation_timeout, None);
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("SYNC_PAGE_SIZE", "50"),
            ("SYNC_TYPE_IDS", "100"),
            ("SYNC_STATUS_IDS", "1, 3"),
            ("INVOCATION_TIMEOUT_SECS", "840"),
            ("DATABASE_CONNECTION_MODE", "FAIL-FAST"),
        ])
        .unwrap();
        assert_eq!(settings.orchestrator.page_size, 50);
        assert_eq!(settings.orchestrator.filter.type_ids, vec![100]);
        assert_eq!(settings.orchestrator.filter.status_ids, vec![1, 3]);
        assert_eq!(
            settings.orchestrator.invocation_timeout,
            Some(Duration::from_secs(840))
        );
        assert_eq!(settings.connection_mode, ConnectionMode::FailFast);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for vars in [
            [("SYNC_PAGE_SIZE", "many")],
            [("SYNC_PAGE_SIZE", "0")],
            [("SYNC_TYPE_IDS", "100,gp")],
            [("INVOCATION_TIMEOUT_SECS", "soon")],
        ] {
            assert!(matches!(settings(&vars), Err(MigrationError::ConfigError(_))));
        }
    }
}
