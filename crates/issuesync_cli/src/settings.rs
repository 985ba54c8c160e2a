//! Settings file loading and command-line overrides.

use crate::error::CliError;
use issuesync_engine::{RetryConfig, SyncConfig, DEFAULT_ENDPOINT};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "ISSUESYNC_API_KEY";

/// Settings file contents. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct FileSettings {
    /// Remote collection (team) identifier.
    pub collection_id: Option<String>,
    /// GraphQL endpoint.
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Interval between scheduled runs in seconds.
    pub sync_interval_secs: Option<u64>,
    /// Retry policy for page fetches.
    pub retry: Option<FileRetry>,
}

/// Retry section of the settings file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct FileRetry {
    /// Maximum attempts per page.
    pub max_attempts: Option<u32>,
    /// First backoff delay in milliseconds.
    pub initial_delay_ms: Option<u64>,
    /// Backoff cap in milliseconds.
    pub max_delay_ms: Option<u64>,
}

impl FileSettings {
    /// Reads a settings file.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// `--collection`
    pub collection_id: Option<String>,
    /// `--endpoint`
    pub endpoint: Option<String>,
    /// `--interval`
    pub sync_interval_secs: Option<u64>,
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Engine configuration.
    pub sync: SyncConfig,
    /// GraphQL endpoint.
    pub endpoint: String,
    /// API key, if one was found.
    pub api_key: Option<String>,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Settings {
    /// Resolves settings: command line, then file, then environment.
    pub fn resolve(file: FileSettings, overrides: Overrides) -> Result<Self, CliError> {
        let env = SyncConfig::from_env();
        let collection_id = overrides
            .collection_id
            .or(file.collection_id)
            .or(env.collection_id);

        let retry = match file.retry {
            Some(r) => {
                let defaults = RetryConfig::default();
                let max_attempts = r.max_attempts.unwrap_or(defaults.max_attempts);
                if max_attempts == 0 {
                    return Err(CliError::InvalidSetting {
                        key: "retry.maxAttempts",
                        reason: "must be at least 1".into(),
                    });
                }
                RetryConfig::new(max_attempts)
                    .with_initial_delay(
                        r.initial_delay_ms
                            .map(Duration::from_millis)
                            .unwrap_or(defaults.initial_delay),
                    )
                    .with_max_delay(
                        r.max_delay_ms
                            .map(Duration::from_millis)
                            .unwrap_or(defaults.max_delay),
                    )
            }
            None => RetryConfig::default(),
        };

        let mut sync = SyncConfig::default()
            .with_collection_id(collection_id)
            .with_retry(retry);
        match overrides.sync_interval_secs.or(file.sync_interval_secs) {
            Some(0) => {
                return Err(CliError::InvalidSetting {
                    key: "syncIntervalSecs",
                    reason: "must be greater than zero".into(),
                })
            }
            Some(secs) => sync = sync.with_sync_interval(Duration::from_secs(secs)),
            None => {}
        }

        let api_key_env = file.api_key_env.as_deref().unwrap_or(API_KEY_ENV);
        let api_key = std::env::var(api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            sync,
            endpoint: overrides
                .endpoint
                .or(file.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key,
            request_timeout: Duration::from_secs(file.request_timeout_secs.unwrap_or(30)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_settings(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_settings_file() {
        let file = write_settings(
            r#"{
                "collectionId": "team-eng",
                "endpoint": "http://localhost:4000/graphql",
                "syncIntervalSecs": 120,
                "retry": { "maxAttempts": 5, "initialDelayMs": 10 }
            }"#,
        );

        let settings =
            Settings::resolve(FileSettings::load(file.path()).unwrap(), Overrides::default())
                .unwrap();
        assert_eq!(settings.sync.collection_id.as_deref(), Some("team-eng"));
        assert_eq!(settings.endpoint, "http://localhost:4000/graphql");
        assert_eq!(settings.sync.sync_interval, Some(Duration::from_secs(120)));
        assert_eq!(settings.sync.retry.max_attempts, 5);
        assert_eq!(settings.sync.retry.initial_delay, Duration::from_millis(10));
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn command_line_wins_over_file() {
        let file = FileSettings {
            collection_id: Some("from-file".into()),
            endpoint: Some("http://file".into()),
            ..FileSettings::default()
        };
        let overrides = Overrides {
            collection_id: Some("from-flag".into()),
            endpoint: None,
            sync_interval_secs: Some(60),
        };

        let settings = Settings::resolve(file, overrides).unwrap();
        assert_eq!(settings.sync.collection_id.as_deref(), Some("from-flag"));
        assert_eq!(settings.endpoint, "http://file");
        assert_eq!(settings.sync.sync_interval, Some(Duration::from_secs(60)));
    }

    #[test]
    fn defaults_without_file() {
        let settings = Settings::resolve(FileSettings::default(), Overrides::default()).unwrap();
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.sync.sync_interval, None);
    }

    #[test]
    fn rejects_unknown_fields() {
        let file = write_settings(r#"{ "collection": "typo" }"#);
        assert!(matches!(
            FileSettings::load(file.path()),
            Err(CliError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_zero_interval_and_attempts() {
        let overrides = Overrides {
            sync_interval_secs: Some(0),
            ..Overrides::default()
        };
        assert!(Settings::resolve(FileSettings::default(), overrides).is_err());

        let file = FileSettings {
            retry: Some(FileRetry {
                max_attempts: Some(0),
                ..FileRetry::default()
            }),
            ..FileSettings::default()
        };
        assert!(Settings::resolve(file, Overrides::default()).is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileSettings::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(CliError::Read { .. })));
    }
}
