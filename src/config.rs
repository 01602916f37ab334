//! Runtime configuration, read once at process start.
//!
//! Nothing in the fetcher or normalizer looks at the environment; the binary
//! builds these structs and passes them down.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::data_sources::kobo::FetchOptions;
use crate::error::ConfigError;

/// Default KoboToolbox server.
pub const DEFAULT_BASE_URL: &str = "https://kf.kobotoolbox.org";

/// Default location of the consolidated submissions file.
pub const DEFAULT_SUBMISSIONS_PATH: &str = "data/submissions.json";

/// Default location of the normalized activities file.
pub const DEFAULT_ACTIVITIES_PATH: &str = "data/activities.json";

/// Settings needed to talk to the KoboToolbox API.
#[derive(Debug, Clone)]
pub struct KoboConfig {
    /// Server root, e.g. `https://kf.kobotoolbox.org`.
    pub base_url: String,
    /// API token sent as `Authorization: Token <token>`.
    pub token: String,
    /// Form (asset) identifier whose submissions are fetched.
    pub asset_uid: String,
    pub fetch: FetchOptions,
}

impl KoboConfig {
    /// Read from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through an arbitrary lookup function.
    ///
    /// Required settings that are absent or blank fail before anything
    /// touches the network.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = required(&lookup, "KOBO_TOKEN")?;
        let asset_uid = required(&lookup, "KOBO_ASSET_UID")?;
        let base_url = optional(&lookup, "KOBO_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let defaults = FetchOptions::default();
        let fetch = FetchOptions {
            timeout: parsed::<u64, _>(&lookup, "KOBO_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_pages: parsed(&lookup, "KOBO_MAX_PAGES")?.unwrap_or(defaults.max_pages),
            page_delay: parsed::<u64, _>(&lookup, "KOBO_PAGE_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.page_delay),
            retry_backoff: parsed::<u64, _>(&lookup, "KOBO_RETRY_BACKOFF_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
        };

        if fetch.max_pages == 0 {
            return Err(ConfigError::Invalid {
                name: "KOBO_MAX_PAGES",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            base_url,
            token,
            asset_uid,
            fetch,
        })
    }
}

/// Input and output file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// Consolidated submissions written by `fetch`, read by `transform`.
    pub submissions: PathBuf,
    /// Normalized activities written by `transform`.
    pub activities: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            submissions: PathBuf::from(DEFAULT_SUBMISSIONS_PATH),
            activities: PathBuf::from(DEFAULT_ACTIVITIES_PATH),
        }
    }
}

impl DataPaths {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            submissions: optional(&lookup, "SUBMISSIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.submissions),
            activities: optional(&lookup, "ACTIVITIES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.activities),
        }
    }
}

/// Trimmed value, `None` when absent or blank.
fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or(ConfigError::Missing { name })
}

fn parsed<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}
