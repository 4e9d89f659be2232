use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under the data dir that holds cached managed upstream files.
pub const UPSTREAM_FILES_DIR: &str = "upstream_dns";

/// Suffix of a cache file moved aside on removal or replacement.
pub const OLD_FILE_SUFFIX: &str = ".old";

/// An externally sourced, periodically refreshed list of upstream servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedUpstreamFile {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rules_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl ManagedUpstreamFile {
    pub fn new(id: i64, url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            name: name.into(),
            enabled: true,
            last_updated: None,
            rules_count: 0,
            checksum: None,
        }
    }

    /// Location of the cached content under `data_dir`.
    pub fn path(&self, data_dir: &Path) -> PathBuf {
        data_dir
            .join(UPSTREAM_FILES_DIR)
            .join(format!("{}.txt", self.id))
    }

    /// True when the cached content is older than `interval_hours`.
    ///
    /// A zero interval means automatic updates are off, so nothing is stale.
    /// A file that was never fetched is always stale.
    pub fn is_stale(&self, interval_hours: u32, now: DateTime<Utc>) -> bool {
        if interval_hours == 0 {
            return false;
        }
        match self.last_updated {
            None => true,
            Some(updated) => updated + Duration::hours(i64::from(interval_hours)) <= now,
        }
    }

    /// Drops the in-memory view of the cached content.
    pub fn unload(&mut self) {
        self.rules_count = 0;
        self.checksum = None;
    }
}

/// Path with `suffix` appended to the file name.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// Property changes requested for a managed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedFileUpdate {
    pub name: String,
    pub url: String,
    pub enabled: bool,
}

/// Validated content of one fetched list, held in memory until committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedList {
    pub content: String,
    pub rules_count: usize,
    pub checksum: String,
}

/// Point-in-time copy of the managed-file set.
#[derive(Debug, Clone, Default)]
pub struct ManagedFilesSnapshot {
    pub files: Vec<ManagedUpstreamFile>,
    pub update_interval_hours: u32,
}

/// Result of one refresh pass that acquired the refresh guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub updated: usize,
    pub network_error: bool,
}
