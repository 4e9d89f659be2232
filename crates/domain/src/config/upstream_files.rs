use crate::managed_file::ManagedUpstreamFile;
use serde::{Deserialize, Serialize};

/// Managed upstream files configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamFilesConfig {
    /// Hours between automatic refreshes (0 disables background updates)
    #[serde(default = "default_update_interval_hours")]
    pub update_interval_hours: u32,

    /// Seconds between checks of the background refresh job (default: 3600)
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    #[serde(default)]
    pub files: Vec<ManagedUpstreamFile>,
}

impl Default for UpstreamFilesConfig {
    fn default() -> Self {
        Self {
            update_interval_hours: default_update_interval_hours(),
            check_interval_secs: default_check_interval_secs(),
            files: vec![],
        }
    }
}

fn default_update_interval_hours() -> u32 {
    24
}

fn default_check_interval_secs() -> u64 {
    3600
}
