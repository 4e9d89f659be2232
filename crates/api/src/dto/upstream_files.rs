use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use sluice_dns_domain::{ManagedFileUpdate, ManagedFilesSnapshot, ManagedUpstreamFile};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamFileResponse {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub enabled: bool,
    pub rules_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl UpstreamFileResponse {
    pub fn from_file(file: &ManagedUpstreamFile) -> Self {
        Self {
            id: file.id,
            url: file.url.clone(),
            name: file.name.clone(),
            enabled: file.enabled,
            rules_count: file.rules_count,
            last_updated: file
                .last_updated
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

/// Managed files plus the update interval in hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamFilesStatusResponse {
    pub files: Vec<UpstreamFileResponse>,
    pub interval: u32,
}

impl From<ManagedFilesSnapshot> for UpstreamFilesStatusResponse {
    fn from(snapshot: ManagedFilesSnapshot) -> Self {
        Self {
            files: snapshot.files.iter().map(UpstreamFileResponse::from_file).collect(),
            interval: snapshot.update_interval_hours,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddUrlRequest {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveUrlRequest {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetUrlData {
    pub name: String,
    pub url: String,
    pub enabled: bool,
}

/// `url` selects the entry, `data` is its new state.
#[derive(Debug, Clone, Deserialize)]
pub struct SetUrlRequest {
    pub url: String,
    pub data: SetUrlData,
}

impl From<SetUrlData> for ManagedFileUpdate {
    fn from(data: SetUrlData) -> Self {
        Self {
            name: data.name,
            url: data.url,
            enabled: data.enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub updated: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
