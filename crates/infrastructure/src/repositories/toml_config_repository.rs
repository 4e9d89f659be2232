use async_trait::async_trait;
use sluice_dns_application::ports::ConfigPersistence;
use sluice_dns_domain::{DomainError, ManagedFilesSnapshot, ManagedUpstreamFile};
use std::io::ErrorKind;
use std::path::PathBuf;
use toml_edit::{value, ArrayOfTables, DocumentMut, Item, Table};
use tracing::{debug, info};

/// Rewrites the `[upstream_files]` section of the TOML config file in place,
/// keeping every other section, comment and formatting untouched.
pub struct TomlConfigRepository {
    path: Option<PathBuf>,
}

impl TomlConfigRepository {
    /// `None` runs without a config file; saves become no-ops.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

fn file_table(file: &ManagedUpstreamFile) -> Table {
    let mut table = Table::new();
    table["id"] = value(file.id);
    table["url"] = value(file.url.as_str());
    table["name"] = value(file.name.as_str());
    table["enabled"] = value(file.enabled);
    if let Some(updated) = file.last_updated {
        table["last_updated"] = value(updated.to_rfc3339());
    }
    table["rules_count"] = value(file.rules_count as i64);
    if let Some(checksum) = &file.checksum {
        table["checksum"] = value(checksum.as_str());
    }
    table
}

/// Applies `snapshot` to `doc`.
pub fn write_upstream_files(doc: &mut DocumentMut, snapshot: &ManagedFilesSnapshot) {
    if !doc.contains_table("upstream_files") {
        doc["upstream_files"] = Item::Table(Table::new());
    }
    let section = &mut doc["upstream_files"];
    section["update_interval_hours"] = value(i64::from(snapshot.update_interval_hours));

    let mut files = ArrayOfTables::new();
    for file in &snapshot.files {
        files.push(file_table(file));
    }
    section["files"] = Item::ArrayOfTables(files);
}

#[async_trait]
impl ConfigPersistence for TomlConfigRepository {
    async fn save_upstream_files(&self, snapshot: &ManagedFilesSnapshot) -> Result<(), DomainError> {
        let Some(path) = &self.path else {
            debug!("No config file, upstream DNS files kept in memory only");
            return Ok(());
        };

        let current = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(DomainError::IoError(format!(
                    "reading {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let mut doc = current.parse::<DocumentMut>().map_err(|e| {
            DomainError::IoError(format!("parsing {}: {}", path.display(), e))
        })?;
        write_upstream_files(&mut doc, snapshot);

        tokio::fs::write(path, doc.to_string())
            .await
            .map_err(|e| DomainError::IoError(format!("writing {}: {}", path.display(), e)))?;

        info!(path = %path.display(), files = snapshot.files.len(), "Upstream DNS files saved");
        Ok(())
    }
}
