use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sluice_dns_application::ports::ManagedUpstreamFileRepository;
use sluice_dns_domain::managed_file::{with_suffix, OLD_FILE_SUFFIX, UPSTREAM_FILES_DIR};
use sluice_dns_domain::{
    parse_upstream_lines, DomainError, FetchedList, ManagedFilesSnapshot, ManagedUpstreamFile,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

const TMP_FILE_SUFFIX: &str = ".tmp";

/// In-memory managed-file set plus the on-disk caches under `data_dir`.
///
/// The set is only reachable through the accessor methods; every mutation
/// takes the write lock, every read the shared lock.
pub struct ManagedFileStore {
    data_dir: PathBuf,
    update_interval_hours: u32,
    files: RwLock<Vec<ManagedUpstreamFile>>,
}

impl ManagedFileStore {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        update_interval_hours: u32,
        files: Vec<ManagedUpstreamFile>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            update_interval_hours,
            files: RwLock::new(files),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn update_interval_hours(&self) -> u32 {
        self.update_interval_hours
    }

    pub fn cache_path(&self, file: &ManagedUpstreamFile) -> PathBuf {
        file.path(&self.data_dir)
    }

    /// Commits a refresh result for `file`.
    ///
    /// Returns `true` when new content replaced the cache. Unchanged content
    /// only bumps `last_updated`. An entry removed or re-pointed while the
    /// pass was fetching is left alone.
    pub async fn commit_refreshed(
        &self,
        file: &ManagedUpstreamFile,
        fetched: &FetchedList,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut files = self.files.write().await;
        let Some(entry) = files
            .iter_mut()
            .find(|f| f.id == file.id && f.url == file.url)
        else {
            debug!(id = file.id, url = %file.url, "Refreshed file no longer managed");
            return Ok(false);
        };

        if entry.checksum.as_deref() == Some(fetched.checksum.as_str())
            && fs::try_exists(entry.path(&self.data_dir)).await.unwrap_or(false)
        {
            entry.last_updated = Some(now);
            return Ok(false);
        }

        let path = entry.path(&self.data_dir);
        let staged = stage_cache(&path, &fetched.content).await?;

        entry.rules_count = fetched.rules_count;
        entry.checksum = Some(fetched.checksum.clone());
        entry.last_updated = Some(now);
        drop(files);

        staged.finish().await;
        Ok(true)
    }
}

#[async_trait]
impl ManagedUpstreamFileRepository for ManagedFileStore {
    async fn snapshot(&self) -> ManagedFilesSnapshot {
        ManagedFilesSnapshot {
            files: self.files.read().await.clone(),
            update_interval_hours: self.update_interval_hours,
        }
    }

    async fn load_upstreams(&self) -> Result<Vec<String>, DomainError> {
        let paths: Vec<PathBuf> = {
            let files = self.files.read().await;
            files
                .iter()
                .filter(|f| f.enabled)
                .map(|f| f.path(&self.data_dir))
                .collect()
        };

        let mut upstreams = Vec::new();
        for path in paths {
            match fs::read_to_string(&path).await {
                Ok(text) => upstreams.extend(parse_upstream_lines(&text)),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Upstream DNS file not cached yet");
                }
                Err(e) => {
                    return Err(DomainError::ManagedFileRead {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(upstreams)
    }

    async fn find_by_url(&self, url: &str) -> Option<ManagedUpstreamFile> {
        self.files
            .read()
            .await
            .iter()
            .find(|f| f.url == url)
            .cloned()
    }

    async fn add(
        &self,
        name: &str,
        url: &str,
        content: &FetchedList,
    ) -> Result<ManagedUpstreamFile, DomainError> {
        let mut files = self.files.write().await;
        if files.iter().any(|f| f.url == url) {
            return Err(DomainError::ManagedFileExists(url.to_string()));
        }

        let id = files.iter().map(|f| f.id).max().unwrap_or(0) + 1;
        let mut file = ManagedUpstreamFile::new(id, url, name);
        let staged = stage_cache(&file.path(&self.data_dir), &content.content).await?;

        file.rules_count = content.rules_count;
        file.checksum = Some(content.checksum.clone());
        file.last_updated = Some(Utc::now());
        files.push(file.clone());
        drop(files);

        staged.finish().await;
        Ok(file)
    }

    async fn remove(&self, url: &str) -> Result<ManagedUpstreamFile, DomainError> {
        let mut files = self.files.write().await;
        let Some(pos) = files.iter().position(|f| f.url == url) else {
            error!(url = %url, "Removing upstream DNS file: url not found");
            return Err(DomainError::ManagedFileNotFound(url.to_string()));
        };

        let path = files[pos].path(&self.data_dir);
        let aside = with_suffix(&path, OLD_FILE_SUFFIX);
        match fs::rename(&path, &aside).await {
            Ok(()) => debug!(from = %path.display(), to = %aside.display(), "Cache moved aside"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DomainError::IoError(format!(
                    "renaming {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        let removed = files.remove(pos);
        info!(id = removed.id, url = %removed.url, "Upstream DNS file dropped from set");
        Ok(removed)
    }

    async fn replace(
        &self,
        url: &str,
        mut updated: ManagedUpstreamFile,
        content: Option<&FetchedList>,
    ) -> Result<ManagedUpstreamFile, DomainError> {
        let mut files = self.files.write().await;
        if updated.url != url && files.iter().any(|f| f.url == updated.url) {
            return Err(DomainError::ManagedFileExists(updated.url));
        }
        let Some(pos) = files.iter().position(|f| f.url == url) else {
            return Err(DomainError::ManagedFileNotFound(url.to_string()));
        };
        updated.id = files[pos].id;

        let staged = match content {
            Some(content) => {
                let staged = stage_cache(&updated.path(&self.data_dir), &content.content).await?;
                updated.rules_count = content.rules_count;
                updated.checksum = Some(content.checksum.clone());
                updated.last_updated = Some(Utc::now());
                Some(staged)
            }
            None => None,
        };

        files[pos] = updated.clone();
        drop(files);

        if let Some(staged) = staged {
            staged.finish().await;
        }
        Ok(updated)
    }
}

/// New cache content in place, previous content kept aside until `finish`.
struct StagedCache {
    aside: Option<PathBuf>,
}

impl StagedCache {
    async fn finish(self) {
        if let Some(aside) = self.aside {
            if let Err(e) = fs::remove_file(&aside).await {
                warn!(path = %aside.display(), error = %e, "Failed to remove previous cache");
            }
        }
    }
}

/// Writes `content` to `<path>.tmp`, moves the current cache to
/// `<path>.old` and renames the temp file into place.
///
/// On failure the previous cache is restored and the temp file removed.
async fn stage_cache(path: &Path, content: &str) -> Result<StagedCache, DomainError> {
    let io_err = |what: &str, p: &Path, e: std::io::Error| {
        DomainError::IoError(format!("{} {}: {}", what, p.display(), e))
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| io_err("creating", dir, e))?;
    }

    let tmp = with_suffix(path, TMP_FILE_SUFFIX);
    if let Err(e) = fs::write(&tmp, content).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(io_err("writing", &tmp, e));
    }

    let old = with_suffix(path, OLD_FILE_SUFFIX);
    let aside = match fs::rename(path, &old).await {
        Ok(()) => Some(old),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_err("moving aside", path, e));
        }
    };

    if let Err(e) = fs::rename(&tmp, path).await {
        if let Some(aside) = &aside {
            if let Err(restore) = fs::rename(aside, path).await {
                error!(path = %path.display(), error = %restore, "Failed to restore previous cache");
            }
        }
        let _ = fs::remove_file(&tmp).await;
        return Err(io_err("replacing", path, e));
    }

    Ok(StagedCache { aside })
}

/// Directory holding all managed caches under `data_dir`.
pub fn cache_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(UPSTREAM_FILES_DIR)
}
