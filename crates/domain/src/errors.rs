use crate::upstream::UpstreamGroupKind;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("reading upstream dns file {}: {message}", .path.display())]
    ManagedFileRead { path: PathBuf, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid upstream: {0}")]
    InvalidUpstream(String),

    #[error("Upstream DNS file already exists: {0}")]
    ManagedFileExists(String),

    #[error("Upstream DNS file not found: {0}")]
    ManagedFileNotFound(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Preparing {group} upstream config: {message}")]
    UpstreamBuild {
        group: UpstreamGroupKind,
        message: String,
    },

    #[error("Closing {group} upstream config: {message}")]
    UpstreamClose {
        group: UpstreamGroupKind,
        message: String,
    },

    #[error("Creating dns proxy: {0}")]
    ProxyBuild(String),

    #[error("Starting dns server: {0}")]
    StartFailed(String),

    #[error("Upstream DNS files update procedure is already running")]
    RefreshInProgress,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Joined(Box<JoinedError>),
}

impl DomainError {
    /// Attaches cleanup failures to `self` as secondary causes.
    ///
    /// The receiver always stays the root cause. An empty `deferred` list
    /// returns the receiver untouched.
    pub fn with_deferred(self, deferred: Vec<DomainError>) -> DomainError {
        if deferred.is_empty() {
            return self;
        }

        match self {
            DomainError::Joined(mut joined) => {
                joined.secondary.extend(deferred);
                DomainError::Joined(joined)
            }
            root => DomainError::Joined(Box::new(JoinedError {
                root,
                secondary: deferred,
            })),
        }
    }

    /// Joins a list of errors: the first one becomes the root cause.
    pub fn join(mut errors: Vec<DomainError>) -> Option<DomainError> {
        if errors.is_empty() {
            return None;
        }
        let root = errors.remove(0);
        Some(root.with_deferred(errors))
    }

    pub fn root_cause(&self) -> &DomainError {
        match self {
            DomainError::Joined(joined) => joined.root.root_cause(),
            other => other,
        }
    }

    pub fn secondary_causes(&self) -> &[DomainError] {
        match self {
            DomainError::Joined(joined) => &joined.secondary,
            _ => &[],
        }
    }

    /// True when the root cause is a connectivity problem rather than bad data.
    pub fn is_network(&self) -> bool {
        matches!(
            self.root_cause(),
            DomainError::Network(_) | DomainError::Cancelled
        )
    }
}

/// One root cause plus the errors raised while cleaning up after it.
#[derive(Debug)]
pub struct JoinedError {
    root: DomainError,
    secondary: Vec<DomainError>,
}

impl JoinedError {
    pub fn root(&self) -> &DomainError {
        &self.root
    }

    pub fn secondary(&self) -> &[DomainError] {
        &self.secondary
    }
}

impl fmt::Display for JoinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for err in &self.secondary {
            write!(f, "; deferred: {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for JoinedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.root)
    }
}
