use crate::errors::DomainError;
use std::path::Path;

const MAX_NAME_LEN: usize = 200;
const MAX_URL_LEN: usize = 2048;

pub fn validate_source_name(name: &str, entity: &str) -> Result<(), DomainError> {
    if name.len() > MAX_NAME_LEN {
        return Err(DomainError::InvalidName(format!(
            "{entity} name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Accepts `http://` and `https://` URLs and absolute local file paths.
pub fn validate_list_url(url: &str) -> Result<(), DomainError> {
    if url.is_empty() {
        return Err(DomainError::InvalidUrl("URL cannot be empty".to_string()));
    }
    if url.len() > MAX_URL_LEN {
        return Err(DomainError::InvalidUrl(format!(
            "URL cannot exceed {MAX_URL_LEN} characters"
        )));
    }

    if let Some(rest) = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
    {
        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() {
            return Err(DomainError::InvalidUrl(format!("{url}: missing host")));
        }
        return Ok(());
    }

    if Path::new(url).is_absolute() {
        return Ok(());
    }

    Err(DomainError::InvalidUrl(format!(
        "{url}: must start with http:// or https:// or be an absolute path"
    )))
}
