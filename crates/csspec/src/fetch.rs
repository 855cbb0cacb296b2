use anyhow::{Error, anyhow};
use core::time::Duration;
use reqwest::get as reqwest_get;
use std::env;
use std::path::Path;
use tokio::fs::read_to_string as tokio_fs_read_to_string;
use tokio::time::timeout;
use url::Url;

use crate::error::CsspecError;

/// Turn a page or stylesheet reference into a URL.
///
/// Absolute URLs are taken as they are. Anything else is joined onto `base` when there
/// is one, or treated as a filesystem path.
///
/// # Errors
///
/// Returns [`CsspecError::Load`] if the reference is neither a URL nor a usable path.
pub fn resolve_reference(reference: &str, base: Option<&Url>) -> Result<Url, CsspecError> {
    let failed = |reason: String| CsspecError::Load {
        url: reference.to_owned(),
        reason,
    };
    if let Ok(url) = Url::parse(reference) {
        return Ok(url);
    }
    if let Some(base) = base {
        return base.join(reference).map_err(|err| failed(err.to_string()));
    }
    let path = Path::new(reference);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map_err(|err| failed(err.to_string()))?
            .join(path)
    };
    Url::from_file_path(&absolute).map_err(|()| failed(String::from("not an absolute path")))
}

/// Fetch the text behind a URL, giving up after `limit`.
///
/// Supported URL schemes:
/// - `http`, `https`: fetched via `reqwest`
/// - `file`: read from the local filesystem
///
/// # Errors
///
/// - Returns `Err` if the URL scheme is unsupported
/// - Returns `Err` if HTTP fetch fails or returns a non-success status
/// - Returns `Err` if the file path is invalid or the file cannot be read
/// - Returns `Err` if the fetch takes longer than `limit`
pub async fn fetch_text(url: &Url, limit: Duration) -> Result<String, CsspecError> {
    let fetched = timeout(limit, read_url(url))
        .await
        .unwrap_or_else(|_| Err(anyhow!("timed out after {}ms", limit.as_millis())));
    fetched.map_err(|err| CsspecError::Load {
        url: url.to_string(),
        reason: err.to_string(),
    })
}

async fn read_url(url: &Url) -> Result<String, Error> {
    match url.scheme() {
        "http" | "https" => {
            let response = reqwest_get(url.clone())
                .await
                .map_err(|err| anyhow!("Failed to fetch URL {url}: {err}"))?;

            if !response.status().is_success() {
                return Err(anyhow!(
                    "Failed to fetch URL: {} (Status: {})",
                    url,
                    response.status()
                ));
            }
            Ok(response.text().await?)
        }
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|()| anyhow!("Invalid file path for file url: {url}"))?;
            Ok(tokio_fs_read_to_string(path).await?)
        }
        _ => Err(anyhow!("Unsupported url scheme {}", url.scheme())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_references_join_the_base() {
        let base = Url::parse("https://example.test/specs/page.html").unwrap();
        let url = resolve_reference("../css/menu.css", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "https://example.test/css/menu.css");
    }

    #[test]
    fn absolute_urls_are_kept() {
        let url = resolve_reference("file:///tmp/a.css", None).unwrap();
        assert_eq!(url.scheme(), "file");
    }
}
