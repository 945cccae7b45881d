//! Path resolution module
//!
//! Maps a request path onto the filesystem below the root directory.
//!
//! Steps:
//! 1. Percent-decode the path, then normalize `.` and `..` segments lexically.
//!    A `..` that would climb above the root is rejected.
//! 2. Stat the joined path and canonicalize it; the canonical path must stay
//!    under the canonical root, which also rejects symlinks that lead out.
//! 3. Directories are replaced by the first existing index file, or become a
//!    listing target when listings are enabled.

use percent_encoding::percent_decode_str;
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::FsConfig;
use crate::error::ServeError;
use crate::logger;

/// A file or directory confined to the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Canonical filesystem path
    pub path: PathBuf,
    /// Normalized request path, `/`-prefixed; directories end with `/`
    pub url_path: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Result of resolving a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Regular file to serve (possibly an index file)
    File(ResolvedTarget),
    /// Directory without an index file, listings enabled
    Listing(ResolvedTarget),
}

/// Resolve `request_path` against the canonical `root`
pub async fn resolve(
    root: &Path,
    request_path: &str,
    fs: &FsConfig,
) -> Result<Resolution, ServeError> {
    let segments = normalize_path(request_path)?;
    let relative: PathBuf = segments.iter().collect();

    let (path, meta) = confined_metadata(root, &root.join(relative)).await?;

    if meta.is_file() {
        return Ok(Resolution::File(target(path, url_path(&segments, false), &meta)));
    }
    if !meta.is_dir() {
        return Err(ServeError::NotFound);
    }

    let dir_url = url_path(&segments, true);
    for name in &fs.index_names {
        match confined_metadata(root, &path.join(name)).await {
            Ok((index_path, index_meta)) if index_meta.is_file() => {
                let index_url = format!("{dir_url}{name}");
                return Ok(Resolution::File(target(index_path, index_url, &index_meta)));
            }
            _ => {}
        }
    }

    if fs.generate_index_pages {
        Ok(Resolution::Listing(target(path, dir_url, &meta)))
    } else {
        Err(ServeError::NotFound)
    }
}

/// Decode and lexically normalize a URL path into its segments.
///
/// Decoding happens before splitting, so `%2e%2e%2f` is treated exactly like
/// `../`.
pub fn normalize_path(request_path: &str) -> Result<Vec<String>, ServeError> {
    let decoded = percent_decode_str(request_path)
        .decode_utf8()
        .map_err(|_| ServeError::NotFound)?;

    if decoded.contains('\0') || decoded.contains('\\') {
        return Err(reject(request_path));
    }

    let mut segments: Vec<String> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(reject(request_path));
                }
            }
            s => segments.push(s.to_string()),
        }
    }
    Ok(segments)
}

fn reject(request_path: &str) -> ServeError {
    logger::log_warning(&format!("Path traversal attempt blocked: {request_path}"));
    ServeError::Traversal(request_path.to_string())
}

/// Stat and canonicalize `path`, refusing anything that lands outside `root`
async fn confined_metadata(root: &Path, path: &Path) -> Result<(PathBuf, Metadata), ServeError> {
    let canonical = tokio::fs::canonicalize(path).await.map_err(stat_error)?;
    if !canonical.starts_with(root) {
        logger::log_warning(&format!(
            "Symlink escape blocked: {} -> {}",
            path.display(),
            canonical.display()
        ));
        return Err(ServeError::Traversal(path.display().to_string()));
    }
    let meta = tokio::fs::metadata(&canonical).await.map_err(stat_error)?;
    Ok((canonical, meta))
}

/// Permission problems surface as 403, everything else as a plain miss
fn stat_error(e: std::io::Error) -> ServeError {
    if e.kind() == ErrorKind::PermissionDenied {
        ServeError::Io(e)
    } else {
        ServeError::NotFound
    }
}

fn url_path(segments: &[String], is_dir: bool) -> String {
    let mut url = String::from("/");
    url.push_str(&segments.join("/"));
    if is_dir && !segments.is_empty() {
        url.push('/');
    }
    url
}

fn target(path: PathBuf, url_path: String, meta: &Metadata) -> ResolvedTarget {
    ResolvedTarget {
        path,
        url_path,
        is_dir: meta.is_dir(),
        size: if meta.is_dir() { 0 } else { meta.len() },
        modified: meta.modified().ok(),
    }
}
