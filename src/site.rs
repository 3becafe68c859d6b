// Local site directory walk.
//
// Files are produced lazily: the walk yields one `SiteFile` at a time and
// reads its bytes only when the item is pulled, so uploading can start
// before the whole tree has been visited.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("site directory not found: {0}")]
    MissingRoot(PathBuf),

    #[error("failed to walk site directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("broken symlink: {0}")]
    BrokenLink(PathBuf),

    #[error("file name is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
}

/// One local file, addressed by its path relative to the site root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFile {
    /// Always `/`-separated, whatever the host separator is.
    pub remote_path: String,
    pub contents: Vec<u8>,
}

impl SiteFile {
    /// Contents as base64, the encoding the contents API expects.
    pub fn encoded(&self) -> String {
        STANDARD.encode(&self.contents)
    }
}

/// Turn a relative path into the form used in remote URLs: backslashes
/// become `/`, and a leading `./` or `/` is dropped.
pub fn normalize_remote_path(relative: &str) -> String {
    let slashed = relative.replace('\\', "/");
    let mut rest = slashed.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    rest.to_string()
}

/// Walk `root` recursively and yield its regular files in file-name order.
/// Symlinks to files are read through; symlinked directories are not
/// descended into.
///
/// Fails up front if `root` is not a directory; problems with individual
/// entries come out as `Err` items and the walk carries on after them.
pub fn walk(root: &Path) -> Result<impl Iterator<Item = Result<SiteFile, SiteError>>, SiteError> {
    if !root.is_dir() {
        return Err(SiteError::MissingRoot(root.to_path_buf()));
    }
    let root = root.to_path_buf();
    let entries = WalkDir::new(&root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    Ok(entries.filter_map(move |entry| {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => return Some(Err(SiteError::Walk(e))),
        };
        let path = entry.path();
        if entry.path_is_symlink() {
            match std::fs::metadata(path) {
                Ok(target) if target.is_file() => {}
                Ok(_) => return None,
                Err(_) => return Some(Err(SiteError::BrokenLink(path.to_path_buf()))),
            }
        } else if !entry.file_type().is_file() {
            return None;
        }
        let relative = path.strip_prefix(&root).unwrap_or(path);
        let remote_path = match relative.to_str() {
            Some(relative) => normalize_remote_path(relative),
            None => return Some(Err(SiteError::NonUtf8Path(path.to_path_buf()))),
        };
        Some(
            std::fs::read(path)
                .map(|contents| SiteFile {
                    remote_path,
                    contents,
                })
                .map_err(|source| SiteError::Read {
                    path: path.to_path_buf(),
                    source,
                }),
        )
    }))
}
