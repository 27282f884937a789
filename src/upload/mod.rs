//! Secure image upload
//!
//! Content is identified by its magic bytes, never by a client supplied name
//! or type. Files are written under a resolved base directory with a freshly
//! generated name, and nothing on the way from the base to the file may be a
//! symlink.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use thiserror::Error;
use uuid::Uuid;

/// Largest accepted upload in bytes
pub const MAX_UPLOAD_BYTES: usize = 5_000_000;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SOI: &[u8] = b"\xff\xd8";
const JPEG_EOI: &[u8] = b"\xff\xd9";

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("unsupported file type")]
    BadType,

    #[error("file too large: {size} bytes (max {MAX_UPLOAD_BYTES})")]
    TooBig { size: usize },

    #[error("upload directory is a symlink")]
    RootIsSymlink,

    #[error("upload directory not found")]
    BaseDirNotFound,

    #[error("upload directory is not a directory")]
    BaseDirNotDirectory,

    #[error("destination escapes the upload directory")]
    PathTraversal,

    #[error("destination has a symlink component")]
    SymlinkParent,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl UploadError {
    /// Stable machine readable code
    pub fn code(&self) -> &'static str {
        match self {
            UploadError::BadType => "bad_type",
            UploadError::TooBig { .. } => "too_big",
            UploadError::RootIsSymlink => "root_is_symlink",
            UploadError::BaseDirNotFound => "base_dir_not_found",
            UploadError::BaseDirNotDirectory => "base_dir_not_directory",
            UploadError::PathTraversal => "path_traversal",
            UploadError::SymlinkParent => "symlink_parent",
            UploadError::Io(_) => "io",
        }
    }
}

/// Accepted image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => ".png",
            ImageKind::Jpeg => ".jpg",
        }
    }
}

/// Identify an image by its leading (and for JPEG trailing) marker bytes
pub fn sniff(data: &[u8]) -> Option<ImageKind> {
    if data.starts_with(PNG_SIGNATURE) {
        Some(ImageKind::Png)
    } else if data.starts_with(JPEG_SOI) && data.ends_with(JPEG_EOI) {
        Some(ImageKind::Jpeg)
    } else {
        None
    }
}

/// Validate `data` and write it under `base_dir` with a random name.
///
/// Returns the path of the new file.
pub fn store(base_dir: impl AsRef<Path>, data: &[u8]) -> Result<PathBuf, UploadError> {
    let kind = sniff(data).ok_or(UploadError::BadType)?;

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooBig { size: data.len() });
    }

    // Without trailing `/` and `.` components, lstat sees the base itself
    let base: PathBuf = base_dir.as_ref().components().collect();
    if matches!(base.components().next_back(), Some(Component::ParentDir)) {
        return Err(UploadError::PathTraversal);
    }
    if let Ok(meta) = fs::symlink_metadata(&base) {
        if meta.file_type().is_symlink() {
            return Err(UploadError::RootIsSymlink);
        }
    }

    let root = fs::canonicalize(&base).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => UploadError::BaseDirNotFound,
        _ => UploadError::Io(err),
    })?;
    if !root.is_dir() {
        return Err(UploadError::BaseDirNotDirectory);
    }

    let name = format!("{}{}", Uuid::new_v4(), kind.extension());
    let path = confine(&root, Path::new(&name))?;

    write_new(&path, data)?;

    tracing::info!(
        path = %path.display(),
        mime = kind.mime(),
        size = data.len(),
        "Upload stored"
    );
    Ok(path)
}

/// [`store`] on the blocking pool
pub async fn store_async(base_dir: PathBuf, data: Vec<u8>) -> Result<PathBuf, UploadError> {
    tokio::task::spawn_blocking(move || store(&base_dir, &data))
        .await
        .map_err(|err| UploadError::Io(io::Error::new(io::ErrorKind::Other, err)))?
}

/// Join `relative` onto the canonical `root`, refusing anything that leaves
/// `root` or passes through a symlink.
///
/// Components are checked from `root` down to the destination itself; `root`
/// is not checked.
pub fn confine(root: &Path, relative: &Path) -> Result<PathBuf, UploadError> {
    let mut path = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(UploadError::PathTraversal)
            }
        }
    }

    if path == root || !path.starts_with(root) {
        return Err(UploadError::PathTraversal);
    }

    let mut current = root.to_path_buf();
    for part in path.strip_prefix(root).map_err(|_| UploadError::PathTraversal)? {
        current.push(part);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => return Err(UploadError::SymlinkParent),
            Ok(_) => {}
            // Nothing below a missing component exists yet
            Err(_) => break,
        }
    }

    Ok(path)
}

fn write_new(path: &Path, data: &[u8]) -> Result<(), UploadError> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    if let Err(err) = file.write_all(data).and_then(|_| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(err.into());
    }
    Ok(())
}
