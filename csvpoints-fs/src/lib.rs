//! Capability-based file access for CSV inputs and GeoJSON outputs.
//!
//! Paths arrive from the command line as UTF-8 [`Utf8Path`]s. Every helper
//! opens the containing directory with ambient authority once and performs
//! the final operation relative to it, so a file is never reached through a
//! second path lookup.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::{Component, MAIN_SEPARATOR};

/// Open an existing regular file for reading.
///
/// Directories and other non-regular entries are rejected with
/// [`io::ErrorKind::InvalidInput`].
pub fn open_input(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    let (dir, name) = containing_dir(path)?;
    if !dir.metadata(&name)?.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{path} is not a regular file"),
        ));
    }
    dir.open(&name)
}

/// Whether `path` names an existing regular file.
///
/// Missing files surface as an [`io::ErrorKind::NotFound`] error rather than
/// `false`, so callers can tell the two apart.
pub fn is_regular_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = containing_dir(path)?;
    dir.metadata(&name).map(|meta| meta.is_file())
}

/// Create or truncate `path` for writing, creating missing parent
/// directories first.
pub fn create_output(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    ensure_parent_dir(path)?;
    let (dir, name) = containing_dir(path)?;
    dir.create(&name)
}

/// Create every missing directory above `path`.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() {
        return Ok(());
    }
    let (root, relative) = split_root(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    root.create_dir_all(&relative)
}

fn containing_dir(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{path} does not name a file"),
            )
        })?
        .to_owned();
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

/// Open the filesystem root, drive prefix, or working directory that
/// `dir` starts from and return the remainder as a relative path.
fn split_root(dir: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let (root, relative) = match dir.as_std_path().components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let root = Utf8PathBuf::from(format!("{prefix}{MAIN_SEPARATOR}"));
            let relative = dir
                .strip_prefix(&root)
                .or_else(|_| dir.strip_prefix(prefix))
                .map_err(|_| io::Error::other("failed to strip drive prefix"))?
                .to_path_buf();
            (root, relative)
        }
        Some(Component::RootDir) => {
            let root = Utf8PathBuf::from(MAIN_SEPARATOR.to_string());
            let relative = dir
                .strip_prefix(&root)
                .map_err(|_| io::Error::other("failed to strip filesystem root"))?
                .to_path_buf();
            (root, relative)
        }
        _ => (Utf8PathBuf::from("."), dir.to_path_buf()),
    };
    let handle = fs_utf8::Dir::open_ambient_dir(&root, ambient_authority())?;
    Ok((handle, relative))
}
