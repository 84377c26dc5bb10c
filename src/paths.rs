use std::env;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use error::*;

/// Makes `path` absolute against the current directory and normalizes it.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize(path))
    } else {
        let current_dir = env::current_dir().chain_err(|| "Unable to determine current directory")?;
        Ok(normalize(&current_dir.join(path)))
    }
}

/// Resolves `.` and `..` lexically, without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => (),
            Component::ParentDir => {
                match normalized.components().next_back() {
                    Some(Component::Normal(_)) => { normalized.pop(); }
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => (),
                    _ => normalized.push(".."),
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Path that leads from the directory `base` to `target`. Both must be absolute and normalized.
pub fn relative_to(target: &Path, base: &Path) -> PathBuf {
    let target_components: Vec<Component> = target.components().collect();
    let base_components: Vec<Component> = base.components().collect();
    let common = target_components
        .iter()
        .zip(base_components.iter())
        .take_while(|&(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &target_components[common..] {
        relative.push(component.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

/// Swaps the `source_root` prefix of `path` for `dest_root`, keeping the rest of the path.
pub fn reroot(path: &Path, source_root: &Path, dest_root: &Path) -> Result<PathBuf> {
    let remainder = path.strip_prefix(source_root).chain_err(|| {
        format!(
            "Internal failure: {} is not under {}. This is a bug.",
            path.to_string_lossy(),
            source_root.to_string_lossy()
        )
    })?;
    Ok(dest_root.join(remainder))
}

pub fn create_parent_directory(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.is_dir() {
            debug!("Creating directory: {}", parent.to_string_lossy());
            fs::create_dir_all(parent)
                .chain_err(|| format!("Unable to create directory: {}", parent.to_string_lossy()))?;
        }
    }
    Ok(())
}

/// Recursively deletes `directory`. A directory that is already gone is not an error.
pub fn remove_directory(directory: &Path, dry_run: bool) -> Result<()> {
    if fs::symlink_metadata(directory).is_err() {
        debug!("Nothing to remove at {}", directory.to_string_lossy());
        return Ok(());
    }
    info!("Removing directory: {}", directory.to_string_lossy());
    if dry_run {
        return Ok(());
    }
    match fs::remove_dir_all(directory) {
        Ok(()) => Ok(()),
        Err(ref error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error)
            .chain_err(|| format!("Unable to remove directory: {}", directory.to_string_lossy())),
    }
}

/// Removes `directory` if it holds no entries. Returns whether it was removed.
pub fn remove_if_empty(directory: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(directory)
        .chain_err(|| format!("Unable to read entries of directory {}", directory.to_string_lossy()))?;
    if entries.next().is_some() {
        return Ok(false);
    }
    debug!("Removing empty directory: {}", directory.to_string_lossy());
    fs::remove_dir(directory)
        .chain_err(|| format!("Unable to remove directory: {}", directory.to_string_lossy()))?;
    Ok(true)
}

/// Removes empty directories from `path` upwards, stopping before `root`.
pub fn prune_empty_directories(path: &Path, root: &Path) -> Result<()> {
    let mut current = path.to_path_buf();
    while current != root && current.starts_with(root) {
        if current.is_dir() && !remove_if_empty(&current)? {
            break;
        }
        if !current.pop() {
            break;
        }
    }
    Ok(())
}

#[cfg(unix)]
pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    ::std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
pub fn create_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Other, "Symbolic links are unsupported on this platform"))
}
