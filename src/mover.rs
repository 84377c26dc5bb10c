use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use context::SyncContext;
use error::*;
use paths::*;

/// Moves `source` to `destination`, merging into whatever is already there.
///
/// If `destination` is free the source is renamed onto it. If both are
/// directories, every child of `source` is merged into `destination` the same
/// way and `source` is removed once empty. A collision with an existing file is
/// left alone, so nothing already at the destination is lost.
pub fn merge_move(source: &Path, destination: &Path, context: &SyncContext) -> Result<()> {
    let source_type = match fs::symlink_metadata(source) {
        Ok(metadata) => metadata.file_type(),
        Err(ref error) if error.kind() == io::ErrorKind::NotFound => {
            debug!("Nothing to move at {}", source.to_string_lossy());
            return Ok(());
        }
        Err(error) => {
            return Err(error).chain_err(|| format!("Unable to read metadata of {}", source.to_string_lossy()));
        }
    };

    match fs::symlink_metadata(destination) {
        Err(ref error) if error.kind() == io::ErrorKind::NotFound => {
            move_to_vacant(source, destination, source_type, context)
        }
        Err(error) => {
            Err(error).chain_err(|| format!("Unable to read metadata of {}", destination.to_string_lossy()))
        }
        Ok(ref metadata) if metadata.is_dir() && source_type.is_dir() => {
            merge_directory(source, destination, context)
        }
        Ok(_) => {
            warn!("Not moving {}: {} already exists", source.to_string_lossy(), destination.to_string_lossy());
            Ok(())
        }
    }
}

fn move_to_vacant(source: &Path, destination: &Path, source_type: fs::FileType, context: &SyncContext) -> Result<()> {
    info!("Moving {} -> {}", source.to_string_lossy(), destination.to_string_lossy());
    if context.dry_run {
        return Ok(());
    }
    create_parent_directory(destination)?;

    let rename_error = match fs::rename(source, destination) {
        Ok(()) => return Ok(()),
        Err(error) => error,
    };
    debug!("Unable to rename {} ({}), moving it piece by piece", source.to_string_lossy(), rename_error);
    move_piecewise(source, destination, source_type, context)
}

/// Moves `source` onto the vacant `destination` without renaming it, as needed across devices.
fn move_piecewise(source: &Path, destination: &Path, source_type: fs::FileType, context: &SyncContext) -> Result<()> {
    if source_type.is_dir() {
        fs::create_dir(destination)
            .chain_err(|| format!("Unable to create directory: {}", destination.to_string_lossy()))?;
        merge_directory(source, destination, context)
    } else if source_type.is_symlink() {
        let target = fs::read_link(source)
            .chain_err(|| format!("Unable to read link {}", source.to_string_lossy()))?;
        create_symlink(&target, destination)
            .chain_err(|| format!("Unable to create link {}", destination.to_string_lossy()))?;
        fs::remove_file(source).chain_err(|| format!("Unable to remove {}", source.to_string_lossy()))
    } else {
        fs::copy(source, destination).chain_err(|| {
            format!("Unable to copy file {} to destination {}", source.to_string_lossy(),
                    destination.to_string_lossy())
        })?;
        fs::remove_file(source).chain_err(|| format!("Unable to remove {}", source.to_string_lossy()))
    }
}

fn merge_directory(source: &Path, destination: &Path, context: &SyncContext) -> Result<()> {
    debug!("Merging directory {} into {}", source.to_string_lossy(), destination.to_string_lossy());
    let mut children: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(source)
        .chain_err(|| format!("Unable to read entries of directory {}", source.to_string_lossy()))?
    {
        let dir_entry = entry
            .chain_err(|| format!("Unable to read entry of directory {}", source.to_string_lossy()))?;
        children.push(dir_entry.path());
    }
    children.sort();

    for child in children {
        let child_name = match child.file_name() {
            Some(name) => name.to_owned(),
            None => bail!("Internal failure: Entry {} does not have a name. This is a bug.", child.to_string_lossy())
        };
        merge_move(&child, &destination.join(child_name), context)?;
    }

    if !context.dry_run && !remove_if_empty(source)? {
        warn!("Left entries behind in {}", source.to_string_lossy());
    }
    Ok(())
}
