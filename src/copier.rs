use std::fs;
use std::path::{Path, PathBuf};

use filetime::{set_file_times, FileTime};
use walkdir::WalkDir;

use context::SyncContext;
use error::*;
use paths::*;
use rule::*;

/// One copy performed (or, on a dry run, planned) by a `CopyTask`.
#[derive(Debug, Clone, PartialEq)]
pub enum CopiedEntry {
    File { source: PathBuf, destination: PathBuf },
    Link { destination: PathBuf, target: PathBuf },
}

/// Copies the files and links under `source_dir` into `dest_dir`, keeping their relative paths.
///
/// Symbolic links are recreated, never followed. A link into the source tree is
/// pointed at the matching path in the destination; a link that points outside
/// the source tree gets a target recomputed from its new location so it keeps
/// resolving to the same place. Relative targets stay relative and absolute ones
/// stay absolute. Directories are created only when something is copied into them.
pub struct CopyTask {
    source_dir: PathBuf,
    dest_dir: PathBuf,
    filter: Option<SuffixRule>,
    skip: Option<SkipRule>,
}

impl CopyTask {
    pub fn new(source_dir: PathBuf, dest_dir: PathBuf) -> CopyTask {
        CopyTask { source_dir, dest_dir, filter: None, skip: None }
    }

    /// Only copy entries whose path ends with `suffix`. An empty suffix copies everything.
    pub fn with_suffix(mut self, suffix: Option<&str>) -> CopyTask {
        self.filter = SuffixRule::from_optional(suffix);
        self
    }

    pub fn with_skip(mut self, skip: Option<SkipRule>) -> CopyTask {
        self.skip = skip;
        self
    }

    pub fn execute(&self, context: &SyncContext) -> Result<Vec<CopiedEntry>> {
        if !self.source_dir.is_dir() {
            bail!(ErrorKind::DirectoryNotFound(self.source_dir.clone()));
        }
        let source_root = absolute(&self.source_dir)?;
        let dest_root = absolute(&self.dest_dir)?;
        if source_root == dest_root {
            bail!("Source and destination are the same directory: {}", source_root.to_string_lossy());
        }

        let walk_root = source_root.clone();
        let nested_dest = dest_root.clone();
        let walker = WalkDir::new(&walk_root)
            .follow_links(false)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            // A destination nested inside the source must not be copied into itself
            .filter_entry(move |entry| !entry.path().starts_with(&nested_dest));

        let mut copied = vec![];
        for entry in walker {
            let dir_entry = entry.chain_err(|| {
                format!("Unable to walk directory {}", source_root.to_string_lossy())
            })?;
            let path = dir_entry.path();
            let file_type = dir_entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if !self.should_copy(path) {
                trace!("Skipping: {}", path.to_string_lossy());
                continue;
            }

            let destination = reroot(path, &source_root, &dest_root)?;
            if file_type.is_symlink() {
                copied.push(copy_link(path, &destination, &source_root, &dest_root, context)?);
            } else if file_type.is_file() {
                copied.push(copy_file(path, &destination, context)?);
            } else {
                debug!("Not a file or link: {}", path.to_string_lossy());
            }
        }

        Ok(copied)
    }

    fn should_copy(&self, path: &Path) -> bool {
        let passes_filter = match self.filter {
            Some(ref filter) => filter.path_matches_rule(path),
            None => true,
        };
        let skipped = match self.skip {
            Some(ref skip) => skip.path_matches_rule(path),
            None => false,
        };
        passes_filter && !skipped
    }
}

fn copy_file(source: &Path, destination: &Path, context: &SyncContext) -> Result<CopiedEntry> {
    info!("Copying {} -> {}", source.to_string_lossy(), destination.to_string_lossy());
    if !context.dry_run {
        create_parent_directory(destination)?;
        // fs::copy would write through an existing link
        if is_symlink(destination) {
            remove_existing(destination)?;
        }
        fs::copy(source, destination).chain_err(|| {
            format!("Unable to copy file {} to destination {}", source.to_string_lossy(),
                    destination.to_string_lossy())
        })?;
        let metadata = fs::metadata(source)
            .chain_err(|| format!("Unable to read metadata of {}", source.to_string_lossy()))?;
        set_file_times(destination, FileTime::from_last_access_time(&metadata),
                       FileTime::from_last_modification_time(&metadata))
            .chain_err(|| format!("Unable to set file times of {}", destination.to_string_lossy()))?;
    }

    Ok(CopiedEntry::File { source: source.to_path_buf(), destination: destination.to_path_buf() })
}

fn copy_link(link: &Path, destination: &Path, source_root: &Path, dest_root: &Path,
             context: &SyncContext) -> Result<CopiedEntry> {
    let target = fs::read_link(link)
        .chain_err(|| format!("Unable to read link {}", link.to_string_lossy()))?;
    let link_parent = match link.parent() {
        Some(parent) => parent,
        None => bail!("Internal failure: Link {} has no parent. This is a bug.", link.to_string_lossy())
    };
    let resolved = normalize(&link_parent.join(&target));

    // In-tree targets follow the copy into the destination, others keep pointing at the same place
    let new_target_location = if resolved.starts_with(source_root) {
        reroot(&resolved, source_root, dest_root)?
    } else {
        resolved.clone()
    };
    let new_target = if target.is_absolute() {
        new_target_location
    } else {
        match destination.parent() {
            Some(parent) => relative_to(&new_target_location, parent),
            None => new_target_location,
        }
    };

    info!("Linking {} -> {}", destination.to_string_lossy(), new_target.to_string_lossy());
    if !context.dry_run {
        create_parent_directory(destination)?;
        remove_existing(destination)?;
        create_symlink(&new_target, destination).chain_err(|| {
            format!("Unable to create link {} to {}", destination.to_string_lossy(),
                    new_target.to_string_lossy())
        })?;
    }

    Ok(CopiedEntry::Link { destination: destination.to_path_buf(), target: new_target })
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|metadata| metadata.file_type().is_symlink())
        .unwrap_or(false)
}

/// Removes a file or link at `path` so a new entry can take its place.
fn remove_existing(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return Ok(()),
    };
    if metadata.is_dir() {
        bail!("Refusing to replace directory {} with a link", path.to_string_lossy());
    }
    debug!("Removing existing entry: {}", path.to_string_lossy());
    fs::remove_file(path).chain_err(|| format!("Unable to remove {}", path.to_string_lossy()))
}
