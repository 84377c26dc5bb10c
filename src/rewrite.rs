use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use context::SyncContext;
use error::*;
use layout::ImportRewrite;
use rule::*;

/// Applies every rewrite to each file under `root` that matches `rule`.
///
/// Replacement is literal. Returns the files whose contents changed. Files that
/// are not UTF-8 are skipped with a warning.
pub fn rewrite_imports(root: &Path, rule: &dyn PathRule, rewrites: &[ImportRewrite],
                       context: &SyncContext) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        // A dry run never created the files it would rewrite
        if context.dry_run {
            info!("Would rewrite imports under {} once it exists", root.to_string_lossy());
            return Ok(vec![]);
        }
        bail!(ErrorKind::DirectoryNotFound(root.to_path_buf()));
    }

    let mut rewritten = vec![];
    for entry in WalkDir::new(root).follow_links(false) {
        let dir_entry = entry.chain_err(|| format!("Unable to walk directory {}", root.to_string_lossy()))?;
        let path = dir_entry.path();
        if !dir_entry.file_type().is_file() || !rule.path_matches_rule(path) {
            continue;
        }

        let bytes = fs::read(path).chain_err(|| format!("Unable to read {}", path.to_string_lossy()))?;
        let original = match String::from_utf8(bytes) {
            Ok(contents) => contents,
            Err(_) => {
                warn!("Not rewriting {}: not valid UTF-8", path.to_string_lossy());
                continue;
            }
        };
        let updated = rewrites
            .iter()
            .fold(original.clone(), |contents, rewrite| contents.replace(&rewrite.from, &rewrite.to));
        if updated == original {
            trace!("No imports to rewrite in {}", path.to_string_lossy());
            continue;
        }

        info!("Rewriting imports in {}", path.to_string_lossy());
        if !context.dry_run {
            fs::write(path, updated).chain_err(|| format!("Unable to write {}", path.to_string_lossy()))?;
        }
        rewritten.push(path.to_path_buf());
    }

    Ok(rewritten)
}
