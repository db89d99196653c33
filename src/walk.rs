//! Filesystem helpers for checked-out trees and the output directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// All files below `root` with extension `ext`, as sorted `/`-separated
/// paths relative to `root`.
pub fn find_sources(root: &Path, ext: &str) -> Result<Vec<String>> {
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        ext
    );
    let mut files: Vec<String> = glob::glob(&pattern)
        .with_context(|| format!("invalid glob pattern: {}", pattern))?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .filter_map(|p| {
            p.strip_prefix(root).ok().map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
        })
        .collect();
    // Sort for deterministic output
    files.sort();
    files.dedup();
    Ok(files)
}

/// Recursively copy the contents of `from` into `to`, creating `to`.
pub fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to)
        .with_context(|| format!("failed to create directory: {}", to.display()))?;
    let entries = fs::read_dir(from)
        .with_context(|| format!("failed to read directory: {}", from.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read directory: {}", from.display()))?;
        let src = entry.path();
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&src, &dest)?;
        } else {
            fs::copy(&src, &dest).with_context(|| {
                format!("failed to copy {} to {}", src.display(), dest.display())
            })?;
        }
    }
    Ok(())
}
