//! Output: per-revision snapshots, the project manifest, and publishing
//! the generated tree to a branch or a local directory.

use crate::git::GitRepo;
use crate::model::{ProjectManifest, Snapshot};
use crate::walk::copy_tree;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const MANIFEST_FILE: &str = "project.json";
pub const COMMIT_MESSAGE: &str = "generated docs";

/// Where the generated tree ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// New commit on this local branch
    Branch(String),
    /// Copied into this directory
    Directory(PathBuf),
}

/// Result of [`publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Published {
    Commit(git2::Oid),
    Directory(PathBuf),
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Write `<revision>.json` into `outdir`.
pub fn write_snapshot(outdir: &Path, revision: &str, snapshot: &Snapshot) -> Result<PathBuf> {
    let path = outdir.join(format!("{}.json", revision));
    write_json(&path, snapshot)?;
    Ok(path)
}

pub fn write_manifest(outdir: &Path, manifest: &ProjectManifest) -> Result<PathBuf> {
    let path = outdir.join(MANIFEST_FILE);
    write_json(&path, manifest)?;
    Ok(path)
}

/// Move the generated tree in `outdir` to its destination.
///
/// For a branch, the tree becomes a new commit whose parent is the current
/// branch tip (if any) and the branch is moved to it.
pub fn publish(git: &GitRepo, outdir: &Path, dest: &Destination) -> Result<Published> {
    match dest {
        Destination::Branch(branch) => {
            info!(branch = %branch, "writing to branch");
            let parent = git
                .branch_tip(branch)
                .with_context(|| format!("failed to read branch {}", branch))?;
            let tree = git
                .write_dir_tree(outdir)
                .context("failed to write output tree")?;
            info!(tree = %tree, "wrote tree");
            let commit = git
                .commit(tree, parent, COMMIT_MESSAGE)
                .context("failed to write docs commit")?;
            info!(commit = %commit, "wrote commit");
            git.update_branch(branch, commit, COMMIT_MESSAGE)
                .with_context(|| format!("failed to update branch {}", branch))?;
            info!(branch = %branch, "updated branch");
            Ok(Published::Commit(commit))
        }
        Destination::Directory(dir) => {
            info!(dir = %dir.display(), "writing output directory");
            copy_tree(outdir, dir)?;
            Ok(Published::Directory(dir.clone()))
        }
    }
}
