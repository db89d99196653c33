//! Version-control collaborator backed by `git2`.
//!
//! Every operation takes its context explicitly: the repository handle
//! lives in [`GitRepo`], each checkout builds its own in-memory index and
//! writes into the directory it is given. Nothing is read from or written
//! to the process environment.

use git2::{ErrorCode, Index, ObjectType, Oid, Repository, Signature, Tree};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const GITLINK_MODE: u32 = 0o160000;
const TREE_MODE: i32 = 0o040000;
const BLOB_MODE: i32 = 0o100644;

/// Errors that can occur while talking to the repository.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GitError {
    #[error("failed to open repository at {0}: {1}")]
    OpenRepo(PathBuf, #[source] git2::Error),

    #[error("failed to resolve {spec}: {source}")]
    Resolve {
        spec: String,
        #[source]
        source: git2::Error,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path is not valid unicode: {0}")]
    NonUnicodePath(PathBuf),

    #[error("failed to build tree: {0}")]
    BuildTree(#[source] git2::Error),

    #[error("failed to create commit: {0}")]
    Commit(#[source] git2::Error),

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> GitError + '_ {
    move |source| GitError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Full ref name of a local branch.
pub fn branch_ref(branch: &str) -> String {
    format!("refs/heads/{branch}")
}

/// Handle to the documented project's repository.
pub struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::open(path).map_err(|e| GitError::OpenRepo(path.to_path_buf(), e))?;
        Ok(GitRepo { repo })
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// All tag names, unordered.
    pub fn tags(&self) -> Result<Vec<String>, GitError> {
        let names = self.repo.tag_names(None)?;
        Ok(names.iter().flatten().map(str::to_string).collect())
    }

    /// Resolve `revision:path` to a tree. A missing revision, a missing path
    /// or a path that is not a directory all yield `None`.
    pub fn subtree(&self, revision: &str, path: &str) -> Result<Option<Tree<'_>>, GitError> {
        let object = match self.repo.revparse_single(revision) {
            Ok(object) => object,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(source) => {
                return Err(GitError::Resolve {
                    spec: revision.to_string(),
                    source,
                })
            }
        };
        let root = object.peel_to_tree().map_err(|source| GitError::Resolve {
            spec: revision.to_string(),
            source,
        })?;

        let path = path.trim_matches('/');
        if path.is_empty() {
            return Ok(Some(root));
        }
        let entry = match root.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(source) => {
                return Err(GitError::Resolve {
                    spec: format!("{revision}:{path}"),
                    source,
                })
            }
        };
        if entry.kind() != Some(ObjectType::Tree) {
            return Ok(None);
        }
        Ok(Some(self.repo.find_tree(entry.id())?))
    }

    pub fn subtree_exists(&self, revision: &str, path: &str) -> Result<bool, GitError> {
        Ok(self.subtree(revision, path)?.is_some())
    }

    /// Materialize `revision:path` into `workdir`.
    ///
    /// The tree is read into a fresh in-memory index owned by this call and
    /// each entry is written below `workdir`. Returns `false` without
    /// touching `workdir` when the subtree does not exist.
    pub fn checkout(&self, revision: &str, path: &str, workdir: &Path) -> Result<bool, GitError> {
        let Some(tree) = self.subtree(revision, path)? else {
            debug!(revision, path, "subtree absent");
            return Ok(false);
        };

        let mut index = Index::new()?;
        index.read_tree(&tree)?;

        for entry in index.iter() {
            if entry.mode == GITLINK_MODE {
                continue;
            }
            let rel = String::from_utf8_lossy(&entry.path).into_owned();
            let dest = workdir.join(&rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(io_error(parent))?;
            }
            let blob = self.repo.find_blob(entry.id)?;
            fs::write(&dest, blob.content()).map_err(io_error(&dest))?;
        }
        debug!(revision, path, entries = index.len(), "checked out");
        Ok(true)
    }

    /// Write the contents of `dir` as a tree object and return its id.
    pub fn write_dir_tree(&self, dir: &Path) -> Result<Oid, GitError> {
        let mut entries = fs::read_dir(dir)
            .map_err(io_error(dir))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_error(dir))?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut builder = self.repo.treebuilder(None).map_err(GitError::BuildTree)?;
        for entry in entries {
            let path = entry.path();
            let name = entry
                .file_name()
                .into_string()
                .map_err(|_| GitError::NonUnicodePath(path.clone()))?;
            let file_type = entry.file_type().map_err(io_error(&path))?;
            if file_type.is_dir() {
                let oid = self.write_dir_tree(&path)?;
                builder
                    .insert(&name, oid, TREE_MODE)
                    .map_err(GitError::BuildTree)?;
            } else if file_type.is_file() {
                let oid = self.repo.blob_path(&path)?;
                builder
                    .insert(&name, oid, BLOB_MODE)
                    .map_err(GitError::BuildTree)?;
            }
        }
        builder.write().map_err(GitError::BuildTree)
    }

    /// Create a commit for `tree` with an optional parent. No ref is moved.
    pub fn commit(&self, tree: Oid, parent: Option<Oid>, message: &str) -> Result<Oid, GitError> {
        let tree = self.repo.find_tree(tree)?;
        let sig = self.signature()?;
        let parents = match parent {
            Some(oid) => vec![self.repo.find_commit(oid)?],
            None => Vec::new(),
        };
        let parent_refs: Vec<_> = parents.iter().collect();
        self.repo
            .commit(None, &sig, &sig, message, &tree, &parent_refs)
            .map_err(GitError::Commit)
    }

    /// Current commit of a local branch, if the branch exists.
    pub fn branch_tip(&self, branch: &str) -> Result<Option<Oid>, GitError> {
        match self.repo.refname_to_id(&branch_ref(branch)) {
            Ok(oid) => Ok(Some(oid)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Point a local branch at `oid`, creating it if needed.
    pub fn update_branch(&self, branch: &str, oid: Oid, message: &str) -> Result<(), GitError> {
        let name = branch_ref(branch);
        match self.repo.find_reference(&name) {
            Ok(mut reference) => {
                reference.set_target(oid, message)?;
                Ok(())
            }
            Err(e) if e.code() == ErrorCode::NotFound => {
                self.repo.reference(&name, oid, true, message)?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn signature(&self) -> Result<Signature<'static>, GitError> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Ok(Signature::now("hdoc", "hdoc@localhost")?),
        }
    }
}
