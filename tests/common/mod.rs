#![allow(dead_code)]

use git2::{IndexAddOption, Oid, Repository, Signature};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const REPO_H_V1: &str = "\
typedef struct lib_repo lib_repo;

/**
 * Open a repository.
 *
 * @param out the opened repository
 * @param path where to look
 * @return 0 or an error code
 */
int lib_repo_open(lib_repo **out, const char *path);

/** Free a repository. */
void lib_repo_free(lib_repo *repo);
";

pub const REPO_H_V2: &str = "\
typedef struct lib_repo lib_repo;

/**
 * Open a repository.
 *
 * @param out the opened repository
 * @param path where to look
 * @param flags open flags
 * @return 0 or an error code
 */
int lib_repo_open(lib_repo **out, const char *path, unsigned int flags);

/** Free a repository. */
void lib_repo_free(lib_repo *repo);
";

pub const BLOB_H: &str = "\
/** Size of a blob. */
int lib_blob_size(const lib_repo *repo);
";

pub const SHOW_C: &str = "\
/* Open the current directory. */
int main(void)
{
\tlib_repo *r;
\tlib_repo_open(&r, \".\");
\tlib_repo_free(r);
\treturn 0;
}
";

/// Write `files` into the work tree and commit them on HEAD.
pub fn commit_files(repo: &Repository, files: &[(&str, &str)], message: &str) -> Oid {
    let root = repo.workdir().unwrap().to_path_buf();
    for (path, content) in files {
        let dest = root.join(path);
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(dest, content).unwrap();
    }
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("test", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

pub fn tag(repo: &Repository, name: &str, oid: Oid) {
    repo.tag_lightweight(name, &repo.find_object(oid, None).unwrap(), false)
        .unwrap();
}

/// A library with releases v1.0, v1.2 and v2.0 plus one untagged commit.
///
/// `lib_repo_open` gains a parameter in v2.0, `lib_blob_size` and the
/// examples directory appear in v1.2.
pub fn library_repo() -> (TempDir, Repository) {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    let v1_0 = commit_files(&repo, &[("include/lib/repo.h", REPO_H_V1)], "v1.0");
    tag(&repo, "v1.0", v1_0);
    let v1_2 = commit_files(
        &repo,
        &[("include/lib/blob.h", BLOB_H), ("examples/show.c", SHOW_C)],
        "v1.2",
    );
    tag(&repo, "v1.2", v1_2);
    let v2_0 = commit_files(&repo, &[("include/lib/repo.h", REPO_H_V2)], "v2.0");
    tag(&repo, "v2.0", v2_0);
    commit_files(&repo, &[("README", "lib\n")], "readme");

    (dir, repo)
}

pub fn write_config(dir: &Path, config: &str) -> std::path::PathBuf {
    let path = dir.join("hdoc.json");
    fs::write(&path, config).unwrap();
    path
}

pub const CONFIG: &str = r#"{
 "name": "lib",
 "github": "user/lib",
 "input": "include/lib",
 "prefix": "lib_",
 "examples": "examples"
}"#;
