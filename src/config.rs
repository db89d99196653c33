//! Project configuration loaded from a JSON file next to the repository.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Template written by `hdoc gen`.
pub const TEMPLATE: &str = r#"{
 "name":   "project",
 "github": "user/project",
 "input":  "include/lib",
 "prefix": "lib_",
 "output": "docs"
}
"#;

/// Output directory used when neither `branch` nor `output` is set.
pub const DEFAULT_OUTPUT: &str = "docs";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Option -> value -> revisions that value applies to.
pub type LegacyOverrides = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub name: Option<String>,
    /// `user/project` identity on GitHub
    pub github: Option<String>,
    /// Header subtree inside the repository
    pub input: Option<String>,
    /// Function-name prefix stripped before grouping
    pub prefix: Option<String>,
    /// Local output directory, relative to the project directory
    pub output: Option<String>,
    /// Publish branch; takes precedence over `output`
    pub branch: Option<String>,
    /// Examples subtree inside the repository
    pub examples: Option<String>,
    #[serde(default)]
    pub legacy: LegacyOverrides,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Value of `option` for `revision`, honoring legacy overrides.
    pub fn option_for(&self, revision: &str, option: &str) -> Option<String> {
        if let Some(values) = self.legacy.get(option) {
            for (value, revisions) in values {
                if revisions.iter().any(|r| r == revision) {
                    return Some(value.clone());
                }
            }
        }
        let base = match option {
            "name" => &self.name,
            "github" => &self.github,
            "input" => &self.input,
            "prefix" => &self.prefix,
            "output" => &self.output,
            "branch" => &self.branch,
            "examples" => &self.examples,
            _ => return None,
        };
        base.clone()
    }

    /// Header subtree for `revision`; empty means the repository root.
    pub fn input_for(&self, revision: &str) -> String {
        self.option_for(revision, "input").unwrap_or_default()
    }

    pub fn prefix_for(&self, revision: &str) -> Option<String> {
        self.option_for(revision, "prefix").filter(|p| !p.is_empty())
    }

    pub fn examples_for(&self, revision: &str) -> Option<String> {
        self.option_for(revision, "examples")
    }
}

/// A loaded config together with the project directory it lives in.
#[derive(Debug, Clone)]
pub struct Project {
    pub dir: PathBuf,
    pub config: Config,
}

impl Project {
    /// Load `path`; the project (and repository) directory is its parent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Config::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let full = fs::canonicalize(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let dir = full
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Project { dir, config })
    }

    /// Directory the generated tree is copied to when no branch is set.
    pub fn output_dir(&self) -> PathBuf {
        self.dir
            .join(self.config.output.as_deref().unwrap_or(DEFAULT_OUTPUT))
    }
}
