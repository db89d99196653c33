//! The revision loop: checkout, parse, aggregate, group, resolve usage,
//! track signatures, link examples, emit.
//!
//! Revisions are processed strictly in order. Everything that outlives a
//! revision lives in [`History`], which is passed explicitly into each step.

use crate::aggregate::aggregate;
use crate::config::Project;
use crate::emit::{self, Destination, Published};
use crate::git::GitRepo;
use crate::groups;
use crate::history::SignatureHistory;
use crate::linker::link_examples;
use crate::model::{GroupRegistry, ProjectManifest, Snapshot};
use crate::parser::c::CParser;
use crate::parser::{HeaderParser, HEADER_EXTENSION};
use crate::render::literate::HtmlLiterate;
use crate::render::LiterateRenderer;
use crate::usage;
use crate::versions::{self, CURRENT};
use crate::walk::find_sources;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// State carried from one revision to the next.
#[derive(Debug, Default, Clone)]
pub struct History {
    pub signatures: SignatureHistory,
    /// Function -> group; entries are overwritten by later revisions
    pub groups: GroupRegistry,
}

impl History {
    pub fn into_manifest(self, revisions: &[String], project: &Project) -> ProjectManifest {
        ProjectManifest {
            versions: revisions.iter().rev().cloned().collect(),
            github: project.config.github.clone(),
            name: project.config.name.clone(),
            signatures: self.signatures.into_records(),
            groups: self.groups,
        }
    }
}

/// Findings about the current state of the API.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApiReport {
    /// Functions whose comments still carry an `@param` no argument matched
    pub unmatched_params: Vec<String>,
    /// Functions whose signature changed at the checked revision
    pub signature_changes: Vec<String>,
}

impl ApiReport {
    pub fn is_empty(&self) -> bool {
        self.unmatched_params.is_empty() && self.signature_changes.is_empty()
    }
}

pub fn check_api(revision: &str, snapshot: &Snapshot, signatures: &SignatureHistory) -> ApiReport {
    let unmatched_params = snapshot
        .functions
        .iter()
        .filter(|(_, func)| func.comments.contains("@param"))
        .map(|(name, _)| name.clone())
        .collect();
    let signature_changes = signatures
        .changed_at(revision)
        .into_iter()
        .map(str::to_string)
        .collect();
    ApiReport {
        unmatched_params,
        signature_changes,
    }
}

fn log_report(report: &ApiReport) {
    info!("checking your api");
    for func in &report.unmatched_params {
        warn!(function = %func, "unmatched params");
    }
    for func in &report.signature_changes {
        warn!(function = %func, "signature changed");
    }
}

/// Documentation generator for one project.
pub struct Generator<'a> {
    pub project: &'a Project,
    pub git: &'a GitRepo,
    pub parser: &'a dyn HeaderParser,
    pub renderer: &'a dyn LiterateRenderer,
}

impl<'a> Generator<'a> {
    /// Generator using the bundled C parser and HTML example renderer.
    pub fn new(project: &'a Project, git: &'a GitRepo) -> Self {
        Generator {
            project,
            git,
            parser: &CParser,
            renderer: &HtmlLiterate,
        }
    }

    /// Tags in version order followed by the current state.
    pub fn revisions(&self) -> Result<Vec<String>> {
        let tags = self.git.tags().context("failed to list tags")?;
        Ok(versions::revisions(tags))
    }

    /// Build the snapshot for one revision, folding its functions into
    /// `history`. Rendered examples are written below `outdir`.
    pub fn process_revision(
        &self,
        revision: &str,
        outdir: &Path,
        history: &mut History,
    ) -> Result<Snapshot> {
        let config = &self.project.config;
        let input = config.input_for(revision);
        let mut snapshot = Snapshot::new(input.as_str());

        let workdir = TempDir::new().context("failed to create work directory")?;
        let found = self
            .git
            .checkout(revision, &input, workdir.path())
            .with_context(|| format!("failed to check out {}:{}", revision, input))?;
        if !found {
            debug!(revision, input = %input, "header subtree absent");
        }

        for header in find_sources(workdir.path(), HEADER_EXTENSION)? {
            let path = workdir.path().join(&header);
            let bytes =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let content = String::from_utf8_lossy(&bytes);
            let records = self
                .parser
                .parse(&header, &content)
                .with_context(|| format!("failed to parse {}", header))?;
            aggregate(&mut snapshot, &header, records);
        }

        let prefix = config.prefix_for(revision);
        groups::assign(&mut snapshot, prefix.as_deref(), &mut history.groups);
        usage::resolve(&mut snapshot).context("failed to resolve type usage")?;
        history.signatures.record(revision, &snapshot);

        if let Some(examples) = config.examples_for(revision) {
            let exdir = TempDir::new().context("failed to create examples directory")?;
            let present = self
                .git
                .checkout(revision, &examples, exdir.path())
                .with_context(|| format!("failed to check out {}:{}", revision, examples))?;
            if present {
                info!(revision, "processing examples");
                link_examples(self.renderer, &mut snapshot, revision, exdir.path(), outdir)?;
            }
        }

        if revision == CURRENT {
            let report = check_api(revision, &snapshot, &history.signatures);
            log_report(&report);
        }

        Ok(snapshot)
    }

    /// Process every revision into `outdir` and write the manifest.
    pub fn generate(&self, outdir: &Path) -> Result<ProjectManifest> {
        info!("generating docs");
        let revisions = self.revisions()?;
        let mut history = History::default();

        for revision in &revisions {
            info!(revision = %revision, "processing version");
            let snapshot = self.process_revision(revision, outdir, &mut history)?;
            emit::write_snapshot(outdir, revision, &snapshot)?;
        }

        let manifest = history.into_manifest(&revisions, self.project);
        emit::write_manifest(outdir, &manifest)?;
        Ok(manifest)
    }

    /// Generate into a scratch directory, then publish it.
    pub fn run(&self) -> Result<Published> {
        let stage = TempDir::new().context("failed to create output directory")?;
        self.generate(stage.path())?;
        emit::publish(self.git, stage.path(), &self.destination())
    }

    pub fn destination(&self) -> Destination {
        match &self.project.config.branch {
            Some(branch) => Destination::Branch(branch.clone()),
            None => Destination::Directory(self.project.output_dir()),
        }
    }
}

/// Load the config at `config_path` and generate the project's docs.
pub fn generate_docs(config_path: &Path) -> Result<Published> {
    let project = Project::load(config_path)?;
    let git = GitRepo::open(&project.dir)?;
    Generator::new(&project, &git).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::Function;

    fn snapshot_with(funcs: &[(&str, &str, &str)]) -> Snapshot {
        let mut snap = Snapshot::default();
        for (name, sig, comments) in funcs {
            snap.functions.insert(
                name.to_string(),
                Function {
                    sig: sig.to_string(),
                    comments: comments.to_string(),
                    ..Default::default()
                },
            );
        }
        snap
    }

    #[test]
    fn report_lists_unmatched_params_and_changes() {
        let mut signatures = SignatureHistory::new();
        signatures.record("v1", &snapshot_with(&[("lib_a", "int", ""), ("lib_b", "int", "")]));
        let head = snapshot_with(&[
            ("lib_a", "int::int", ""),
            ("lib_b", "int", "@param gone was removed"),
        ]);
        signatures.record(CURRENT, &head);

        let report = check_api(CURRENT, &head, &signatures);
        assert_eq!(report.unmatched_params, ["lib_b"]);
        assert_eq!(report.signature_changes, ["lib_a"]);
        assert!(!report.is_empty());
    }

    #[test]
    fn clean_api_has_empty_report() {
        let signatures = SignatureHistory::new();
        let report = check_api(CURRENT, &snapshot_with(&[("lib_a", "int", "")]), &signatures);
        assert!(report.is_empty());
    }

    #[test]
    fn manifest_lists_revisions_newest_first() {
        let project = Project {
            dir: "/tmp/project".into(),
            config: Config {
                name: Some("lib".into()),
                github: Some("user/lib".into()),
                ..Default::default()
            },
        };
        let mut history = History::default();
        history.groups.insert("lib_a".into(), "a".into());
        let revisions = vec!["v1".to_string(), "v2".to_string(), CURRENT.to_string()];
        let manifest = history.into_manifest(&revisions, &project);
        assert_eq!(manifest.versions, ["HEAD", "v2", "v1"]);
        assert_eq!(manifest.github.as_deref(), Some("user/lib"));
        assert_eq!(manifest.groups["lib_a"], "a");
    }
}
