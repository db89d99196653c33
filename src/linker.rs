//! Example linking: render example sources and turn every mention of a
//! known function into an anchor that links back to its documentation.

use crate::model::Snapshot;
use crate::render::{output_name, site_root, ExampleSource, LiterateRenderer};
use crate::walk::find_sources;
use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use tracing::info;

/// Extension of example sources.
pub const EXAMPLE_EXTENSION: &str = "c";
const EXAMPLE_LANGUAGE: &str = "c";

/// Path of a rendered example inside the output tree.
pub fn example_path(revision: &str, file: &str, ext: &str) -> String {
    format!("ex/{}/{}", revision, output_name(file, ext))
}

/// Render every example under `examples_dir` into `outdir`, recording
/// anchors on the snapshot's functions and the example list on the
/// snapshot itself.
pub fn link_examples(
    renderer: &dyn LiterateRenderer,
    snapshot: &mut Snapshot,
    revision: &str,
    examples_dir: &Path,
    outdir: &Path,
) -> Result<()> {
    let files = find_sources(examples_dir, EXAMPLE_EXTENSION)?;
    let mut examples = Vec::new();

    for file in &files {
        info!(file = %file, "rendering example");
        let path = examples_dir.join(file);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let page = renderer.render(&ExampleSource {
            file,
            siblings: &files,
            language: EXAMPLE_LANGUAGE,
            revision,
            text: &text,
        });

        let rel_path = example_path(revision, file, renderer.file_extension());
        let page = link_functions(snapshot, revision, file, &rel_path, &page)?;

        let out_path = outdir.join(&rel_path);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        fs::write(&out_path, &page)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        examples.push((file.clone(), rel_path));
    }

    snapshot.examples = Some(examples);
    Ok(())
}

/// Wrap each occurrence of a known function name in `page` with an anchor.
///
/// All names are matched in one pass over the rendered page, so text
/// inserted for one anchor is never rescanned. An occurrence must be
/// followed by a non-identifier character. Anchor ids are `<name>-<n>` with
/// `n` counting up through the page, and each one is appended to the
/// function's `examples[file]`.
pub fn link_functions(
    snapshot: &mut Snapshot,
    revision: &str,
    file: &str,
    rel_path: &str,
    page: &str,
) -> Result<String> {
    if snapshot.functions.is_empty() {
        return Ok(page.to_string());
    }

    // longest first so a name never shadows one it prefixes
    let mut names: Vec<&str> = snapshot.functions.keys().map(String::as_str).collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    let re = Regex::new(&format!(r"\b({})(\W)", alternation))
        .context("failed to build function link pattern")?;

    let root = site_root(file);
    let functions = &snapshot.functions;
    let mut id_num = 0usize;
    let mut anchors: Vec<(String, String)> = Vec::new();

    let linked = re
        .replace_all(page, |caps: &Captures| {
            let name = &caps[1];
            let group = functions
                .get(name)
                .and_then(|func| func.group.as_deref())
                .unwrap_or_default();
            id_num += 1;
            let anchor = format!("{}-{}", name, id_num);
            anchors.push((name.to_string(), format!("{}#{}", rel_path, anchor)));
            format!(
                "<a name=\"{anchor}\" class=\"fnlink\" href=\"{root}#{revision}/group/{group}/{name}\">{name}</a>{}",
                &caps[2]
            )
        })
        .into_owned();

    for (name, reference) in anchors {
        if let Some(func) = snapshot.functions.get_mut(&name) {
            func.examples
                .entry(file.to_string())
                .or_default()
                .push(reference);
        }
    }
    Ok(linked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Function;
    use crate::render::literate::HtmlLiterate;
    use tempfile::TempDir;

    fn snapshot() -> Snapshot {
        let mut snap = Snapshot::default();
        for (name, group) in [("lib_open", "open"), ("lib_open_ext", "open"), ("lib_free", "free")] {
            snap.functions.insert(
                name.into(),
                Function {
                    group: Some(group.into()),
                    ..Default::default()
                },
            );
        }
        snap
    }

    #[test]
    fn occurrences_get_unique_anchors() {
        let mut snap = snapshot();
        let page = "lib_open(a);\nlib_open_ext(b);\nlib_free(a);\nlib_free(b);\n";
        let out =
            link_functions(&mut snap, "v1.0", "general.c", "ex/v1.0/general.html", page).unwrap();

        assert!(out.contains(
            "<a name=\"lib_free-3\" class=\"fnlink\" href=\"../../#v1.0/group/free/lib_free\">lib_free</a>("
        ));
        assert!(out.contains("name=\"lib_open-1\""));
        assert!(out.contains("name=\"lib_open_ext-2\""));
        assert!(out.contains("name=\"lib_free-4\""));
        assert_eq!(
            snap.functions["lib_free"].examples["general.c"],
            ["ex/v1.0/general.html#lib_free-3", "ex/v1.0/general.html#lib_free-4"]
        );
        assert_eq!(
            snap.functions["lib_open"].examples["general.c"],
            ["ex/v1.0/general.html#lib_open-1"]
        );
    }

    #[test]
    fn partial_identifiers_are_not_linked() {
        let mut snap = snapshot();
        let out = link_functions(&mut snap, "HEAD", "a.c", "ex/HEAD/a.html", "my_lib_free(x); lib_freeze(y);\n")
            .unwrap();
        assert!(!out.contains("fnlink"));
        assert!(snap.functions["lib_free"].examples.is_empty());
    }

    #[test]
    fn occurrence_at_end_of_text_is_not_linked() {
        let mut snap = snapshot();
        let out = link_functions(&mut snap, "HEAD", "a.c", "ex/HEAD/a.html", "see lib_free").unwrap();
        assert_eq!(out, "see lib_free");
    }

    #[test]
    fn link_examples_writes_pages_and_records_list() {
        let examples = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::create_dir_all(examples.path().join("network")).unwrap();
        fs::write(examples.path().join("general.c"), "int main(void) { lib_open(0); }\n").unwrap();
        fs::write(examples.path().join("network/fetch.c"), "// fetch\nlib_free(0);\n").unwrap();
        fs::write(examples.path().join("README"), "not an example").unwrap();

        let mut snap = snapshot();
        link_examples(&HtmlLiterate, &mut snap, "v2.0", examples.path(), out.path()).unwrap();

        assert_eq!(
            snap.examples,
            Some(vec![
                ("general.c".to_string(), "ex/v2.0/general.html".to_string()),
                ("network/fetch.c".to_string(), "ex/v2.0/network/fetch.html".to_string()),
            ])
        );
        let page = fs::read_to_string(out.path().join("ex/v2.0/general.html")).unwrap();
        assert!(page.contains("class=\"fnlink\""));
        assert!(snap.functions["lib_open"].examples.contains_key("general.c"));
        assert!(snap.functions["lib_free"].examples.contains_key("network/fetch.c"));
        let nested = fs::read_to_string(out.path().join("ex/v2.0/network/fetch.html")).unwrap();
        assert!(nested.contains("href=\"../../../#v2.0/group/free/lib_free\""));
    }

    #[test]
    fn inserted_links_are_not_rescanned() {
        let mut snap = Snapshot::default();
        for (name, group) in [("lib_zz_open", "zz"), ("zz", "zz")] {
            snap.functions.insert(
                name.into(),
                Function {
                    group: Some(group.into()),
                    ..Default::default()
                },
            );
        }
        let out = link_functions(&mut snap, "HEAD", "a.c", "ex/HEAD/a.html", "lib_zz_open(x);\n")
            .unwrap();

        assert_eq!(out.matches("<a ").count(), 1);
        assert!(out.contains("href=\"../../#HEAD/group/zz/lib_zz_open\">lib_zz_open</a>("));
        assert!(snap.functions["zz"].examples.is_empty());
        assert_eq!(
            snap.functions["lib_zz_open"].examples["a.c"],
            ["ex/HEAD/a.html#lib_zz_open-1"]
        );
    }

    #[test]
    fn same_file_name_in_two_dirs_gets_two_pages() {
        let examples = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::create_dir_all(examples.path().join("a")).unwrap();
        fs::create_dir_all(examples.path().join("b")).unwrap();
        fs::write(examples.path().join("a/fetch.c"), "lib_open(0);\n").unwrap();
        fs::write(examples.path().join("b/fetch.c"), "lib_free(0);\n").unwrap();

        let mut snap = snapshot();
        link_examples(&HtmlLiterate, &mut snap, "HEAD", examples.path(), out.path()).unwrap();

        let refs = &snap.functions["lib_open"].examples["a/fetch.c"];
        assert_eq!(refs, &["ex/HEAD/a/fetch.html#lib_open-1"]);
        let first = fs::read_to_string(out.path().join("ex/HEAD/a/fetch.html")).unwrap();
        assert!(first.contains("name=\"lib_open-1\""));
        let second = fs::read_to_string(out.path().join("ex/HEAD/b/fetch.html")).unwrap();
        assert!(second.contains("name=\"lib_free-1\""));
        assert!(!second.contains("lib_open"));
    }
}
