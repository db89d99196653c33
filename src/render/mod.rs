//! Literate rendering of example sources behind a trait, so other
//! renderers can be plugged in.

pub mod literate;

/// An example source file to render.
#[derive(Debug, Clone, Copy)]
pub struct ExampleSource<'a> {
    /// Path relative to the examples subtree
    pub file: &'a str,
    /// All example files of the revision, including `file`
    pub siblings: &'a [String],
    /// Source language tag, e.g. `c`
    pub language: &'a str,
    pub revision: &'a str,
    pub text: &'a str,
}

/// Trait for turning example sources into annotated pages.
pub trait LiterateRenderer {
    fn render(&self, source: &ExampleSource<'_>) -> String;
    fn file_extension(&self) -> &str;
}

/// Output path for an example, relative to the revision's example
/// directory: the source path with its extension replaced.
/// "network/fetch.c" → "network/fetch.html"
pub fn output_name(file: &str, ext: &str) -> String {
    let (dir, filename) = match file.rsplit_once('/') {
        Some((dir, filename)) => (Some(dir), filename),
        None => (None, file),
    };
    let stem = match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    };
    match dir {
        Some(dir) => format!("{}/{}.{}", dir, stem, ext),
        None => format!("{}.{}", stem, ext),
    }
}

/// Relative prefix from the page rendered for `file` back to the revision's
/// example directory. Empty for top-level examples.
pub fn example_root(file: &str) -> String {
    "../".repeat(file.matches('/').count())
}

/// Relative prefix from the page rendered for `file` to the site root,
/// two levels above `ex/<revision>/`.
pub fn site_root(file: &str) -> String {
    format!("{}../../", example_root(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_replaces_extension() {
        assert_eq!(output_name("network/fetch.c", "html"), "network/fetch.html");
        assert_eq!(output_name("general.c", "html"), "general.html");
        assert_eq!(output_name("a.b.c", "html"), "a.b.html");
    }

    #[test]
    fn output_name_without_extension() {
        assert_eq!(output_name("Makefile", "html"), "Makefile.html");
        assert_eq!(output_name(".hidden", "html"), ".hidden.html");
    }

    #[test]
    fn same_stem_in_different_dirs_stays_distinct() {
        assert_ne!(output_name("a/fetch.c", "html"), output_name("b/fetch.c", "html"));
        assert_eq!(output_name("a/b/fetch.c", "html"), "a/b/fetch.html");
    }

    #[test]
    fn roots_climb_out_of_subdirectories() {
        assert_eq!(example_root("general.c"), "");
        assert_eq!(example_root("network/fetch.c"), "../");
        assert_eq!(site_root("general.c"), "../../");
        assert_eq!(site_root("a/b/fetch.c"), "../../../../");
    }
}
