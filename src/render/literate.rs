//! Side-by-side HTML: comment prose on the left, the code it precedes on
//! the right.

use crate::render::{example_root, output_name, site_root, ExampleSource, LiterateRenderer};

pub struct HtmlLiterate;

/// One prose block and the code that follows it.
#[derive(Debug, Default, PartialEq)]
struct Section {
    docs: Vec<String>,
    code: Vec<String>,
}

impl LiterateRenderer for HtmlLiterate {
    fn render(&self, source: &ExampleSource<'_>) -> String {
        let ext = self.file_extension();
        let up = example_root(source.file);
        let mut out = String::new();

        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", html_escape(source.file)));
        out.push_str("<style>\n");
        out.push_str("body { font-family: system-ui, sans-serif; margin: 0; }\n");
        out.push_str("table { border-collapse: collapse; width: 100%; }\n");
        out.push_str("td { vertical-align: top; padding: 0 1em; }\n");
        out.push_str("td.docs { max-width: 30em; }\n");
        out.push_str("td.code { background: #f5f5ff; }\n");
        out.push_str("pre { margin: 0; }\n");
        out.push_str("</style>\n");
        out.push_str("</head>\n<body>\n");

        // Jump list
        if source.siblings.len() > 1 {
            out.push_str("<div id=\"jump_to\">\n<ul>\n");
            for sibling in source.siblings {
                out.push_str(&format!(
                    "  <li><a class=\"source\" href=\"{}{}\">{}</a></li>\n",
                    up,
                    html_escape(&output_name(sibling, ext)),
                    html_escape(sibling)
                ));
            }
            out.push_str("</ul>\n</div>\n");
        }

        out.push_str("<table>\n<thead>\n<tr>\n");
        out.push_str(&format!(
            "  <th class=\"docs\"><h1>{}</h1><p class=\"revision\"><a href=\"{}#{}\">{}</a></p></th>\n",
            html_escape(source.file),
            site_root(source.file),
            html_escape(source.revision),
            html_escape(source.revision)
        ));
        out.push_str("  <th class=\"code\"></th>\n</tr>\n</thead>\n<tbody>\n");

        for (i, section) in split_sections(source.text).iter().enumerate() {
            let n = i + 1;
            out.push_str(&format!("<tr id=\"section-{}\">\n", n));
            out.push_str("  <td class=\"docs\">");
            out.push_str(&format!(
                "<a class=\"pilcrow\" href=\"#section-{}\">&#182;</a>",
                n
            ));
            out.push_str(&render_docs(&section.docs));
            out.push_str("</td>\n");
            out.push_str(&format!(
                "  <td class=\"code\"><pre><code class=\"language-{}\">{}</code></pre></td>\n",
                html_escape(source.language),
                html_escape(section.code.join("\n").trim_end())
            ));
            out.push_str("</tr>\n");
        }

        out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
        out
    }

    fn file_extension(&self) -> &str {
        "html"
    }
}

/// Split C-family source into prose/code sections. Line comments and
/// block comments that start a line are prose; a prose line after code
/// starts a new section.
fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section::default();
    let mut in_block = false;

    for line in text.lines() {
        let trimmed = line.trim_start();

        let doc = if in_block {
            let (content, closed) = match trimmed.find("*/") {
                Some(idx) => (&trimmed[..idx], true),
                None => (trimmed, false),
            };
            in_block = !closed;
            Some(strip_gutter(content))
        } else if let Some(rest) = trimmed.strip_prefix("//") {
            Some(rest.trim_start_matches('/').trim().to_string())
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            let rest = rest.trim_start_matches(['*', '!']);
            match rest.find("*/") {
                Some(idx) if rest[idx + 2..].trim().is_empty() => Some(rest[..idx].trim().to_string()),
                // code after the comment on the same line
                Some(_) => None,
                None => {
                    in_block = true;
                    Some(rest.trim().to_string())
                }
            }
        } else {
            None
        };

        match doc {
            Some(doc) => {
                if !current.code.is_empty() {
                    sections.push(std::mem::take(&mut current));
                }
                current.docs.push(doc);
            }
            None => current.code.push(line.to_string()),
        }
    }
    if !current.docs.is_empty() || !current.code.is_empty() {
        sections.push(current);
    }
    sections
}

fn strip_gutter(line: &str) -> String {
    let t = line.trim();
    t.strip_prefix('*').unwrap_or(t).trim().to_string()
}

/// Prose lines to paragraphs, split on blank lines.
fn render_docs(lines: &[String]) -> String {
    let mut out = String::new();
    for para in lines.split(|l| l.is_empty()) {
        if para.is_empty() {
            continue;
        }
        out.push_str(&format!("<p>{}</p>", html_escape(&para.join(" "))));
    }
    out
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
