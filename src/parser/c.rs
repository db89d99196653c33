//! Heuristic C header parser.
//!
//! Two passes: a character scanner splits the header into comments,
//! preprocessor directives and top-level statements (tracking line numbers),
//! then each statement is classified with regexes. Comments directly before
//! a declaration become its documentation. It understands the shapes found
//! in typical library headers, not the full C grammar.

use crate::model::*;
use crate::parser::HeaderParser;
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_DEFINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^#\s*define\s+([A-Za-z_]\w*)(\([^)]*\))?(.*)$").unwrap()
});

static RE_TYPEDEF_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^typedef\s+(enum|struct|union)\s*([A-Za-z_]\w*)?\s*\{(.*)\}\s*([A-Za-z_]\w*)\s*;$")
        .unwrap()
});

static RE_TYPEDEF_OPAQUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^typedef\s+(struct|union)\s+([A-Za-z_]\w*)\s+([A-Za-z_]\w*)\s*;$").unwrap()
});

static RE_TYPEDEF_FNPTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^typedef\s+.+?\(\s*\*\s*([A-Za-z_]\w*)\s*\)\s*\(.*\)\s*;$").unwrap()
});

static RE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(enum|struct|union)\s*([A-Za-z_]\w*)?\s*\{(.*)\}\s*;$").unwrap()
});

static RE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?P<ret>.*?[\s*])(?P<name>[A-Za-z_]\w*)\s*\((?P<args>.*)\)\s*;$").unwrap()
});

// Export macros wrapping the return type, e.g. `API(int)`
static RE_EXPORT_MACRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^[A-Z_][A-Z0-9_]*\((.*)\)$").unwrap());

static RE_FNPTR_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\*\s*([A-Za-z_]\w*)\s*\)").unwrap());

static RE_NAMED_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?[\s*])([A-Za-z_]\w*)\s*((?:\[[^\]]*\])*)$").unwrap()
});

static RE_LEADING_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z_]\w*)").unwrap());

static RE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*@param(?:\[[\w,\s]*\])?\s+([A-Za-z_]\w*|\.\.\.)\s*(.*)$").unwrap()
});

static RE_RETURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*@returns?\s*(.*)$").unwrap());

static RE_FILE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*@(file|brief|defgroup|ingroup)\b\s*(.*)$").unwrap());

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

// -- Scanner ------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Span {
    text: String,
    line: usize,
    lineto: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Chunk {
    Comment(Span),
    Directive(Span),
    Statement(Span),
}

/// Character-level scanner state.
struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    at_line_start: bool,
    depth: usize,
    buf: String,
    buf_line: Option<usize>,
    out: Vec<Chunk>,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Scanner {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            at_line_start: true,
            depth: 0,
            buf: String::new(),
            buf_line: None,
            out: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn in_statement(&self) -> bool {
        self.buf_line.is_some()
    }

    fn push(&mut self, c: char) {
        if !c.is_whitespace() && self.buf_line.is_none() {
            self.buf_line = Some(self.line);
        }
        if self.in_statement() {
            self.buf.push(c);
        }
    }

    /// Keep line structure inside a statement when skipping text.
    fn push_newlines(&mut self, count: usize) {
        if self.in_statement() {
            if count == 0 {
                self.buf.push(' ');
            }
            for _ in 0..count {
                self.buf.push('\n');
            }
        }
    }

    fn finish_statement(&mut self) {
        let text = self.buf.trim_end().to_string();
        if let Some(line) = self.buf_line.take() {
            self.out.push(Chunk::Statement(Span {
                text,
                line,
                lineto: self.line,
            }));
        }
        self.buf.clear();
    }

    fn run(mut self) -> Vec<Chunk> {
        while let Some(c) = self.peek(0) {
            match c {
                '\n' => {
                    self.push('\n');
                    self.line += 1;
                    self.pos += 1;
                    self.at_line_start = true;
                    continue;
                }
                '#' if self.at_line_start => self.directive(),
                '/' if self.peek(1) == Some('*') => self.block_comment(),
                '/' if self.peek(1) == Some('/') => self.line_comment(),
                '"' | '\'' => self.literal(c),
                '{' => {
                    if self.depth == 0 && self.buf.trim() == "extern \"C\"" {
                        // transparent wrapper
                        self.buf.clear();
                        self.buf_line = None;
                    } else {
                        self.depth += 1;
                        self.push(c);
                    }
                    self.pos += 1;
                }
                '}' => {
                    self.pos += 1;
                    if self.depth == 0 {
                        // closes an `extern "C"` wrapper
                        continue;
                    }
                    self.depth -= 1;
                    self.push(c);
                    if self.depth == 0 && is_function_body(&self.buf) {
                        self.finish_statement();
                    }
                }
                ';' if self.depth == 0 => {
                    self.push(c);
                    self.pos += 1;
                    self.finish_statement();
                }
                _ => {
                    self.push(c);
                    self.pos += 1;
                }
            }
            if !c.is_whitespace() {
                self.at_line_start = false;
            }
        }
        self.out
    }

    fn directive(&mut self) {
        let start = self.line;
        let mut text = String::new();
        let mut newlines = 0;
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                if text.ends_with('\\') {
                    text.pop();
                    text.push('\n');
                    self.line += 1;
                    newlines += 1;
                    self.pos += 1;
                    continue;
                }
                break;
            }
            text.push(c);
            self.pos += 1;
        }
        if self.in_statement() {
            // conditional compilation inside a declaration body
            self.push_newlines(newlines);
        } else {
            self.out.push(Chunk::Directive(Span {
                text: text.trim().to_string(),
                line: start,
                lineto: self.line,
            }));
        }
    }

    fn block_comment(&mut self) {
        let start = self.line;
        let mut text = String::from("/*");
        let mut newlines = 0;
        self.pos += 2;
        while let Some(c) = self.peek(0) {
            if c == '*' && self.peek(1) == Some('/') {
                text.push_str("*/");
                self.pos += 2;
                break;
            }
            if c == '\n' {
                self.line += 1;
                newlines += 1;
            }
            text.push(c);
            self.pos += 1;
        }
        self.comment(text, start, newlines);
    }

    fn line_comment(&mut self) {
        let start = self.line;
        let mut text = String::new();
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.pos += 1;
        }
        self.comment(text, start, 0);
    }

    fn comment(&mut self, text: String, start: usize, newlines: usize) {
        if self.in_statement() {
            self.push_newlines(newlines);
        } else {
            self.out.push(Chunk::Comment(Span {
                text,
                line: start,
                lineto: self.line,
            }));
        }
    }

    fn literal(&mut self, quote: char) {
        self.push(quote);
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.push(c);
            self.pos += 1;
            if c == '\\' {
                if let Some(escaped) = self.peek(0) {
                    if escaped != '\n' {
                        self.push(escaped);
                        self.pos += 1;
                    }
                }
            } else if c == quote {
                break;
            }
        }
    }
}

/// A closed brace group whose head ends in `)` is an inline definition.
fn is_function_body(buf: &str) -> bool {
    match buf.find('{') {
        Some(idx) => buf[..idx].trim_end().ends_with(')'),
        None => false,
    }
}

// -- Comments -----------------------------------------------------------------

/// Strip comment markers and leading `*` gutters.
fn clean_comment(raw: &str) -> String {
    let lines: Vec<String> = if let Some(rest) = raw.strip_prefix("/*") {
        let rest = rest.strip_suffix("*/").unwrap_or(rest);
        let rest = rest.trim_start_matches(['*', '!']);
        rest.lines()
            .map(|l| {
                let t = l.trim();
                t.strip_prefix('*').unwrap_or(t).trim().to_string()
            })
            .collect()
    } else {
        raw.lines()
            .map(|l| {
                l.trim()
                    .trim_start_matches('/')
                    .trim_start_matches('!')
                    .trim()
                    .to_string()
            })
            .collect()
    };
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

fn file_record(path: &str, text: &str, span: &Span) -> Option<FileRecord> {
    let mut rec = FileRecord {
        loc: Location {
            file: path.to_string(),
            line: span.line,
            lineto: span.lineto,
        },
        ..Default::default()
    };
    let mut tagged = false;
    let mut rest = Vec::new();
    for line in text.lines() {
        match RE_FILE_TAG.captures(line) {
            Some(caps) => {
                tagged = true;
                let value = caps[2].trim().to_string();
                match &caps[1] {
                    "brief" => rec.brief = Some(value),
                    "defgroup" => rec.defgroup = Some(value),
                    "ingroup" => rec.ingroup = Some(value),
                    _ => {}
                }
            }
            None => {
                let line = line.trim();
                if line != "@{" && line != "@}" {
                    rest.push(line);
                }
            }
        }
    }
    if !tagged {
        return None;
    }
    let comments = rest.join("\n").trim().to_string();
    if !comments.is_empty() {
        rec.comments = Some(comments);
    }
    Some(rec)
}

/// Split a doc comment into description and remaining comments, filling
/// argument comments from `@param` lines that name a known argument.
fn apply_doc(doc: &str, args: &mut [Arg]) -> (String, String, Option<String>) {
    let mut description = Vec::new();
    let mut rest = Vec::new();
    let mut ret = None;
    let mut in_description = true;
    for line in doc.lines() {
        if let Some(caps) = RE_PARAM.captures(line) {
            in_description = false;
            match args.iter_mut().find(|a| a.name == caps[1]) {
                Some(arg) => arg.comment = Some(caps[2].trim().to_string()),
                None => rest.push(line.trim()),
            }
            continue;
        }
        if let Some(caps) = RE_RETURN.captures(line) {
            in_description = false;
            ret = Some(caps[1].trim().to_string());
            continue;
        }
        if in_description {
            if line.trim().is_empty() {
                in_description = description.is_empty();
                continue;
            }
            description.push(line.trim());
        } else {
            rest.push(line.trim());
        }
    }
    (
        description.join(" "),
        rest.join("\n").trim().to_string(),
        ret,
    )
}

// -- Declarations -------------------------------------------------------------

fn collapse(text: &str) -> String {
    RE_WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Split at commas that are not nested inside parentheses or braces.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn parse_arg(raw: &str) -> Arg {
    let raw = collapse(raw);
    if raw == "..." {
        return Arg {
            name: "...".into(),
            ty: "...".into(),
            comment: None,
        };
    }
    if let Some(caps) = RE_FNPTR_ARG.captures(&raw) {
        let name = caps[1].to_string();
        let ty = RE_FNPTR_ARG.replace(&raw, "(*)").into_owned();
        return Arg {
            name,
            ty,
            comment: None,
        };
    }
    match RE_NAMED_ARG.captures(&raw) {
        Some(caps) if !caps[1].trim().is_empty() => Arg {
            name: caps[2].to_string(),
            ty: format!("{}{}", caps[1].trim(), &caps[3]),
            comment: None,
        },
        _ => Arg {
            name: String::new(),
            ty: raw,
            comment: None,
        },
    }
}

fn parse_args(text: &str) -> Vec<Arg> {
    let text = text.trim();
    if text.is_empty() || text == "void" {
        return Vec::new();
    }
    split_top_level(text).into_iter().map(parse_arg).collect()
}

fn return_type(raw: &str) -> String {
    let mut ret = collapse(raw);
    for keyword in ["extern ", "static ", "inline "] {
        while let Some(rest) = ret.strip_prefix(keyword) {
            ret = rest.trim_start().to_string();
        }
    }
    if let Some(caps) = RE_EXPORT_MACRO.captures(&ret) {
        return collapse(&caps[1]);
    }
    ret
}

fn enumerators(body: &str) -> Vec<String> {
    split_top_level(body)
        .into_iter()
        .filter_map(|item| RE_LEADING_IDENT.captures(item).map(|caps| caps[1].to_string()))
        .collect()
}

fn location(path: &str, span: &Span) -> Location {
    Location {
        file: path.to_string(),
        line: span.line,
        lineto: span.lineto,
    }
}

fn define(path: &str, span: &Span, comments: String) -> Option<Record> {
    let caps = RE_DEFINE.captures(&span.text)?;
    let value = caps[3].trim().to_string();
    let rec = DefineRecord {
        decl: caps[1].to_string(),
        value,
        loc: location(path, span),
        comments,
    };
    if caps.get(2).is_some() {
        return Some(Record::Macro(rec));
    }
    // include guards and feature flags carry no value
    if rec.value.is_empty() {
        return None;
    }
    Some(Record::Define(rec))
}

fn statement(path: &str, span: &Span, doc: String) -> Record {
    let text = span.text.as_str();
    let loc = location(path, span);

    if let Some(caps) = RE_TYPEDEF_BLOCK.captures(text) {
        let name = caps[4].to_string();
        let block = text.to_string();
        if &caps[1] == "enum" {
            let body = caps[3].to_string();
            return Record::Enum(EnumRecord {
                name: Some(name),
                decl: enumerators(&body),
                loc,
                block,
                body,
                tdef: Some("typedef".into()),
                comments: doc,
            });
        }
        return Record::Struct(TypeRecord {
            name,
            value: None,
            loc,
            block,
            tdef: Some("typedef".into()),
            comments: doc,
        });
    }

    if let Some(caps) = RE_TYPEDEF_OPAQUE.captures(text) {
        return Record::Struct(TypeRecord {
            name: caps[3].to_string(),
            value: Some(caps[3].to_string()),
            loc,
            block: text.to_string(),
            tdef: Some("typedef".into()),
            comments: doc,
        });
    }

    if let Some(caps) = RE_TYPEDEF_FNPTR.captures(text) {
        return Record::FnPtr(TypeRecord {
            name: caps[1].to_string(),
            value: None,
            loc,
            block: text.to_string(),
            tdef: Some("typedef".into()),
            comments: doc,
        });
    }

    if text.starts_with("typedef") {
        return Record::Other(OtherRecord {
            kind: "typedef".into(),
            loc,
        });
    }

    if let Some(caps) = RE_BLOCK.captures(text) {
        let tag = caps.get(2).map(|m| m.as_str().to_string());
        let block = text.to_string();
        if &caps[1] == "enum" {
            let body = caps[3].to_string();
            return Record::Enum(EnumRecord {
                name: tag,
                decl: enumerators(&body),
                loc,
                block,
                body,
                tdef: None,
                comments: doc,
            });
        }
        if let Some(name) = tag {
            return Record::Struct(TypeRecord {
                name,
                value: None,
                loc,
                block,
                tdef: None,
                comments: doc,
            });
        }
    }

    if let Some(caps) = RE_FUNCTION.captures(text) {
        let mut args = parse_args(&caps["args"]);
        let (description, comments, ret_comment) = apply_doc(&doc, &mut args);
        let sig = args
            .iter()
            .map(|a| a.ty.as_str())
            .collect::<Vec<_>>()
            .join("::");
        return Record::Function(FunctionRecord {
            name: caps["name"].to_string(),
            loc,
            argline: collapse(&caps["args"]),
            sig,
            args,
            ret: ReturnType {
                ty: return_type(&caps["ret"]),
                comment: ret_comment,
            },
            description,
            comments,
        });
    }

    let kind = if text.ends_with('}') {
        "inline"
    } else {
        "declaration"
    };
    Record::Other(OtherRecord {
        kind: kind.into(),
        loc,
    })
}

// -- Public API ---------------------------------------------------------------

/// The bundled parser for C headers.
#[derive(Debug, Default, Clone, Copy)]
pub struct CParser;

impl HeaderParser for CParser {
    fn parse(&self, path: &str, content: &str) -> Result<Vec<Record>> {
        Ok(parse(path, content))
    }
}

/// Parse a C header into records, in source order.
pub fn parse(path: &str, content: &str) -> Vec<Record> {
    let mut records = Vec::new();
    // (cleaned text, last line) of the comment block awaiting a declaration
    let mut pending: Option<(String, usize)> = None;

    for chunk in Scanner::new(content).run() {
        match chunk {
            Chunk::Comment(span) => {
                let text = clean_comment(&span.text);
                if let Some(rec) = file_record(path, &text, &span) {
                    records.push(Record::File(rec));
                    pending = None;
                    continue;
                }
                pending = match pending.take() {
                    Some((prev, lineto)) if span.line <= lineto + 1 => {
                        Some((format!("{prev}\n{text}"), span.lineto))
                    }
                    _ => Some((text, span.lineto)),
                };
            }
            Chunk::Directive(span) => {
                let doc = pending.take().map(|(text, _)| text).unwrap_or_default();
                if let Some(rec) = define(path, &span, doc) {
                    records.push(rec);
                }
            }
            Chunk::Statement(span) => {
                let doc = pending.take().map(|(text, _)| text).unwrap_or_default();
                records.push(statement(path, &span, doc));
            }
        }
    }
    records
}
