//! Data model for the extracted API: parser records, per-revision
//! snapshots and the cross-revision manifest.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

// -- Parser records -----------------------------------------------------------

/// Where a record was found in its header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Header path relative to the checked-out subtree root
    pub file: String,
    /// First line of the declaration (1-based)
    pub line: usize,
    /// Last line of the declaration
    pub lineto: usize,
}

/// A single typed fact emitted by a header parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Function(FunctionRecord),
    Define(DefineRecord),
    Macro(DefineRecord),
    File(FileRecord),
    Enum(EnumRecord),
    Struct(TypeRecord),
    FnPtr(TypeRecord),
    /// Declarations the aggregator does not track (plain typedefs, variables, ...)
    Other(OtherRecord),
}

impl Record {
    pub fn location(&self) -> &Location {
        match self {
            Record::Function(r) => &r.loc,
            Record::Define(r) | Record::Macro(r) => &r.loc,
            Record::File(r) => &r.loc,
            Record::Enum(r) => &r.loc,
            Record::Struct(r) | Record::FnPtr(r) => &r.loc,
            Record::Other(r) => &r.loc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionRecord {
    pub name: String,
    pub loc: Location,
    pub args: Vec<Arg>,
    /// Raw argument list text, whitespace-normalized
    pub argline: String,
    /// Argument types joined by `::`; compared verbatim across revisions
    pub sig: String,
    pub ret: ReturnType,
    pub description: String,
    pub comments: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefineRecord {
    pub decl: String,
    pub value: String,
    pub loc: Location,
    pub comments: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRecord {
    pub loc: Location,
    pub brief: Option<String>,
    pub defgroup: Option<String>,
    pub ingroup: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumRecord {
    /// `None` for anonymous enums, which are exploded into globals
    pub name: Option<String>,
    /// Enumerator identifiers in declaration order
    pub decl: Vec<String>,
    pub loc: Location,
    /// Full declaration text
    pub block: String,
    /// Text between the braces
    pub body: String,
    pub tdef: Option<String>,
    pub comments: String,
}

/// Struct or function-pointer type declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeRecord {
    pub name: String,
    pub value: Option<String>,
    pub loc: Location,
    pub block: String,
    pub tdef: Option<String>,
    pub comments: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OtherRecord {
    pub kind: String,
    pub loc: Location,
}

// -- Snapshot -----------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Arg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReturnType {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Function {
    pub file: String,
    pub line: usize,
    pub lineto: usize,
    pub args: Vec<Arg>,
    pub argline: String,
    pub sig: String,
    #[serde(rename = "return")]
    pub ret: ReturnType,
    pub description: String,
    pub comments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Example file -> anchor references into the rendered example
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub examples: BTreeMap<String, Vec<String>>,
}

/// Functions returning or consuming a type, both kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeUsage {
    pub returns: Vec<String>,
    pub needs: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Type {
    /// `enum`, `struct`, `function pointer`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub file: String,
    pub line: usize,
    pub lineto: usize,
    pub block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tdef: Option<String>,
    pub comments: String,
    pub used: TypeUsage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Global {
    pub value: String,
    pub file: String,
    pub line: usize,
    pub comments: String,
}

/// File-level comment tags merged from file records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileMetaTags {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defgroup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingroup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileMeta {
    pub file: String,
    pub functions: Vec<String>,
    pub meta: FileMetaTags,
    /// Highest `lineto` seen in this file
    pub lines: usize,
}

/// The complete API model for one revision.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub files: Vec<FileMeta>,
    pub functions: BTreeMap<String, Function>,
    pub globals: BTreeMap<String, Global>,
    #[serde(serialize_with = "as_pairs")]
    pub types: BTreeMap<String, Type>,
    /// Group name -> sorted members, ordered by group name
    pub groups: Vec<(String, Vec<String>)>,
    /// Header subtree the revision was read from
    pub prefix: String,
    /// `(example source, rendered path)` pairs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<(String, String)>>,
}

impl Snapshot {
    pub fn new(prefix: impl Into<String>) -> Self {
        Snapshot {
            prefix: prefix.into(),
            ..Default::default()
        }
    }
}

// -- Cross-revision state -----------------------------------------------------

/// Signature history of one function across processed revisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignatureRecord {
    /// Revisions the function was observed in, in processing order
    pub exists: Vec<String>,
    /// Revisions whose signature differed from the previous observation
    #[serde(serialize_with = "as_flags")]
    pub changes: BTreeSet<String>,
}

/// Function name -> group name.
pub type GroupRegistry = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectManifest {
    /// Revisions, newest first
    pub versions: Vec<String>,
    pub github: Option<String>,
    pub name: Option<String>,
    pub signatures: BTreeMap<String, SignatureRecord>,
    pub groups: GroupRegistry,
}

/// Emit a map as an ordered list of `[key, value]` pairs.
fn as_pairs<S, V>(map: &BTreeMap<String, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    serializer.collect_seq(map.iter())
}

/// Emit a set as `{ item: true, ... }`.
fn as_flags<S>(set: &BTreeSet<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(set.len()))?;
    for item in set {
        map.serialize_entry(item, &true)?;
    }
    map.end()
}
