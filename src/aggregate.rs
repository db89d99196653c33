//! Folds parser records for one header into the revision's snapshot.

use crate::model::*;
use regex::Regex;
use std::sync::LazyLock;

/// Human-readable kind for function-pointer typedefs.
pub const FNPTR_KIND: &str = "function pointer";

// `= <expr>` right after an enumerator, up to `,` or `}`
static RE_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*=\s*([^,}]+)").unwrap());

/// Fold the records of header `path` into `snapshot`.
///
/// Exactly one [`FileMeta`] is appended for the header, even when it
/// produced no records.
pub fn aggregate<I>(snapshot: &mut Snapshot, path: &str, records: I)
where
    I: IntoIterator<Item = Record>,
{
    let mut meta = FileMeta {
        file: path.to_string(),
        ..Default::default()
    };

    for record in records {
        meta.lines = meta.lines.max(record.location().lineto);

        match record {
            Record::Function(rec) => {
                meta.functions.push(rec.name.clone());
                upsert_function(snapshot, rec);
            }
            Record::Define(rec) | Record::Macro(rec) => {
                let global = snapshot.globals.entry(rec.decl).or_default();
                global.value = rec.value;
                global.file = rec.loc.file;
                global.line = rec.loc.line;
                global.comments = rec.comments;
            }
            Record::File(rec) => {
                if rec.brief.is_some() {
                    meta.meta.brief = rec.brief;
                }
                if rec.defgroup.is_some() {
                    meta.meta.defgroup = rec.defgroup;
                }
                if rec.ingroup.is_some() {
                    meta.meta.ingroup = rec.ingroup;
                }
                if rec.comments.is_some() {
                    meta.meta.comments = rec.comments;
                }
            }
            Record::Enum(rec) => match rec.name.clone() {
                Some(name) => {
                    let ty = snapshot.types.entry(name).or_default();
                    ty.kind = "enum".into();
                    copy_type_fields(ty, &rec.loc, rec.block, rec.tdef, rec.comments);
                }
                None => explode_enum(snapshot, &rec),
            },
            Record::Struct(rec) => upsert_type(snapshot, rec, "struct"),
            Record::FnPtr(rec) => upsert_type(snapshot, rec, FNPTR_KIND),
            Record::Other(_) => {}
        }
    }

    snapshot.files.push(meta);
}

fn upsert_function(snapshot: &mut Snapshot, rec: FunctionRecord) {
    let func = snapshot.functions.entry(rec.name).or_default();
    func.file = rec.loc.file;
    func.line = rec.loc.line;
    func.lineto = rec.loc.lineto;
    func.args = rec.args;
    func.argline = rec.argline;
    func.sig = rec.sig;
    func.ret = rec.ret;
    func.description = rec.description;
    func.comments = rec.comments;
}

fn upsert_type(snapshot: &mut Snapshot, rec: TypeRecord, kind: &str) {
    let value = rec.value.unwrap_or_else(|| rec.name.clone());
    let ty = snapshot.types.entry(rec.name).or_default();
    ty.kind = kind.to_string();
    ty.value = Some(value);
    copy_type_fields(ty, &rec.loc, rec.block, rec.tdef, rec.comments);
}

fn copy_type_fields(
    ty: &mut Type,
    loc: &Location,
    block: String,
    tdef: Option<String>,
    comments: String,
) {
    ty.file = loc.file.clone();
    ty.line = loc.line;
    ty.lineto = loc.lineto;
    ty.block = block;
    if tdef.is_some() {
        ty.tdef = tdef;
    }
    ty.comments = comments;
}

/// Turn each enumerator of an anonymous enum into a global.
///
/// The line is the enum's start line plus the newlines before the
/// identifier's first occurrence in the body; the value is the assigned
/// expression, if any. A global already known under the same name is kept.
fn explode_enum(snapshot: &mut Snapshot, rec: &EnumRecord) {
    for name in &rec.decl {
        let mut global = Global {
            value: String::new(),
            file: rec.loc.file.clone(),
            line: rec.loc.line,
            comments: rec.comments.clone(),
        };
        if let Some(idx) = rec.body.find(name.as_str()) {
            global.line += rec.body[..idx].matches('\n').count();
            if let Some(caps) = RE_ASSIGNMENT.captures(&rec.body[idx + name.len()..]) {
                global.value = caps[1].trim_end().to_string();
            }
        }
        snapshot.globals.entry(name.clone()).or_insert(global);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(file: &str, line: usize, lineto: usize) -> Location {
        Location {
            file: file.into(),
            line,
            lineto,
        }
    }

    fn function(name: &str, file: &str, line: usize, lineto: usize) -> Record {
        Record::Function(FunctionRecord {
            name: name.into(),
            loc: loc(file, line, lineto),
            sig: "int".into(),
            ..Default::default()
        })
    }

    #[test]
    fn functions_are_keyed_and_listed_per_file() {
        let mut snap = Snapshot::new("include");
        aggregate(
            &mut snap,
            "a.h",
            vec![function("lib_a", "a.h", 3, 4), function("lib_b", "a.h", 9, 12)],
        );
        assert_eq!(snap.files.len(), 1);
        assert_eq!(snap.files[0].functions, ["lib_a", "lib_b"]);
        assert_eq!(snap.files[0].lines, 12);
        assert_eq!(snap.functions["lib_b"].line, 9);
        assert_eq!(snap.functions["lib_b"].sig, "int");
    }

    #[test]
    fn empty_header_still_gets_file_entry() {
        let mut snap = Snapshot::default();
        aggregate(&mut snap, "empty.h", Vec::new());
        aggregate(&mut snap, "other.h", vec![function("lib_x", "other.h", 1, 1)]);
        assert_eq!(snap.files.len(), 2);
        assert_eq!(snap.files[0].file, "empty.h");
        assert_eq!(snap.files[0].lines, 0);
    }

    #[test]
    fn later_record_overwrites_function() {
        let mut snap = Snapshot::default();
        aggregate(&mut snap, "a.h", vec![function("lib_a", "a.h", 1, 1)]);
        aggregate(&mut snap, "b.h", vec![function("lib_a", "b.h", 7, 7)]);
        assert_eq!(snap.functions.len(), 1);
        assert_eq!(snap.functions["lib_a"].file, "b.h");
    }

    #[test]
    fn defines_become_globals() {
        let mut snap = Snapshot::default();
        let rec = DefineRecord {
            decl: "LIB_OID_RAWSZ".into(),
            value: "20".into(),
            loc: loc("oid.h", 5, 5),
            comments: "size".into(),
        };
        aggregate(&mut snap, "oid.h", vec![Record::Define(rec)]);
        let global = &snap.globals["LIB_OID_RAWSZ"];
        assert_eq!(global.value, "20");
        assert_eq!(global.line, 5);
    }

    #[test]
    fn file_record_merges_meta() {
        let mut snap = Snapshot::default();
        let rec = FileRecord {
            loc: loc("repo.h", 1, 6),
            brief: Some("Repository routines".into()),
            ingroup: Some("Lib".into()),
            ..Default::default()
        };
        aggregate(&mut snap, "repo.h", vec![Record::File(rec)]);
        let meta = &snap.files[0].meta;
        assert_eq!(meta.brief.as_deref(), Some("Repository routines"));
        assert_eq!(meta.ingroup.as_deref(), Some("Lib"));
        assert_eq!(meta.defgroup, None);
        assert_eq!(snap.files[0].lines, 6);
    }

    #[test]
    fn anonymous_enum_explodes_with_line_offsets() {
        let body = "\n\tLIB_OK = 0,\n\tLIB_ERROR = -1,\n\n\tLIB_ENOTFOUND\n";
        let rec = EnumRecord {
            name: None,
            decl: vec!["LIB_OK".into(), "LIB_ERROR".into(), "LIB_ENOTFOUND".into()],
            loc: loc("errors.h", 20, 26),
            block: format!("enum {{{body}}};"),
            body: body.into(),
            tdef: None,
            comments: "codes".into(),
        };
        let mut snap = Snapshot::default();
        aggregate(&mut snap, "errors.h", vec![Record::Enum(rec)]);

        assert_eq!(snap.globals.len(), 3);
        assert!(snap.types.is_empty());
        assert_eq!(snap.globals["LIB_OK"].line, 21);
        assert_eq!(snap.globals["LIB_OK"].value, "0");
        assert_eq!(snap.globals["LIB_ERROR"].line, 22);
        assert_eq!(snap.globals["LIB_ERROR"].value, "-1");
        assert_eq!(snap.globals["LIB_ENOTFOUND"].line, 24);
        assert_eq!(snap.globals["LIB_ENOTFOUND"].value, "");
        assert_eq!(snap.globals["LIB_ENOTFOUND"].comments, "codes");
    }

    #[test]
    fn enum_value_must_follow_identifier() {
        // B has no assignment of its own; C's must not leak into it
        let body = " A = 1, B, C = 3 ";
        let rec = EnumRecord {
            decl: vec!["A".into(), "B".into(), "C".into()],
            loc: loc("e.h", 1, 1),
            body: body.into(),
            ..Default::default()
        };
        let mut snap = Snapshot::default();
        aggregate(&mut snap, "e.h", vec![Record::Enum(rec)]);
        assert_eq!(snap.globals["A"].value, "1");
        assert_eq!(snap.globals["B"].value, "");
        assert_eq!(snap.globals["C"].value, "3");
    }

    #[test]
    fn existing_global_wins_over_enumerator() {
        let mut snap = Snapshot::default();
        let define = DefineRecord {
            decl: "LIB_OK".into(),
            value: "0".into(),
            loc: loc("errors.h", 3, 3),
            comments: "success".into(),
        };
        let rec = EnumRecord {
            decl: vec!["LIB_OK".into(), "LIB_ERROR".into()],
            loc: loc("errors.h", 10, 13),
            body: "\n\tLIB_OK = 1,\n\tLIB_ERROR = -1\n".into(),
            ..Default::default()
        };
        aggregate(&mut snap, "errors.h", vec![Record::Define(define), Record::Enum(rec)]);

        let kept = &snap.globals["LIB_OK"];
        assert_eq!(kept.value, "0");
        assert_eq!(kept.line, 3);
        assert_eq!(kept.comments, "success");
        assert_eq!(snap.globals["LIB_ERROR"].line, 12);
    }

    #[test]
    fn parsed_enum_with_directives_gets_declared_lines() {
        let src = "enum {\n\tA = 0,\n#ifdef X\n\tB = 1,\n#endif\n\tC = 2\n};\n";
        let mut snap = Snapshot::default();
        aggregate(&mut snap, "a.h", crate::parser::c::parse("a.h", src));
        assert_eq!(snap.globals["A"].line, 2);
        assert_eq!(snap.globals["B"].line, 4);
        assert_eq!(snap.globals["C"].line, 6);
        assert_eq!(snap.globals["C"].value, "2");
    }

    #[test]
    fn named_enum_struct_and_fnptr_become_types() {
        let mut snap = Snapshot::default();
        let records = vec![
            Record::Enum(EnumRecord {
                name: Some("lib_otype".into()),
                decl: vec!["LIB_OBJ_ANY".into()],
                loc: loc("types.h", 1, 3),
                block: "typedef enum {...} lib_otype;".into(),
                tdef: Some("typedef".into()),
                ..Default::default()
            }),
            Record::Struct(TypeRecord {
                name: "lib_buf".into(),
                loc: loc("types.h", 5, 8),
                ..Default::default()
            }),
            Record::FnPtr(TypeRecord {
                name: "lib_cb".into(),
                value: Some("int (*)(void)".into()),
                loc: loc("types.h", 10, 10),
                ..Default::default()
            }),
            Record::Other(OtherRecord {
                kind: "typedef".into(),
                loc: loc("types.h", 12, 12),
            }),
        ];
        aggregate(&mut snap, "types.h", records);

        assert_eq!(snap.types.len(), 3);
        assert!(snap.globals.is_empty());
        assert_eq!(snap.types["lib_otype"].kind, "enum");
        assert_eq!(snap.types["lib_otype"].tdef.as_deref(), Some("typedef"));
        assert_eq!(snap.types["lib_buf"].kind, "struct");
        assert_eq!(snap.types["lib_buf"].value.as_deref(), Some("lib_buf"));
        assert_eq!(snap.types["lib_cb"].kind, FNPTR_KIND);
        assert_eq!(snap.types["lib_cb"].value.as_deref(), Some("int (*)(void)"));
        // ignored kinds still count toward the file's extent
        assert_eq!(snap.files[0].lines, 12);
    }
}
