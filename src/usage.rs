//! Type usage: which functions return or take each type.
//!
//! Matching is textual. A type counts as used when its name appears in the
//! return type (or the raw argument line) immediately followed by a space,
//! `;`, `)` or `*`. Names that occur inside longer identifiers or comments
//! can produce false positives.

use crate::model::{Snapshot, TypeUsage};
use regex::Regex;

/// Recompute `used` for every type in the snapshot.
pub fn resolve(snapshot: &mut Snapshot) -> Result<(), regex::Error> {
    for (name, ty) in snapshot.types.iter_mut() {
        let pattern = usage_pattern(name)?;
        let mut used = TypeUsage::default();
        // functions iterate in name order, so both lists come out sorted
        for (func_name, func) in &snapshot.functions {
            if pattern.is_match(&func.ret.ty) {
                used.returns.push(func_name.clone());
            }
            if pattern.is_match(&func.argline) {
                used.needs.push(func_name.clone());
            }
        }
        ty.used = used;
    }
    Ok(())
}

fn usage_pattern(type_name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("{}[ ;)*]", regex::escape(type_name)))
}
