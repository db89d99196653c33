//! Group assignment from function naming conventions.

use crate::model::{GroupRegistry, Snapshot};
use std::collections::BTreeMap;

/// Group for a function, or `None` when it is left ungrouped.
///
/// After stripping `prefix`, the text before the first `_` is the group.
/// Names without an underscore fall back to the header path with the `.h`
/// extension dropped and `/` replaced by `_`.
pub fn group_for(name: &str, prefix: Option<&str>, file: &str) -> Option<String> {
    let key = prefix
        .and_then(|p| name.strip_prefix(p))
        .unwrap_or(name);
    match key.split_once('_') {
        Some(("", _)) => None,
        Some((group, _)) => Some(group.to_string()),
        None if key.is_empty() => None,
        None => Some(file_group(file)),
    }
}

fn file_group(file: &str) -> String {
    file.strip_suffix(".h").unwrap_or(file).replace('/', "_")
}

/// Assign groups to every function of the snapshot.
///
/// Each function's `group` is set, `registry` gets one entry per grouped
/// function, and the snapshot's `groups` list is rebuilt sorted by group
/// name with sorted members.
pub fn assign(snapshot: &mut Snapshot, prefix: Option<&str>, registry: &mut GroupRegistry) {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, func) in snapshot.functions.iter_mut() {
        let Some(group) = group_for(name, prefix, &func.file) else {
            func.group = None;
            continue;
        };
        registry.insert(name.clone(), group.clone());
        groups.entry(group.clone()).or_default().push(name.clone());
        func.group = Some(group);
    }
    for members in groups.values_mut() {
        members.sort();
    }
    snapshot.groups = groups.into_iter().collect();
}
