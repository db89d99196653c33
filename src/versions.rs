//! Revision enumeration: version-aware tag ordering.
//!
//! Tags are split into runs of digits and runs of everything else. Digit
//! runs compare numerically, other runs compare lexically, and a tag that
//! is a prefix of another sorts first. The current-state marker is always
//! appended after the sorted tags.

use std::cmp::Ordering;

/// Name of the synthetic revision for the current, untagged state.
pub const CURRENT: &str = "HEAD";

#[derive(Debug, PartialEq, Eq)]
enum Run<'a> {
    Num(&'a str),
    Text(&'a str),
}

/// Order tags ascending by version and append [`CURRENT`].
pub fn revisions<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut versions: Vec<String> = tags.into_iter().map(Into::into).collect();
    sort_versions(&mut versions);
    versions.push(CURRENT.to_string());
    versions
}

/// Stable, version-aware ascending sort.
pub fn sort_versions(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_versions(a, b));
}

pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = runs(a);
    let right = runs(b);
    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (l, r) {
            (Run::Num(x), Run::Num(y)) => compare_numeric(x, y),
            (Run::Text(x), Run::Text(y)) => x.cmp(y),
            // "1.0-rc1" before "1.0.1": text separators sort ahead of numbers
            (Run::Text(_), Run::Num(_)) => Ordering::Less,
            (Run::Num(_), Run::Text(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    left.len().cmp(&right.len())
}

/// Compare digit strings by value without parsing, so long runs cannot overflow.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn runs(s: &str) -> Vec<Run<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != digit => {
                out.push(make_run(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if let Some(digit) = in_digits {
        out.push(make_run(&s[start..], digit));
    }
    out
}

fn make_run(text: &str, digit: bool) -> Run<'_> {
    if digit {
        Run::Num(text)
    } else {
        Run::Text(text)
    }
}
