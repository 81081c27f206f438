//! Version ordering for feed versions.
//!
//! Vendor versions are dotted numbers with a variable component count
//! ("10.1", "10.12.0", "9.3.5", "10.3.3.1"). The first three components are
//! compared as a semantic version; extra components break ties. Anything
//! non-numeric falls back to plain string order.

use std::cmp::Ordering;

use semver::Version;

fn components(version: &str) -> Option<Vec<u64>> {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// Parse the first three components as a semantic version.
pub fn parse_lenient(version: &str) -> Option<Version> {
    let parts = components(version)?;
    let at = |i: usize| parts.get(i).copied().unwrap_or(0);
    Some(Version::new(at(0), at(1), at(2)))
}

/// Compare two feed versions.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (components(a), components(b)) {
        (Some(pa), Some(pb)) => {
            let va = parse_lenient(a);
            let vb = parse_lenient(b);
            va.cmp(&vb).then_with(|| {
                let tail_a = pa.get(3..).unwrap_or(&[]);
                let tail_b = pb.get(3..).unwrap_or(&[]);
                tail_a.cmp(tail_b)
            })
        }
        _ => a.cmp(b),
    }
}
