//! Version-skew helpers.
//!
//! Client and server are compatible as long as their `major.minor`
//! prefixes agree; patch-level drift is expected during rollouts.

/// Parses the `major.minor` prefix of a version string.
///
/// Returns `None` when not even a major number can be read. A bare
/// major (`"7"`) parses as minor 0.
pub fn major_minor(version: &str) -> Option<(u64, u64)> {
    let mut parts = version.trim().split('.');
    let major = parts.next()?.parse::<u64>().ok()?;
    let minor = parts
        .next()
        .and_then(|p| p.parse::<u64>().ok())
        .unwrap_or(0);
    Some((major, minor))
}

/// Returns true when both versions parse and share `major.minor`.
///
/// Unparseable input compares as equal: skew detection should stay
/// quiet rather than alarm on garbage version strings.
pub fn same_major_minor(a: &str, b: &str) -> bool {
    match (major_minor(a), major_minor(b)) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}
