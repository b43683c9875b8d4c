use std::cmp::Ordering;

/// Minimum number of segments the current version is padded to
const PADDED_SEGMENTS: usize = 3;

/// Extracts the leading run of purely numeric dot-separated segments.
///
/// Extraction stops at the first segment that is not a plain number or does
/// not fit in an `i32`, so `"2.0.0-SNAPSHOT"` yields `[2, 0]` and
/// `"31.0-jre"` yields `[31]`.
pub fn numeric_segments(version: &str) -> Vec<i32> {
    version
        .split('.')
        .map_while(|segment| {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            segment.parse::<i32>().ok()
        })
        .collect()
}

/// Returns true if `candidate` is strictly newer than `current`
///
/// The current version is padded with zeros to three segments ("1.2" is read
/// as "1.2.0"), then segments are compared up to the shorter list. Versions
/// that only differ past that length, or in non-numeric suffixes, are not
/// considered newer.
pub fn is_newer(current: &str, candidate: &str) -> bool {
    let mut current = numeric_segments(current);
    if current.len() < PADDED_SEGMENTS {
        current.resize(PADDED_SEGMENTS, 0);
    }
    let candidate = numeric_segments(candidate);

    current
        .iter()
        .zip(candidate.iter())
        .find(|(c, n)| c != n)
        .is_some_and(|(c, n)| n > c)
}

/// Total order over versions by their numeric segments, missing segments read as zero
///
/// Used to pick the highest version out of a repository listing.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = numeric_segments(a);
    let b = numeric_segments(b);
    let len = a.len().max(b.len());

    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}
