use std::cmp::Ordering;

/// Parses the `x.y.z` core of a version string, ignoring any pre-release or
/// build suffix. Missing or non-numeric parts count as zero.
pub fn parse_core(version: &str) -> [u64; 3] {
    let base = version.trim().trim_start_matches('v');
    let base = base.split(['-', '+']).next().unwrap_or(base);
    let mut parts = [0u64; 3];
    for (slot, part) in parts.iter_mut().zip(base.split('.')) {
        *slot = part.parse::<u64>().unwrap_or(0);
    }
    parts
}

pub fn compare(a: &str, b: &str) -> Ordering {
    parse_core(a).cmp(&parse_core(b))
}

/// True when `host` lies within `[min, max]`. An empty `min` means no lower
/// bound.
pub fn within_bounds(host: &str, min: &str, max: Option<&str>) -> bool {
    if !min.trim().is_empty() && compare(host, min) == Ordering::Less {
        return false;
    }
    match max {
        Some(max) if !max.trim().is_empty() => compare(host, max) != Ordering::Greater,
        _ => true,
    }
}
