//! OPC part-name arithmetic.

/// Name of the relationships part that belongs to `part`.
pub(crate) fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the part that declares it.
///
/// Fragments are dropped, absolute targets are taken from the package root,
/// and `.`/`..` segments are folded.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    let target = target.split('#').next().unwrap_or_default();
    let joined = if target.is_empty() {
        source_part.to_string()
    } else if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else {
        let base = source_part.rsplit_once('/').map_or("", |(dir, _)| dir);
        format!("{base}/{target}")
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// `xl/worksheets/sheet3.xml` → `Some(3)`.
pub(crate) fn trailing_number(part: &str, prefix: &str, suffix: &str) -> Option<u32> {
    part.strip_prefix(prefix)?.strip_suffix(suffix)?.parse().ok()
}
