//! Shared-storage detection for the save path.
//!
//! Two logical tensors whose byte ranges overlap in memory are dependent:
//! writing them out would duplicate the aliased bytes on disk and the copies
//! would reload as independent tensors. The guard partitions the input views
//! into equivalence classes by overlapping address range and reports any
//! class holding more than one name, before a single byte is written.
//!
//! The check looks only at storage identity (base address plus length),
//! never at dtypes or shapes. Zero-length views occupy no bytes and cannot
//! alias anything.

use std::borrow::Cow;

/// Returns every group of two or more tensor names whose backing byte
/// ranges overlap. An empty result means the save may proceed.
///
/// Ranges are swept in address order; transitively overlapping ranges land
/// in the same group (a covers b, b covers c puts all three together).
/// Names within a group are sorted for stable reporting.
pub(crate) fn shared_groups(entries: &[(&str, Cow<'_, [u8]>)]) -> Vec<Vec<String>> {
    let mut spans: Vec<(usize, usize, &str)> = entries
        .iter()
        .filter(|(_, data)| !data.is_empty())
        .map(|(name, data)| {
            let start = data.as_ptr() as usize;
            (start, start + data.len(), *name)
        })
        .collect();
    spans.sort_unstable();

    let mut groups: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_end = 0usize;

    for (start, end, name) in spans {
        if !current.is_empty() && start < current_end {
            current.push(name);
            current_end = current_end.max(end);
        } else {
            flush(&mut groups, &mut current);
            current.push(name);
            current_end = end;
        }
    }
    flush(&mut groups, &mut current);
    groups
}

fn flush(groups: &mut Vec<Vec<String>>, current: &mut Vec<&str>) {
    if current.len() > 1 {
        let mut names: Vec<String> = current.iter().map(|n| n.to_string()).collect();
        names.sort_unstable();
        groups.push(names);
    }
    current.clear();
}
