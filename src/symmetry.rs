use log::debug;

use crate::connectivity::EncodeError;
use crate::model::Model;
use crate::order::RootHandles;

/// Order interchangeable regions by the position of their roots.
///
/// For consecutive regions `j` and `j + 1` this forces `index(root_j) < index(root_{j + 1})`.
/// Exactly one root bit is set per region, so this is the comparison of `sum(i * root_j[i])` across regions, stated per position:
/// if region `j + 1` is rooted at `i`, region `j` already had an active node before `i`.
///
/// Regions carved from the same board are otherwise interchangeable and every valid partition would be found once per relabeling.
/// The orderings only prune those duplicates; which partitions exist up to relabeling is unchanged.
pub fn order_roots(model: &mut Model, regions: &[&RootHandles]) -> Result<(), EncodeError> {
    let Some(first) = regions.first() else {
        return Ok(());
    };

    let expected = first.roots.len();
    if let Some(region) = regions.iter().find(|region| region.roots.len() != expected) {
        return Err(EncodeError::RegionLengthMismatch { expected, found: region.roots.len() });
    }

    for pair in regions.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        for (root, none_before) in upper.roots.iter().zip(&lower.none_active_before) {
            model.add_clause(&[root.negative(), none_before.negative()]);
        }
    }

    debug!("ordered the roots of {} regions over {} nodes", regions.len(), expected);
    Ok(())
}
