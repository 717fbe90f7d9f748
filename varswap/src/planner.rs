//! Global replace planning
//!
//! Picks every occurrence that belongs to one summary group so the caller can
//! queue a raw replace on each. Nothing is written here.

use crate::error::PlanError;
use crate::metadata::OccurrenceMetadata;
use crate::occurrence::{Category, Occurrence};
use crate::script::Script;
use crate::summary::SummaryKey;

/// Indices of the occurrences in group `key`, validated against the target id
pub fn plan_global_replace(
    script: &Script,
    occurrences: &[Occurrence],
    metadata: &[OccurrenceMetadata],
    key: &SummaryKey,
    target: i32,
) -> Result<Vec<usize>, PlanError> {
    if !key.category.has_numeric_id() {
        return Err(PlanError::UnsupportedCategory(key.category));
    }
    if target == key.var_id {
        return Err(PlanError::UnchangedTarget);
    }

    let matches: Vec<usize> = occurrences
        .iter()
        .zip(metadata)
        .enumerate()
        .filter(|(_, (occ, meta))| {
            occ.category == key.category
                && occ.var_id(script) == key.var_id
                && (key.category != Category::Projectile || meta.is_global == key.is_global)
        })
        .map(|(i, _)| i)
        .collect();

    if matches.is_empty() {
        return Err(PlanError::NoMatches);
    }
    tracing::debug!(
        var = key.var_id,
        category = %key.category,
        global = key.is_global,
        target,
        matches = matches.len(),
        "planned global replace"
    );
    Ok(matches)
}
