//! Duplicate detection
//!
//! Artifacts whose whitespace-normalized, lower-cased content is identical
//! form a group. Within a group the most relevant artifact (oldest on ties)
//! is the survivor; every other member is redundant.

use crate::memory::Artifact;
use std::collections::HashMap;

/// A set of artifacts sharing the same normalized content
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub survivor: Artifact,
    pub redundant: Vec<Artifact>,
}

/// Group artifacts by normalized content, returning only groups with ≥2 members.
///
/// Groups are ordered by the survivor's creation time so the output is stable
/// regardless of the input order.
pub fn find_duplicates(artifacts: &[Artifact]) -> Vec<DuplicateGroup> {
    let mut groups: HashMap<String, Vec<&Artifact>> = HashMap::new();
    for artifact in artifacts {
        groups
            .entry(artifact.normalized_content())
            .or_default()
            .push(artifact);
    }

    let mut result: Vec<DuplicateGroup> = groups
        .into_values()
        .filter(|group| group.len() >= 2)
        .filter_map(|mut group| {
            group.sort_by(|a, b| {
                b.sort_relevance()
                    .total_cmp(&a.sort_relevance())
                    .then_with(|| a.created_at.cmp(&b.created_at))
                    .then_with(|| a.id.cmp(&b.id))
            });
            let (survivor, rest) = group.split_first()?;
            Some(DuplicateGroup {
                survivor: (*survivor).clone(),
                redundant: rest.iter().map(|a| (*a).clone()).collect(),
            })
        })
        .collect();

    result.sort_by(|a, b| {
        a.survivor
            .created_at
            .cmp(&b.survivor.created_at)
            .then_with(|| a.survivor.id.cmp(&b.survivor.id))
    });
    result
}

/// Every redundant artifact across all duplicate groups
pub fn redundant_artifacts(artifacts: &[Artifact]) -> Vec<Artifact> {
    find_duplicates(artifacts)
        .into_iter()
        .flat_map(|group| group.redundant)
        .collect()
}
