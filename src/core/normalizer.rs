//! Relationship normalization
//!
//! Converts incoming records to the canonical shape, drops relationships whose
//! tables are not selected and removes duplicates in either direction.
//! The first occurrence of a column pair wins.

use crate::core::relationship::{RawRelationship, Relationship};
use std::collections::HashSet;

/// Normalize relationship records of either shape against the selected tables
pub fn normalize<I, R>(relationships: I, selected_tables: &[String]) -> Vec<Relationship>
where
    I: IntoIterator<Item = R>,
    R: Into<RawRelationship>,
{
    let selected: HashSet<&str> = selected_tables.iter().map(String::as_str).collect();
    let mut result: Vec<Relationship> = Vec::new();

    for raw in relationships {
        let raw: RawRelationship = raw.into();
        let rel = raw.into_canonical();

        if !selected.contains(rel.source_table.as_str())
            || !selected.contains(rel.target_table.as_str())
        {
            tracing::warn!(
                "Dropping relationship {} : table not selected",
                rel.forward_key()
            );
            continue;
        }

        if is_duplicate(&result, &rel) {
            tracing::debug!("Dropping duplicate relationship {}", rel.forward_key());
            continue;
        }
        result.push(rel);
    }

    result
}

/// Whether `candidate` links the same columns as any of `existing`
pub fn is_duplicate(existing: &[Relationship], candidate: &Relationship) -> bool {
    existing.iter().any(|rel| rel.links_same_columns(candidate))
}
