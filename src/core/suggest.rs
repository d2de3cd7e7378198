//! Relationship suggestions from foreign-key-like column names
//!
//! A `<stem>_id` column is suggested as many-to-one towards the primary key of a
//! selected table named `<stem>`, `<stem>s` or `<stem>es`.

use crate::core::normalizer::is_duplicate;
use crate::core::relationship::{Relationship, RelationshipType};
use crate::core::schema::Schema;

fn candidate_tables(stem: &str) -> [String; 3] {
    [stem.to_string(), format!("{stem}s"), format!("{stem}es")]
}

/// Suggested relationships not already present in `existing` (in either direction)
pub fn suggest_relationships(
    schema: &Schema,
    selected_tables: &[String],
    existing: &[Relationship],
) -> Vec<Relationship> {
    let mut suggestions: Vec<Relationship> = Vec::new();

    for table in selected_tables {
        let Some(table_schema) = schema.table(table) else {
            continue;
        };

        for column in &table_schema.columns {
            if column.is_primary_key || !column.looks_like_foreign_key() {
                continue;
            }
            let lower = column.name.to_ascii_lowercase();
            let Some(stem) = lower.strip_suffix("_id") else {
                continue;
            };

            let target = candidate_tables(stem).into_iter().find_map(|candidate| {
                selected_tables
                    .iter()
                    .filter(|t| *t != table)
                    .find(|t| t.to_ascii_lowercase() == candidate)
            });
            let Some(target) = target else {
                continue;
            };
            let Some(pk) = schema.table(target).and_then(|t| t.primary_key()) else {
                continue;
            };

            let rel = Relationship::new(
                table.clone(),
                column.name.clone(),
                target.clone(),
                pk.name.clone(),
                RelationshipType::ManyToOne,
            );
            if is_duplicate(existing, &rel) || is_duplicate(&suggestions, &rel) {
                continue;
            }
            suggestions.push(rel);
        }
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::create_demo_schema;

    fn tables(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_suggests_plural_targets() {
        let schema = create_demo_schema();
        let suggestions =
            suggest_relationships(&schema, &tables(&["users", "posts", "comments"]), &[]);
        let keys: Vec<String> = suggestions.iter().map(|r| r.forward_key()).collect();
        assert_eq!(
            keys,
            vec![
                "posts.user_id=>users.id",
                "comments.post_id=>posts.id",
                "comments.user_id=>users.id",
            ]
        );
        assert!(suggestions
            .iter()
            .all(|r| r.relationship_type == RelationshipType::ManyToOne));
    }

    #[test]
    fn test_skips_existing_and_unselected() {
        let schema = create_demo_schema();
        let existing = vec![Relationship::new(
            "users",
            "id",
            "posts",
            "user_id",
            RelationshipType::OneToMany,
        )];
        let suggestions = suggest_relationships(&schema, &tables(&["users", "posts"]), &existing);
        assert!(suggestions.is_empty());
    }
}
