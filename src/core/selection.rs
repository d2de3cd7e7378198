//! Column selection tracker
//!
//! Keeps, per table, the set of columns included in the exported configuration.
//! Forced status is derived from the schema and the current relationships on every
//! call and is never stored, so deleting a relationship immediately releases the
//! columns it was forcing (they stay selected, but can be unchecked again).

use crate::core::relationship::Relationship;
use crate::core::schema::Schema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Table name -> selected column names
pub type SelectedColumns = BTreeMap<String, BTreeSet<String>>;

/// Why a column cannot be excluded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedBy {
    PrimaryKey,
    ForeignKey,
    Relationship,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSelection {
    columns: SelectedColumns,
}

impl ColumnSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(columns: SelectedColumns) -> Self {
        Self { columns }
    }

    pub fn as_map(&self) -> &SelectedColumns {
        &self.columns
    }

    pub fn into_map(self) -> SelectedColumns {
        self.columns
    }

    pub fn is_selected(&self, table: &str, column: &str) -> bool {
        self.columns
            .get(table)
            .is_some_and(|cols| cols.contains(column))
    }

    pub fn columns_for(&self, table: &str) -> impl Iterator<Item = &str> {
        self.columns
            .get(table)
            .into_iter()
            .flat_map(|cols| cols.iter().map(String::as_str))
    }

    /// Reason a column is forced, key status taking precedence over relationships
    pub fn forced_reason(
        schema: &Schema,
        relationships: &[Relationship],
        table: &str,
        column: &str,
    ) -> Option<ForcedBy> {
        if let Some(col) = schema.column(table, column) {
            if col.is_primary_key {
                return Some(ForcedBy::PrimaryKey);
            }
            if col.looks_like_foreign_key() {
                return Some(ForcedBy::ForeignKey);
            }
        }
        relationships
            .iter()
            .any(|rel| rel.references(table, column))
            .then_some(ForcedBy::Relationship)
    }

    pub fn is_forced(
        schema: &Schema,
        relationships: &[Relationship],
        table: &str,
        column: &str,
    ) -> bool {
        Self::forced_reason(schema, relationships, table, column).is_some()
    }

    /// Include or exclude one column. Excluding a forced column is ignored.
    /// Returns whether the selection changed.
    pub fn toggle_column(
        &mut self,
        schema: &Schema,
        relationships: &[Relationship],
        table: &str,
        column: &str,
        included: bool,
    ) -> bool {
        if schema.column(table, column).is_none() {
            tracing::debug!("Ignoring toggle of unknown column {}.{}", table, column);
            return false;
        }
        if included {
            return self.insert(table, column);
        }
        if let Some(reason) = Self::forced_reason(schema, relationships, table, column) {
            tracing::debug!(
                "Ignoring uncheck of forced column {}.{} ({:?})",
                table,
                column,
                reason
            );
            return false;
        }
        self.remove(table, column)
    }

    /// Include every column of the table
    pub fn select_all(&mut self, schema: &Schema, table: &str) -> bool {
        let Some(table_schema) = schema.table(table) else {
            return false;
        };
        let mut changed = false;
        for column in &table_schema.columns {
            changed |= self.insert(table, &column.name);
        }
        changed
    }

    /// Exclude every non-forced column of the table
    pub fn deselect_all(
        &mut self,
        schema: &Schema,
        relationships: &[Relationship],
        table: &str,
    ) -> bool {
        let Some(table_schema) = schema.table(table) else {
            return false;
        };
        let mut changed = false;
        for column in &table_schema.columns {
            if !Self::is_forced(schema, relationships, table, &column.name) {
                changed |= self.remove(table, &column.name);
            }
        }
        changed
    }

    /// Re-establish the forced-inclusion invariant for every selected table:
    /// key columns and relationship endpoints are added where missing.
    pub fn enforce(
        &mut self,
        schema: &Schema,
        selected_tables: &[String],
        relationships: &[Relationship],
    ) -> bool {
        let mut changed = false;

        for table in selected_tables {
            let Some(table_schema) = schema.table(table) else {
                continue;
            };
            for column in table_schema.columns.iter().filter(|c| c.is_key()) {
                changed |= self.insert(table, &column.name);
            }
        }

        for rel in relationships {
            changed |= self.include_endpoint(schema, &rel.source_table, &rel.source_column);
            changed |= self.include_endpoint(schema, &rel.target_table, &rel.target_column);
        }

        changed
    }

    /// Drop entries for tables that are no longer selected
    pub fn retain_tables(&mut self, selected_tables: &[String]) -> bool {
        let before = self.columns.len();
        self.columns
            .retain(|table, _| selected_tables.iter().any(|t| t == table));
        before != self.columns.len()
    }

    fn include_endpoint(&mut self, schema: &Schema, table: &str, column: &str) -> bool {
        if schema.column(table, column).is_none() {
            return false;
        }
        let added = self.insert(table, column);
        if added {
            tracing::debug!("Auto-selected {}.{} referenced by a relationship", table, column);
        }
        added
    }

    fn insert(&mut self, table: &str, column: &str) -> bool {
        self.columns
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string())
    }

    fn remove(&mut self, table: &str, column: &str) -> bool {
        self.columns
            .get_mut(table)
            .is_some_and(|cols| cols.remove(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::relationship::RelationshipType;
    use crate::core::schema::{Column, TableSchema};

    fn schema() -> Schema {
        Schema::new()
            .with_table(
                "A",
                TableSchema::new()
                    .add_column(Column::new("id", "INT").primary_key())
                    .add_column(Column::new("name", "TEXT"))
                    .add_column(Column::new("code", "TEXT")),
            )
            .with_table(
                "B",
                TableSchema::new()
                    .add_column(Column::new("id", "INT").primary_key())
                    .add_column(Column::new("a_id", "INT"))
                    .add_column(Column::new("label", "TEXT")),
            )
    }

    fn tables() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    #[test]
    fn test_primary_key_cannot_be_unchecked() {
        let schema = schema();
        let mut selection = ColumnSelection::new();
        selection.enforce(&schema, &tables(), &[]);
        assert!(selection.is_selected("A", "id"));

        let changed = selection.toggle_column(&schema, &[], "A", "id", false);
        assert!(!changed);
        assert!(selection.is_selected("A", "id"));
    }

    #[test]
    fn test_forced_reasons() {
        let schema = schema();
        let rels = vec![Relationship::new("A", "code", "B", "label", RelationshipType::OneToOne)];
        assert_eq!(
            ColumnSelection::forced_reason(&schema, &rels, "A", "id"),
            Some(ForcedBy::PrimaryKey)
        );
        assert_eq!(
            ColumnSelection::forced_reason(&schema, &rels, "B", "a_id"),
            Some(ForcedBy::ForeignKey)
        );
        assert_eq!(
            ColumnSelection::forced_reason(&schema, &rels, "B", "label"),
            Some(ForcedBy::Relationship)
        );
        assert_eq!(ColumnSelection::forced_reason(&schema, &rels, "A", "name"), None);
    }

    #[test]
    fn test_toggle_regular_column() {
        let schema = schema();
        let mut selection = ColumnSelection::new();
        assert!(selection.toggle_column(&schema, &[], "A", "name", true));
        assert!(selection.is_selected("A", "name"));
        assert!(!selection.toggle_column(&schema, &[], "A", "name", true));
        assert!(selection.toggle_column(&schema, &[], "A", "name", false));
        assert!(!selection.is_selected("A", "name"));
        assert!(!selection.toggle_column(&schema, &[], "A", "nope", true));
    }

    #[test]
    fn test_cascade_on_relationship() {
        let schema = schema();
        let mut selection = ColumnSelection::new();
        let rels = vec![Relationship::new("A", "code", "B", "label", RelationshipType::OneToOne)];
        assert!(selection.enforce(&schema, &tables(), &rels));
        assert!(selection.is_selected("A", "code"));
        assert!(selection.is_selected("B", "label"));
        assert!(!selection.enforce(&schema, &tables(), &rels));
    }

    #[test]
    fn test_deselect_all_keeps_forced() {
        let schema = schema();
        let rels = vec![Relationship::new("A", "code", "B", "label", RelationshipType::OneToOne)];
        let mut selection = ColumnSelection::new();
        selection.select_all(&schema, "A");
        assert_eq!(selection.columns_for("A").count(), 3);

        selection.deselect_all(&schema, &rels, "A");
        let remaining: Vec<&str> = selection.columns_for("A").collect();
        assert_eq!(remaining, vec!["code", "id"]);
    }

    #[test]
    fn test_released_after_relationship_removed() {
        let schema = schema();
        let rels = vec![Relationship::new("A", "code", "B", "label", RelationshipType::OneToOne)];
        let mut selection = ColumnSelection::new();
        selection.enforce(&schema, &tables(), &rels);

        // still selected, no longer forced
        assert!(selection.is_selected("A", "code"));
        assert!(!ColumnSelection::is_forced(&schema, &[], "A", "code"));
        assert!(selection.toggle_column(&schema, &[], "A", "code", false));
    }

    #[test]
    fn test_retain_tables() {
        let schema = schema();
        let mut selection = ColumnSelection::new();
        selection.enforce(&schema, &tables(), &[]);
        assert!(selection.retain_tables(&["A".to_string()]));
        assert!(selection.as_map().contains_key("A"));
        assert!(!selection.as_map().contains_key("B"));
    }
}
