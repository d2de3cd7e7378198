use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator between a table name and a column name in handles and edge IDs
pub const HANDLE_SEPARATOR: &str = "__";

/// Column of a connected database table
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_primary_key: false,
            is_foreign_key: false,
            nullable: true,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    pub fn foreign_key(mut self) -> Self {
        self.is_foreign_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Explicit foreign key flag, or a `<name>_id` column other than `id` itself
    pub fn looks_like_foreign_key(&self) -> bool {
        if self.is_foreign_key {
            return true;
        }
        let lower = self.name.to_ascii_lowercase();
        lower != "id" && lower.len() > 3 && lower.ends_with("_id")
    }

    /// Primary and foreign keys are always part of the exported configuration
    pub fn is_key(&self) -> bool {
        self.is_primary_key || self.looks_like_foreign_key()
    }
}

/// Columns of one table as reported by the connected database
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct TableSchema {
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Name of the first primary key column, if any
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_primary_key)
    }
}

/// Table name -> table columns. Supplied by the surrounding application and never mutated here.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Schema {
    pub tables: BTreeMap<String, TableSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, table: TableSchema) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&Column> {
        self.table(table).and_then(|t| t.column(column))
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Split a handle at the separator position that names an existing column.
    /// Needed for tables ending or columns starting with `_`, e.g. `orders___id`.
    pub fn resolve_handle<'a>(&self, handle: &'a str) -> Option<(&'a str, &'a str)> {
        handle_splits(handle).find(|(table, column)| self.column(table, column).is_some())
    }
}

/// Split a `Table__column` handle at the first separator
pub fn split_handle(handle: &str) -> Option<(&str, &str)> {
    let (table, column) = handle.split_once(HANDLE_SEPARATOR)?;
    if table.is_empty() || column.is_empty() {
        return None;
    }
    Some((table, column))
}

/// Every way to read `handle` as `Table__column`, first separator first
pub fn handle_splits(handle: &str) -> impl Iterator<Item = (&str, &str)> {
    handle
        .match_indices('_')
        .map(|(i, _)| i)
        .filter(move |&i| handle[i..].starts_with(HANDLE_SEPARATOR))
        .map(move |i| (&handle[..i], &handle[i + HANDLE_SEPARATOR.len()..]))
        .filter(|(table, column)| !table.is_empty() && !column.is_empty())
}

/// Build the `Table__column` handle of a column
pub fn column_handle(table: &str, column: &str) -> String {
    format!("{table}{HANDLE_SEPARATOR}{column}")
}

/// Demo schema used by the replay tool and tests
pub fn create_demo_schema() -> Schema {
    Schema::new()
        .with_table(
            "users",
            TableSchema::new()
                .add_column(Column::new("id", "INTEGER").primary_key())
                .add_column(Column::new("username", "VARCHAR(255)").not_null())
                .add_column(Column::new("email", "VARCHAR(255)").not_null())
                .add_column(Column::new("created_at", "TIMESTAMP").not_null()),
        )
        .with_table(
            "posts",
            TableSchema::new()
                .add_column(Column::new("id", "INTEGER").primary_key())
                .add_column(Column::new("user_id", "INTEGER").not_null())
                .add_column(Column::new("title", "VARCHAR(255)").not_null())
                .add_column(Column::new("content", "TEXT"))
                .add_column(Column::new("created_at", "TIMESTAMP").not_null()),
        )
        .with_table(
            "comments",
            TableSchema::new()
                .add_column(Column::new("id", "INTEGER").primary_key())
                .add_column(Column::new("post_id", "INTEGER").not_null())
                .add_column(Column::new("user_id", "INTEGER").not_null())
                .add_column(Column::new("content", "TEXT").not_null())
                .add_column(Column::new("created_at", "TIMESTAMP").not_null()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_heuristic() {
        assert!(Column::new("user_id", "INT").looks_like_foreign_key());
        assert!(Column::new("Owner_ID", "INT").looks_like_foreign_key());
        assert!(!Column::new("id", "INT").looks_like_foreign_key());
        assert!(!Column::new("_id", "INT").looks_like_foreign_key());
        assert!(!Column::new("valid", "INT").looks_like_foreign_key());
        assert!(Column::new("parent", "INT").foreign_key().looks_like_foreign_key());
    }

    #[test]
    fn test_is_key() {
        assert!(Column::new("id", "INT").primary_key().is_key());
        assert!(Column::new("post_id", "INT").is_key());
        assert!(!Column::new("title", "TEXT").is_key());
    }

    #[test]
    fn test_column_deserialize_defaults() {
        let column: Column = serde_json::from_str(r#"{"name":"email","type":"text"}"#).unwrap();
        assert_eq!(column.data_type, "text");
        assert!(!column.is_primary_key);
        assert!(!column.is_foreign_key);
        assert!(column.nullable);

        let column: Column =
            serde_json::from_str(r#"{"name":"id","type":"int","isPrimaryKey":true,"nullable":false}"#)
                .unwrap();
        assert!(column.is_primary_key);
        assert!(!column.nullable);
    }

    #[test]
    fn test_schema_deserialize_record() {
        let json = r#"{"orders":{"columns":[{"name":"id","type":"int","isPrimaryKey":true}]}}"#;
        let schema: Schema = serde_json::from_str(json).unwrap();
        assert!(schema.has_table("orders"));
        assert!(schema.column("orders", "id").unwrap().is_primary_key);
        assert!(schema.column("orders", "missing").is_none());
    }

    #[test]
    fn test_split_handle() {
        assert_eq!(split_handle("Orders__id"), Some(("Orders", "id")));
        assert_eq!(split_handle("Orders__line__no"), Some(("Orders", "line__no")));
        assert_eq!(split_handle("Orders"), None);
        assert_eq!(split_handle("__id"), None);
        assert_eq!(split_handle("Orders__"), None);
        assert_eq!(column_handle("Orders", "id"), "Orders__id");
    }

    #[test]
    fn test_handle_splits_and_resolve() {
        let splits: Vec<_> = handle_splits("orders___id").collect();
        assert_eq!(splits, vec![("orders", "_id"), ("orders_", "id")]);

        let schema = Schema::new()
            .with_table(
                "orders_",
                TableSchema::new().add_column(Column::new("id", "INT").primary_key()),
            )
            .with_table("a", TableSchema::new().add_column(Column::new("_b", "INT")));
        assert_eq!(schema.resolve_handle("orders___id"), Some(("orders_", "id")));
        assert_eq!(schema.resolve_handle("a___b"), Some(("a", "_b")));
        assert_eq!(schema.resolve_handle("orders___nope"), None);
    }

    #[test]
    fn test_demo_schema() {
        let schema = create_demo_schema();
        assert_eq!(schema.table_count(), 3);
        assert_eq!(schema.table("posts").unwrap().primary_key().unwrap().name, "id");
    }
}
