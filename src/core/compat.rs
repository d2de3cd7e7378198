//! Column type compatibility for drag-to-connect

use crate::core::schema::Column;

/// Broad family of an SQL column type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeFamily {
    Integer,
    Decimal,
    Text,
    Uuid,
    Temporal,
    Boolean,
    Binary,
    Json,
    Other,
}

impl TypeFamily {
    fn is_numeric(self) -> bool {
        matches!(self, TypeFamily::Integer | TypeFamily::Decimal)
    }
}

/// Classify a type name such as `VARCHAR(255)`, `bigint unsigned` or `timestamptz`
pub fn classify(data_type: &str) -> TypeFamily {
    let lower = data_type.trim().to_ascii_lowercase();
    let base = lower
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or("");

    match base {
        "int" | "integer" | "int2" | "int4" | "int8" | "smallint" | "bigint" | "tinyint"
        | "mediumint" | "serial" | "bigserial" | "smallserial" => TypeFamily::Integer,
        "decimal" | "numeric" | "float" | "float4" | "float8" | "double" | "real" | "money" => {
            TypeFamily::Decimal
        }
        "char" | "varchar" | "character" | "text" | "tinytext" | "mediumtext" | "longtext"
        | "string" | "nvarchar" | "nchar" | "citext" | "enum" => TypeFamily::Text,
        "uuid" | "uniqueidentifier" => TypeFamily::Uuid,
        "date" | "time" | "timetz" | "datetime" | "timestamp" | "timestamptz" | "year"
        | "interval" => TypeFamily::Temporal,
        "bool" | "boolean" | "bit" => TypeFamily::Boolean,
        "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" | "bytea" => {
            TypeFamily::Binary
        }
        "json" | "jsonb" => TypeFamily::Json,
        _ => TypeFamily::Other,
    }
}

/// Columns can be joined when their families match, both are numeric,
/// or either type is unknown to the classifier.
pub fn are_compatible(source: &Column, target: &Column) -> bool {
    let a = classify(&source.data_type);
    let b = classify(&target.data_type);
    a == b || (a.is_numeric() && b.is_numeric()) || a == TypeFamily::Other || b == TypeFamily::Other
}

/// Human readable warning for an incompatible pair, `None` when compatible
pub fn compatibility_warning(source: &Column, target: &Column) -> Option<String> {
    if are_compatible(source, target) {
        return None;
    }
    Some(format!(
        "{} ({}) and {} ({}) have different types",
        source.name, source.data_type, target.name, target.data_type
    ))
}
