//! Relationship records and their two serialization shapes
//!
//! The canonical in-memory shape is [`Relationship`] (camelCase on the wire, `type` field).
//! The backend API speaks [`WireRelationship`] (snake_case, `relationship_type` field).
//! [`RawRelationship`] accepts either shape at the boundary; nothing past the adapter
//! needs to know which one was received.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cardinality of a relationship between two columns
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    /// Один к одному
    #[default]
    #[serde(alias = "one_to_one")]
    OneToOne,
    /// Один ко многим
    #[serde(alias = "one_to_many")]
    OneToMany,
    /// Многие к одному
    #[serde(alias = "many_to_one")]
    ManyToOne,
    /// Многие ко многим
    #[serde(alias = "many_to_many")]
    ManyToMany,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 4] = [
        RelationshipType::OneToOne,
        RelationshipType::OneToMany,
        RelationshipType::ManyToOne,
        RelationshipType::ManyToMany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::OneToOne => "one-to-one",
            RelationshipType::OneToMany => "one-to-many",
            RelationshipType::ManyToOne => "many-to-one",
            RelationshipType::ManyToMany => "many-to-many",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RelationshipType::OneToOne => "One to One",
            RelationshipType::OneToMany => "One to Many",
            RelationshipType::ManyToOne => "Many to One",
            RelationshipType::ManyToMany => "Many to Many",
        }
    }

    /// Whether the source end of the edge is the "many" side
    pub fn source_is_many(&self) -> bool {
        matches!(self, RelationshipType::ManyToOne | RelationshipType::ManyToMany)
    }

    /// Whether the target end of the edge is the "many" side
    pub fn target_is_many(&self) -> bool {
        matches!(self, RelationshipType::OneToMany | RelationshipType::ManyToMany)
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipType::OneToOne => write!(f, "1:1"),
            RelationshipType::OneToMany => write!(f, "1:N"),
            RelationshipType::ManyToOne => write!(f, "N:1"),
            RelationshipType::ManyToMany => write!(f, "N:M"),
        }
    }
}

impl FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "one-to-one" | "1:1" => Ok(RelationshipType::OneToOne),
            "one-to-many" | "1:n" => Ok(RelationshipType::OneToMany),
            "many-to-one" | "n:1" => Ok(RelationshipType::ManyToOne),
            "many-to-many" | "n:m" => Ok(RelationshipType::ManyToMany),
            other => Err(format!("unknown relationship type '{other}'")),
        }
    }
}

/// Canonical relationship between a column of one table and a column of another
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    #[serde(rename = "type", default)]
    pub relationship_type: RelationshipType,
}

impl Relationship {
    pub fn new(
        source_table: impl Into<String>,
        source_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            source_table: source_table.into(),
            source_column: source_column.into(),
            target_table: target_table.into(),
            target_column: target_column.into(),
            relationship_type,
        }
    }

    /// `source.column=>target.column`
    pub fn forward_key(&self) -> String {
        format!(
            "{}.{}=>{}.{}",
            self.source_table, self.source_column, self.target_table, self.target_column
        )
    }

    /// True when both relationships connect the same pair of columns, in either direction.
    /// The cardinality is not part of the comparison.
    pub fn links_same_columns(&self, other: &Relationship) -> bool {
        let forward = self.source_table == other.source_table
            && self.source_column == other.source_column
            && self.target_table == other.target_table
            && self.target_column == other.target_column;
        let reverse = self.source_table == other.target_table
            && self.source_column == other.target_column
            && self.target_table == other.source_table
            && self.target_column == other.source_column;
        forward || reverse
    }

    pub fn is_self_link(&self) -> bool {
        self.source_table == self.target_table
    }

    pub fn references(&self, table: &str, column: &str) -> bool {
        (self.source_table == table && self.source_column == column)
            || (self.target_table == table && self.target_column == column)
    }

    pub fn touches_table(&self, table: &str) -> bool {
        self.source_table == table || self.target_table == table
    }

    /// Field-level completeness check used before a relationship is committed
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.source_table.is_empty() {
            Some("source_table")
        } else if self.source_column.is_empty() {
            Some("source_column")
        } else if self.target_table.is_empty() {
            Some("target_table")
        } else if self.target_column.is_empty() {
            Some("target_column")
        } else {
            None
        }
    }

    pub fn to_wire(&self) -> WireRelationship {
        WireRelationship::from(self.clone())
    }
}

/// Relationship as expected by the backend API
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct WireRelationship {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    #[serde(default)]
    pub relationship_type: RelationshipType,
}

impl From<Relationship> for WireRelationship {
    fn from(rel: Relationship) -> Self {
        Self {
            source_table: rel.source_table,
            source_column: rel.source_column,
            target_table: rel.target_table,
            target_column: rel.target_column,
            relationship_type: rel.relationship_type,
        }
    }
}

impl From<WireRelationship> for Relationship {
    fn from(rel: WireRelationship) -> Self {
        Self {
            source_table: rel.source_table,
            source_column: rel.source_column,
            target_table: rel.target_table,
            target_column: rel.target_column,
            relationship_type: rel.relationship_type,
        }
    }
}

/// A relationship record in either historical shape
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawRelationship {
    Camel(Relationship),
    Snake(WireRelationship),
}

impl RawRelationship {
    pub fn into_canonical(self) -> Relationship {
        match self {
            RawRelationship::Camel(rel) => rel,
            RawRelationship::Snake(rel) => rel.into(),
        }
    }
}

impl From<Relationship> for RawRelationship {
    fn from(rel: Relationship) -> Self {
        RawRelationship::Camel(rel)
    }
}

impl From<WireRelationship> for RawRelationship {
    fn from(rel: WireRelationship) -> Self {
        RawRelationship::Snake(rel)
    }
}

/// Convert canonical relationships into the backend shape
pub fn to_wire(relationships: &[Relationship]) -> Vec<WireRelationship> {
    relationships.iter().map(Relationship::to_wire).collect()
}
