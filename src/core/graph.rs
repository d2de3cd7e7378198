//! Graph model of the relationship designer
//!
//! One node per selected table, one directed edge per relationship. Edges whose
//! endpoint nodes are not present (yet) are dropped rather than reported.

use crate::core::config::GridConfig;
use crate::core::relationship::{Relationship, RelationshipType};
use crate::core::schema::{Schema, column_handle, split_handle};
use crate::core::selection::ColumnSelection;
use petgraph::Directed;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Separator between the source and target halves of an edge ID
pub const EDGE_ARROW: &str = "->";

/// Pixel coordinates of a node on the canvas
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Table name -> stored position
pub type NodeLayout = BTreeMap<String, Position>;

/// Column row rendered inside a table node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeColumn {
    pub name: String,
    pub data_type: String,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub selected: bool,
}

/// Узел графа - выбранная таблица
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableNode {
    /// Table name, doubles as node id
    pub id: String,
    pub position: Position,
    pub columns: Vec<NodeColumn>,
}

/// Cardinality marker drawn at one end of an edge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    One,
    /// Crow's foot
    Many,
}

/// Presentation attributes of an edge, derived from its cardinality
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EdgeStyle {
    pub color: &'static str,
    pub dashed: bool,
    pub source_marker: Marker,
    pub target_marker: Marker,
}

impl EdgeStyle {
    pub fn for_type(relationship_type: RelationshipType) -> Self {
        let marker = |many: bool| if many { Marker::Many } else { Marker::One };
        let color = match relationship_type {
            RelationshipType::OneToOne => "#3b82f6",
            RelationshipType::OneToMany => "#10b981",
            RelationshipType::ManyToOne => "#f59e0b",
            RelationshipType::ManyToMany => "#8b5cf6",
        };
        Self {
            color,
            dashed: relationship_type == RelationshipType::ManyToMany,
            source_marker: marker(relationship_type.source_is_many()),
            target_marker: marker(relationship_type.target_is_many()),
        }
    }
}

/// Ребро графа - связь между колонками двух таблиц
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_handle: String,
    pub target_handle: String,
    pub relationship_type: RelationshipType,
    pub style: EdgeStyle,
}

/// Components of an edge ID
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdgeEndpoints {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

/// `sourceTable__sourceColumn->targetTable__targetColumn`
pub fn create_edge_id(
    source_table: &str,
    source_column: &str,
    target_table: &str,
    target_column: &str,
) -> String {
    format!(
        "{}{EDGE_ARROW}{}",
        column_handle(source_table, source_column),
        column_handle(target_table, target_column)
    )
}

pub fn edge_id_for(rel: &Relationship) -> String {
    create_edge_id(
        &rel.source_table,
        &rel.source_column,
        &rel.target_table,
        &rel.target_column,
    )
}

/// Inverse of [`create_edge_id`] for identifiers without `__` or `->` inside them.
/// Each half is split at its first `__`, so `orders_` + `id` reads back as `orders` + `_id`;
/// compare against [`edge_id_for`] when the relationships are known.
pub fn parse_edge_id(edge_id: &str) -> Option<EdgeEndpoints> {
    let (source, target) = edge_id.split_once(EDGE_ARROW)?;
    let (source_table, source_column) = split_handle(source)?;
    let (target_table, target_column) = split_handle(target)?;
    Some(EdgeEndpoints {
        source_table: source_table.to_string(),
        source_column: source_column.to_string(),
        target_table: target_table.to_string(),
        target_column: target_column.to_string(),
    })
}

/// Deterministic default position of the `index`-th of `count` nodes
pub fn grid_position(index: usize, count: usize, grid: &GridConfig) -> Position {
    let cols = (count.max(1) as f64).sqrt().ceil() as usize;
    let row = index / cols;
    let col = index % cols;
    Position::new(
        grid.origin_x + col as f64 * grid.spacing_x,
        grid.origin_y + row as f64 * grid.spacing_y,
    )
}

/// Build one node per selected table present in the schema
pub fn build_nodes(
    schema: &Schema,
    selected_tables: &[String],
    selection: &ColumnSelection,
    layout: &NodeLayout,
    grid: &GridConfig,
) -> Vec<TableNode> {
    let present: Vec<&String> = selected_tables
        .iter()
        .filter(|name| {
            let exists = schema.has_table(name);
            if !exists {
                tracing::debug!("Skipping node for table '{}' missing from schema", name);
            }
            exists
        })
        .collect();
    let count = present.len();

    present
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let position = layout
                .get(name.as_str())
                .copied()
                .unwrap_or_else(|| grid_position(index, count, grid));
            let columns = schema
                .table(name)
                .map(|table| {
                    table
                        .columns
                        .iter()
                        .map(|c| NodeColumn {
                            name: c.name.clone(),
                            data_type: c.data_type.clone(),
                            is_primary_key: c.is_primary_key,
                            is_foreign_key: c.looks_like_foreign_key(),
                            selected: selection.is_selected(name, &c.name),
                        })
                        .collect()
                })
                .unwrap_or_default();
            TableNode {
                id: name.clone(),
                position,
                columns,
            }
        })
        .collect()
}

/// Build the edges whose endpoint nodes both exist
pub fn build_edges(relationships: &[Relationship], nodes: &[TableNode]) -> Vec<Edge> {
    relationships
        .iter()
        .filter(|rel| {
            let renderable = nodes.iter().any(|n| n.id == rel.source_table)
                && nodes.iter().any(|n| n.id == rel.target_table);
            if !renderable {
                tracing::trace!("Edge {} not renderable yet", rel.forward_key());
            }
            renderable
        })
        .map(|rel| Edge {
            id: edge_id_for(rel),
            source: rel.source_table.clone(),
            target: rel.target_table.clone(),
            source_handle: column_handle(&rel.source_table, &rel.source_column),
            target_handle: column_handle(&rel.target_table, &rel.target_column),
            relationship_type: rel.relationship_type,
            style: EdgeStyle::for_type(rel.relationship_type),
        })
        .collect()
}

/// Тип графа: узлы - таблицы, ребра - связи
pub type DesignerGraph = StableGraph<TableNode, Edge, Directed>;

/// Assemble nodes and edges into a graph. Parallel edges between two tables are kept.
pub fn build_graph(nodes: Vec<TableNode>, edges: Vec<Edge>) -> DesignerGraph {
    let mut graph = DesignerGraph::new();
    let mut index: HashMap<String, NodeIndex> = HashMap::new();

    for node in nodes {
        let id = node.id.clone();
        index.insert(id, graph.add_node(node));
    }

    for edge in edges {
        if let (Some(&from), Some(&to)) = (index.get(&edge.source), index.get(&edge.target)) {
            graph.add_edge(from, to, edge);
        }
    }

    graph
}

/// Find a node by table name
pub fn find_node(graph: &DesignerGraph, table: &str) -> Option<NodeIndex> {
    graph
        .node_indices()
        .find(|&idx| graph.node_weight(idx).is_some_and(|n| n.id == table))
}
