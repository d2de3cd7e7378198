//! Interaction controller as a pure reducer
//!
//! Every user gesture is a [`DesignerEvent`]; [`reduce`] turns the current
//! [`DesignerState`] and one event into the next state plus the side effects the
//! runtime has to carry out. Rejected gestures leave the state untouched apart
//! from the dismissible `error` slot.

use crate::core::compat::compatibility_warning;
use crate::core::config::{DesignerConfig, GridConfig};
use crate::core::error::{DesignerError, DesignerResult};
use crate::core::graph::{
    DesignerGraph, Edge, NodeLayout, TableNode, build_edges, build_graph, build_nodes,
    create_edge_id, edge_id_for, parse_edge_id,
};
use crate::core::normalizer::normalize;
use crate::core::relationship::{RawRelationship, Relationship, RelationshipType};
use crate::core::schema::{Schema, split_handle};
use crate::core::selection::{ColumnSelection, ForcedBy, SelectedColumns};
use crate::core::suggest::suggest_relationships;
use serde::{Deserialize, Serialize};

/// Behaviour switches copied from [`DesignerConfig`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DesignerOptions {
    pub grid: GridConfig,
    pub strict_type_check: bool,
}

impl From<&DesignerConfig> for DesignerOptions {
    fn from(config: &DesignerConfig) -> Self {
        Self {
            grid: config.grid.clone(),
            strict_type_check: config.strict_type_check,
        }
    }
}

/// A drag-connect gesture waiting for its cardinality to be confirmed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConnection {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    pub relationship_type: RelationshipType,
    /// Set when the column types look incompatible
    pub type_warning: Option<String>,
}

impl PendingConnection {
    fn to_relationship(&self, relationship_type: RelationshipType) -> Relationship {
        Relationship::new(
            self.source_table.clone(),
            self.source_column.clone(),
            self.target_table.clone(),
            self.target_column.clone(),
            relationship_type,
        )
    }
}

/// User gestures handled by the designer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DesignerEvent {
    /// Drag from one column handle to another
    Connect {
        source_handle: String,
        target_handle: String,
    },
    /// Pick a cardinality in the type dialog without committing
    SelectConnectionType { relationship_type: RelationshipType },
    /// Commit the pending connection with the given cardinality
    ConfirmConnection {
        #[serde(default)]
        relationship_type: Option<RelationshipType>,
    },
    /// Close the type dialog
    CancelConnection,
    AcceptSuggestion { relationship: Relationship },
    /// Replace a relationship wholesale
    EditRelationship {
        edge_id: String,
        relationship: Relationship,
    },
    DeleteEdge { edge_id: String },
    /// Snapshot of every node position after a drag
    NodeDragStop { positions: NodeLayout },
    ToggleColumn {
        table: String,
        column: String,
        included: bool,
    },
    SelectAllColumns { table: String },
    DeselectAllColumns { table: String },
    SetSelectedTables { tables: Vec<String> },
    DismissError,
}

/// Side effect requested by a transition
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    RelationshipsChanged,
    SelectedColumnsChanged,
    PersistLayout(NodeLayout),
}

/// Everything the designer knows at one point in time
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DesignerState {
    pub schema: Schema,
    pub selected_tables: Vec<String>,
    pub selection: ColumnSelection,
    pub relationships: Vec<Relationship>,
    pub layout: NodeLayout,
    pub pending: Option<PendingConnection>,
    pub error: Option<DesignerError>,
    pub options: DesignerOptions,
}

impl DesignerState {
    /// Normalize the incoming relationships and establish the forced-column invariant
    pub fn new<I, R>(
        schema: Schema,
        selected_tables: Vec<String>,
        selected_columns: SelectedColumns,
        relationships: I,
        options: DesignerOptions,
    ) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RawRelationship>,
    {
        let relationships = normalize(relationships, &selected_tables);
        let mut selection = ColumnSelection::from_map(selected_columns);
        selection.retain_tables(&selected_tables);
        selection.enforce(&schema, &selected_tables, &relationships);

        Self {
            schema,
            selected_tables,
            selection,
            relationships,
            layout: NodeLayout::new(),
            pending: None,
            error: None,
            options,
        }
    }

    pub fn with_layout(mut self, layout: NodeLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn nodes(&self) -> Vec<TableNode> {
        build_nodes(
            &self.schema,
            &self.selected_tables,
            &self.selection,
            &self.layout,
            &self.options.grid,
        )
    }

    pub fn edges(&self) -> Vec<Edge> {
        build_edges(&self.relationships, &self.nodes())
    }

    pub fn graph(&self) -> DesignerGraph {
        let nodes = self.nodes();
        let edges = build_edges(&self.relationships, &nodes);
        build_graph(nodes, edges)
    }

    pub fn is_forced(&self, table: &str, column: &str) -> bool {
        ColumnSelection::is_forced(&self.schema, &self.relationships, table, column)
    }

    pub fn forced_reason(&self, table: &str, column: &str) -> Option<ForcedBy> {
        ColumnSelection::forced_reason(&self.schema, &self.relationships, table, column)
    }

    pub fn suggestions(&self) -> Vec<Relationship> {
        suggest_relationships(&self.schema, &self.selected_tables, &self.relationships)
    }

    fn is_table_selected(&self, table: &str) -> bool {
        self.selected_tables.iter().any(|t| t == table)
    }

    /// Read a handle as `(table, column)`, preferring the split that names a schema column
    fn resolve_handle<'a>(&self, handle: &'a str) -> DesignerResult<(&'a str, &'a str)> {
        self.schema
            .resolve_handle(handle)
            .or_else(|| split_handle(handle))
            .ok_or_else(|| DesignerError::InvalidHandle(handle.to_string()))
    }

    fn check_column(&self, table: &str, column: &str) -> DesignerResult<()> {
        if !self.is_table_selected(table) || !self.schema.has_table(table) {
            return Err(DesignerError::UnknownTable(table.to_string()));
        }
        if self.schema.column(table, column).is_none() {
            return Err(DesignerError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
        Ok(())
    }

    fn type_warning(&self, rel: &Relationship) -> DesignerResult<Option<String>> {
        let source = self.schema.column(&rel.source_table, &rel.source_column);
        let target = self.schema.column(&rel.target_table, &rel.target_column);
        let (Some(source), Some(target)) = (source, target) else {
            return Ok(None);
        };
        let warning = compatibility_warning(source, target);
        if warning.is_some() && self.options.strict_type_check {
            return Err(DesignerError::IncompatibleTypes {
                source_type: source.data_type.clone(),
                target_type: target.data_type.clone(),
            });
        }
        Ok(warning)
    }

    /// Full validation of a relationship about to be committed.
    /// `replacing` is the index of a relationship excluded from the duplicate check.
    fn validate(&self, rel: &Relationship, replacing: Option<usize>) -> DesignerResult<()> {
        if let Some(field) = rel.missing_field() {
            return Err(DesignerError::MissingField(field));
        }
        if rel.is_self_link() {
            return Err(DesignerError::SelfRelationship {
                table: rel.source_table.clone(),
            });
        }
        self.check_column(&rel.source_table, &rel.source_column)?;
        self.check_column(&rel.target_table, &rel.target_column)?;
        self.type_warning(rel)?;

        let duplicate = self
            .relationships
            .iter()
            .enumerate()
            .any(|(i, existing)| Some(i) != replacing && existing.links_same_columns(rel));
        if duplicate {
            return Err(DesignerError::DuplicateRelationship {
                source_key: format!("{}.{}", rel.source_table, rel.source_column),
                target_key: format!("{}.{}", rel.target_table, rel.target_column),
            });
        }
        Ok(())
    }

    /// Locate the relationship behind an edge ID, in either direction
    fn find_edge(&self, edge_id: &str) -> DesignerResult<usize> {
        let exact = self
            .relationships
            .iter()
            .position(|rel| edge_id_for(rel) == edge_id);
        let reversed = || {
            self.relationships.iter().position(|rel| {
                create_edge_id(
                    &rel.target_table,
                    &rel.target_column,
                    &rel.source_table,
                    &rel.source_column,
                ) == edge_id
            })
        };
        if let Some(index) = exact.or_else(reversed) {
            return Ok(index);
        }
        match parse_edge_id(edge_id) {
            Some(_) => Err(DesignerError::RelationshipNotFound(edge_id.to_string())),
            None => Err(DesignerError::InvalidEdgeId(edge_id.to_string())),
        }
    }
}

/// Result of applying one event
#[derive(Clone, Debug)]
pub struct Transition {
    pub state: DesignerState,
    pub effects: Vec<Effect>,
    pub rejection: Option<DesignerError>,
}

impl Transition {
    /// Accepted transition without side effects
    fn quiet(state: DesignerState) -> Self {
        Self {
            state,
            effects: Vec::new(),
            rejection: None,
        }
    }

    fn rejected(mut state: DesignerState, error: DesignerError) -> Self {
        tracing::debug!("Gesture rejected: {}", error);
        state.error = Some(error.clone());
        Self {
            state,
            effects: Vec::new(),
            rejection: Some(error),
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }
}

/// Apply one event to the state
pub fn reduce(state: DesignerState, event: DesignerEvent) -> Transition {
    match event {
        DesignerEvent::Connect {
            source_handle,
            target_handle,
        } => on_connect(state, &source_handle, &target_handle),
        DesignerEvent::SelectConnectionType { relationship_type } => {
            let mut state = state;
            if state.pending.is_none() {
                return Transition::rejected(state, DesignerError::NoPendingConnection);
            }
            if let Some(pending) = state.pending.as_mut() {
                pending.relationship_type = relationship_type;
            }
            Transition::quiet(state)
        }
        DesignerEvent::ConfirmConnection { relationship_type } => {
            on_confirm(state, relationship_type)
        }
        DesignerEvent::CancelConnection => {
            let mut state = state;
            state.pending = None;
            Transition::quiet(state)
        }
        DesignerEvent::AcceptSuggestion { relationship } => commit(state, relationship, None),
        DesignerEvent::EditRelationship {
            edge_id,
            relationship,
        } => match state.find_edge(&edge_id) {
            Ok(index) => commit(state, relationship, Some(index)),
            Err(e) => Transition::rejected(state, e),
        },
        DesignerEvent::DeleteEdge { edge_id } => on_delete_edge(state, &edge_id),
        DesignerEvent::NodeDragStop { positions } => {
            let mut state = state;
            state.layout = positions.clone();
            Transition {
                state,
                effects: vec![Effect::PersistLayout(positions)],
                rejection: None,
            }
        }
        DesignerEvent::ToggleColumn {
            table,
            column,
            included,
        } => on_column_change(state, &table, |s| {
            s.selection
                .toggle_column(&s.schema, &s.relationships, &table, &column, included)
        }),
        DesignerEvent::SelectAllColumns { table } => {
            on_column_change(state, &table, |s| s.selection.select_all(&s.schema, &table))
        }
        DesignerEvent::DeselectAllColumns { table } => on_column_change(state, &table, |s| {
            s.selection
                .deselect_all(&s.schema, &s.relationships, &table)
        }),
        DesignerEvent::SetSelectedTables { tables } => on_set_selected_tables(state, tables),
        DesignerEvent::DismissError => {
            let mut state = state;
            state.error = None;
            Transition::quiet(state)
        }
    }
}

/// Column toggles only apply to selected tables
fn on_column_change(
    mut state: DesignerState,
    table: &str,
    change: impl FnOnce(&mut DesignerState) -> bool,
) -> Transition {
    if !state.is_table_selected(table) {
        tracing::debug!("Ignoring column change on unselected table '{}'", table);
        return Transition::quiet(state);
    }
    let changed = change(&mut state);
    Transition {
        state,
        effects: if changed {
            vec![Effect::SelectedColumnsChanged]
        } else {
            Vec::new()
        },
        rejection: None,
    }
}

fn on_connect(mut state: DesignerState, source_handle: &str, target_handle: &str) -> Transition {
    let resolved = state
        .resolve_handle(source_handle)
        .and_then(|s| state.resolve_handle(target_handle).map(|t| (s, t)));
    let ((source_table, source_column), (target_table, target_column)) = match resolved {
        Ok(resolved) => resolved,
        Err(e) => return Transition::rejected(state, e),
    };
    if source_table == target_table {
        return Transition::rejected(
            state,
            DesignerError::SelfRelationship {
                table: source_table.to_string(),
            },
        );
    }
    let checked = state
        .check_column(source_table, source_column)
        .and_then(|_| state.check_column(target_table, target_column));
    if let Err(e) = checked {
        return Transition::rejected(state, e);
    }

    let probe = Relationship::new(
        source_table,
        source_column,
        target_table,
        target_column,
        RelationshipType::default(),
    );
    let type_warning = match state.type_warning(&probe) {
        Ok(warning) => warning,
        Err(e) => return Transition::rejected(state, e),
    };

    tracing::debug!("Pending connection {}", probe.forward_key());
    state.pending = Some(PendingConnection {
        source_table: probe.source_table,
        source_column: probe.source_column,
        target_table: probe.target_table,
        target_column: probe.target_column,
        relationship_type: RelationshipType::default(),
        type_warning,
    });
    state.error = None;
    Transition::quiet(state)
}

fn on_confirm(state: DesignerState, relationship_type: Option<RelationshipType>) -> Transition {
    let Some(pending) = state.pending.clone() else {
        return Transition::rejected(state, DesignerError::NoPendingConnection);
    };
    let relationship =
        pending.to_relationship(relationship_type.unwrap_or(pending.relationship_type));
    let mut transition = commit(state, relationship, None);
    if !transition.is_rejected() {
        transition.state.pending = None;
    }
    transition
}

/// Append (or replace at `replacing`) a validated relationship and cascade the column selection
fn commit(
    mut state: DesignerState,
    relationship: Relationship,
    replacing: Option<usize>,
) -> Transition {
    if let Err(e) = state.validate(&relationship, replacing) {
        return Transition::rejected(state, e);
    }

    tracing::debug!(
        "Committing relationship {} ({})",
        relationship.forward_key(),
        relationship.relationship_type
    );
    match replacing {
        Some(index) => state.relationships[index] = relationship,
        None => state.relationships.push(relationship),
    }
    state.error = None;

    let mut effects = vec![Effect::RelationshipsChanged];
    if state
        .selection
        .enforce(&state.schema, &state.selected_tables, &state.relationships)
    {
        effects.push(Effect::SelectedColumnsChanged);
    }

    Transition {
        state,
        effects,
        rejection: None,
    }
}

fn on_delete_edge(mut state: DesignerState, edge_id: &str) -> Transition {
    let index = match state.find_edge(edge_id) {
        Ok(index) => index,
        Err(e) => return Transition::rejected(state, e),
    };
    let removed = state.relationships.remove(index);
    tracing::debug!("Deleted relationship {}", removed.forward_key());

    // Columns stay selected; they are simply no longer forced by this relationship.
    Transition {
        state,
        effects: vec![Effect::RelationshipsChanged],
        rejection: None,
    }
}

fn on_set_selected_tables(mut state: DesignerState, tables: Vec<String>) -> Transition {
    let before = state.relationships.len();
    state.relationships = normalize(std::mem::take(&mut state.relationships), &tables);
    state.selected_tables = tables;

    let mut columns_changed = state.selection.retain_tables(&state.selected_tables);
    columns_changed |=
        state
            .selection
            .enforce(&state.schema, &state.selected_tables, &state.relationships);

    let pending_orphaned = state.pending.as_ref().is_some_and(|p| {
        !state.selected_tables.contains(&p.source_table)
            || !state.selected_tables.contains(&p.target_table)
    });
    if pending_orphaned {
        state.pending = None;
    }

    let mut effects = Vec::new();
    if state.relationships.len() != before {
        effects.push(Effect::RelationshipsChanged);
    }
    if columns_changed {
        effects.push(Effect::SelectedColumnsChanged);
    }
    Transition {
        state,
        effects,
        rejection: None,
    }
}
