//! Designer runtime
//!
//! Owns the [`DesignerState`], feeds queued events through [`reduce`] one at a time
//! and carries out the requested effects: layout writes go to the
//! [`PositionStore`], relationship and column changes are reported to observers.

use crate::core::config::DesignerConfig;
use crate::core::controller::{
    DesignerEvent, DesignerOptions, DesignerState, Effect, PendingConnection, reduce,
};
use crate::core::error::DesignerError;
use crate::core::graph::{DesignerGraph, Edge, TableNode};
use crate::core::persistence::{KeyValueStore, PositionStore};
use crate::core::relationship::{RawRelationship, Relationship, WireRelationship, to_wire};
use crate::core::schema::Schema;
use crate::core::selection::SelectedColumns;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Callbacks into the surrounding application
pub trait DesignerObserver {
    /// Called with the backend (snake_case) shape after the relationship set changed
    fn on_relationships_change(&mut self, _relationships: &[WireRelationship]) {}

    fn on_selected_columns_change(&mut self, _selected_columns: &SelectedColumns) {}
}

/// Everything the surrounding application hands to the designer
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignerInput {
    pub schema: Schema,
    pub selected_tables: Vec<String>,
    #[serde(default)]
    pub selected_columns: SelectedColumns,
    #[serde(default)]
    pub relationships: Vec<RawRelationship>,
    pub connection_id: String,
}

pub struct Designer<S> {
    state: DesignerState,
    connection_id: String,
    positions: PositionStore<S>,
    observers: Vec<Box<dyn DesignerObserver>>,
    queue: VecDeque<DesignerEvent>,
    history: Vec<DesignerEvent>,
}

impl<S: KeyValueStore> Designer<S> {
    pub fn new(input: DesignerInput, config: &DesignerConfig, store: S) -> Self {
        let positions = PositionStore::with_prefix(store, config.storage_prefix.clone());
        let layout = positions.load(&input.connection_id);
        let state = DesignerState::new(
            input.schema,
            input.selected_tables,
            input.selected_columns,
            input.relationships,
            DesignerOptions::from(config),
        )
        .with_layout(layout);

        tracing::info!(
            "Designer ready for connection '{}': {} tables, {} relationships",
            input.connection_id,
            state.selected_tables.len(),
            state.relationships.len()
        );

        Self {
            state,
            connection_id: input.connection_id,
            positions,
            observers: Vec::new(),
            queue: VecDeque::new(),
            history: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: impl DesignerObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Queue an event without processing it
    pub fn enqueue(&mut self, event: DesignerEvent) {
        self.queue.push_back(event);
    }

    /// Process queued events in order; returns the rejections encountered
    pub fn run_queue(&mut self) -> Vec<DesignerError> {
        let mut rejections = Vec::new();
        while let Some(event) = self.queue.pop_front() {
            if let Some(error) = self.apply(event) {
                rejections.push(error);
            }
        }
        rejections
    }

    /// Queue one event and process the queue
    pub fn dispatch(&mut self, event: DesignerEvent) -> Result<(), DesignerError> {
        self.enqueue(event);
        match self.run_queue().pop() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Process a recorded event sequence
    pub fn replay(
        &mut self,
        events: impl IntoIterator<Item = DesignerEvent>,
    ) -> Vec<DesignerError> {
        self.queue.extend(events);
        self.run_queue()
    }

    fn apply(&mut self, event: DesignerEvent) -> Option<DesignerError> {
        self.history.push(event.clone());
        let transition = reduce(std::mem::take(&mut self.state), event);
        self.state = transition.state;

        for effect in transition.effects {
            match effect {
                Effect::RelationshipsChanged => {
                    tracing::info!("Relationships changed: {}", self.state.relationships.len());
                    let wire = to_wire(&self.state.relationships);
                    for observer in &mut self.observers {
                        observer.on_relationships_change(&wire);
                    }
                }
                Effect::SelectedColumnsChanged => {
                    let selected = self.state.selection.as_map();
                    for observer in &mut self.observers {
                        observer.on_selected_columns_change(selected);
                    }
                }
                Effect::PersistLayout(layout) => {
                    self.positions.save(&self.connection_id, &layout);
                }
            }
        }

        transition.rejection
    }

    pub fn state(&self) -> &DesignerState {
        &self.state
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.state.relationships
    }

    pub fn wire_relationships(&self) -> Vec<WireRelationship> {
        to_wire(&self.state.relationships)
    }

    pub fn selected_columns(&self) -> &SelectedColumns {
        self.state.selection.as_map()
    }

    pub fn pending(&self) -> Option<&PendingConnection> {
        self.state.pending.as_ref()
    }

    pub fn error(&self) -> Option<&DesignerError> {
        self.state.error.as_ref()
    }

    pub fn nodes(&self) -> Vec<TableNode> {
        self.state.nodes()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.state.edges()
    }

    pub fn graph(&self) -> DesignerGraph {
        self.state.graph()
    }

    pub fn suggestions(&self) -> Vec<Relationship> {
        self.state.suggestions()
    }

    /// Every event applied so far, in order
    pub fn history(&self) -> &[DesignerEvent] {
        &self.history
    }

    pub fn position_store(&self) -> &PositionStore<S> {
        &self.positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::{NodeLayout, Position};
    use crate::core::persistence::MemoryStore;
    use crate::core::relationship::RelationshipType;
    use crate::core::schema::create_demo_schema;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorded {
        relationships: Vec<Vec<WireRelationship>>,
        columns: Vec<SelectedColumns>,
    }

    struct Recorder(Rc<RefCell<Recorded>>);

    impl DesignerObserver for Recorder {
        fn on_relationships_change(&mut self, relationships: &[WireRelationship]) {
            self.0.borrow_mut().relationships.push(relationships.to_vec());
        }

        fn on_selected_columns_change(&mut self, selected_columns: &SelectedColumns) {
            self.0.borrow_mut().columns.push(selected_columns.clone());
        }
    }

    fn input() -> DesignerInput {
        DesignerInput {
            schema: create_demo_schema(),
            selected_tables: vec!["users".into(), "posts".into(), "comments".into()],
            selected_columns: SelectedColumns::new(),
            relationships: Vec::new(),
            connection_id: "conn-1".into(),
        }
    }

    fn connect(source: &str, target: &str) -> DesignerEvent {
        DesignerEvent::Connect {
            source_handle: source.into(),
            target_handle: target.into(),
        }
    }

    #[test]
    fn test_commit_notifies_observers_with_wire_shape() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let mut designer = Designer::new(input(), &DesignerConfig::default(), MemoryStore::new());
        designer.add_observer(Recorder(recorded.clone()));

        designer.dispatch(connect("posts__title", "users__username")).unwrap();
        designer
            .dispatch(DesignerEvent::ConfirmConnection {
                relationship_type: Some(RelationshipType::OneToOne),
            })
            .unwrap();

        let recorded = recorded.borrow();
        assert_eq!(recorded.relationships.len(), 1);
        assert_eq!(recorded.relationships[0][0].source_table, "posts");
        assert_eq!(recorded.columns.len(), 1);
        assert!(recorded.columns[0]["posts"].contains("title"));
        assert!(recorded.columns[0]["users"].contains("username"));
    }

    #[test]
    fn test_rejection_is_returned_and_not_notified() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let mut designer = Designer::new(input(), &DesignerConfig::default(), MemoryStore::new());
        designer.add_observer(Recorder(recorded.clone()));

        let result = designer.dispatch(connect("posts__id", "posts__title"));
        assert!(matches!(result, Err(DesignerError::SelfRelationship { .. })));
        assert!(designer.error().is_some());
        assert!(recorded.borrow().relationships.is_empty());
    }

    #[test]
    fn test_drag_stop_persists_and_reloads() {
        let mut positions = NodeLayout::new();
        positions.insert("users".into(), Position::new(500.0, 10.0));

        let mut designer = Designer::new(input(), &DesignerConfig::default(), MemoryStore::new());
        designer
            .dispatch(DesignerEvent::NodeDragStop {
                positions: positions.clone(),
            })
            .unwrap();
        assert_eq!(designer.position_store().load("conn-1"), positions);

        // a second designer on the same store picks the layout up
        let store = designer.position_store().inner().clone();
        let reopened = Designer::new(input(), &DesignerConfig::default(), store);
        assert_eq!(reopened.nodes()[0].position, Position::new(500.0, 10.0));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let events = vec![
            connect("comments__post_id", "posts__id"),
            DesignerEvent::ConfirmConnection {
                relationship_type: Some(RelationshipType::ManyToOne),
            },
            connect("posts__id", "comments__post_id"),
            DesignerEvent::ConfirmConnection {
                relationship_type: None,
            },
            DesignerEvent::DismissError,
            DesignerEvent::CancelConnection,
        ];

        let mut first = Designer::new(input(), &DesignerConfig::default(), MemoryStore::new());
        let rejections = first.replay(events.clone());
        assert_eq!(rejections.len(), 1);

        let mut second = Designer::new(input(), &DesignerConfig::default(), MemoryStore::new());
        second.replay(first.history().to_vec());

        assert_eq!(first.state(), second.state());
        assert_eq!(first.relationships().len(), 1);
        assert_eq!(first.history(), events.as_slice());
    }

    #[test]
    fn test_input_accepts_both_shapes() {
        let json = r#"{
            "schema": {"a": {"columns": [{"name": "id", "type": "int", "isPrimaryKey": true}, {"name": "b_id", "type": "int"}]},
                       "b": {"columns": [{"name": "id", "type": "int", "isPrimaryKey": true}]}},
            "selectedTables": ["a", "b"],
            "relationships": [
                {"sourceTable": "a", "sourceColumn": "b_id", "targetTable": "b", "targetColumn": "id", "type": "many-to-one"},
                {"source_table": "b", "source_column": "id", "target_table": "a", "target_column": "b_id", "relationship_type": "one-to-many"}
            ],
            "connectionId": "c"
        }"#;
        let input: DesignerInput = serde_json::from_str(json).unwrap();
        let designer = Designer::new(input, &DesignerConfig::default(), MemoryStore::new());
        assert_eq!(designer.relationships().len(), 1);
        assert_eq!(
            designer.wire_relationships()[0].relationship_type,
            RelationshipType::ManyToOne
        );
        assert_eq!(designer.edges().len(), 1);
        assert_eq!(designer.graph().edge_count(), 1);
    }
}
