//! Core domain models and logic of the schema relationship designer

pub mod compat;
pub mod config;
pub mod controller;
pub mod designer;
mod error;
pub mod graph;
pub mod normalizer;
pub mod persistence;
mod relationship;
mod schema;
pub mod selection;
pub mod suggest;

pub use config::{DesignerConfig, GridConfig};
pub use controller::{DesignerEvent, DesignerState, Effect, PendingConnection, Transition, reduce};
pub use designer::{Designer, DesignerInput, DesignerObserver};
pub use error::*;
pub use graph::{
    DesignerGraph, Edge, EdgeStyle, Marker, NodeLayout, Position, TableNode, create_edge_id,
    parse_edge_id,
};
pub use normalizer::normalize;
pub use persistence::{FileStore, KeyValueStore, MemoryStore, PositionStore};
#[cfg(feature = "hydrate")]
pub use persistence::LocalStorageStore;
pub use relationship::*;
pub use schema::*;
pub use selection::{ColumnSelection, ForcedBy, SelectedColumns};
