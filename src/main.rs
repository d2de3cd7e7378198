use joinery::core::{
    Designer, DesignerConfig, DesignerEvent, DesignerInput, DesignerObserver, FileStore,
    KeyValueStore, MemoryStore, SelectedColumns, WireRelationship, create_demo_schema,
};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Designer input plus the recorded gestures to replay
#[derive(Deserialize)]
struct Session {
    #[serde(flatten)]
    input: DesignerInput,
    #[serde(default)]
    events: Vec<DesignerEvent>,
}

struct LogObserver;

impl DesignerObserver for LogObserver {
    fn on_relationships_change(&mut self, relationships: &[WireRelationship]) {
        tracing::info!("onRelationshipsChange: {} relationships", relationships.len());
    }

    fn on_selected_columns_change(&mut self, selected_columns: &SelectedColumns) {
        let total: usize = selected_columns.values().map(|c| c.len()).sum();
        tracing::info!("onSelectedColumnsChange: {} columns selected", total);
    }
}

fn demo_session() -> Session {
    Session {
        input: DesignerInput {
            schema: create_demo_schema(),
            selected_tables: vec!["users".into(), "posts".into(), "comments".into()],
            selected_columns: SelectedColumns::new(),
            relationships: Vec::new(),
            connection_id: "demo".into(),
        },
        events: Vec::new(),
    }
}

fn run<S: KeyValueStore>(
    session: Session,
    config: &DesignerConfig,
    store: S,
) -> Result<(), Box<dyn std::error::Error>> {
    let replay_suggestions = session.events.is_empty();
    let mut designer = Designer::new(session.input, config, store);
    designer.add_observer(LogObserver);

    let events = if replay_suggestions {
        designer
            .suggestions()
            .into_iter()
            .map(|relationship| DesignerEvent::AcceptSuggestion { relationship })
            .collect()
    } else {
        session.events
    };

    let rejections: Vec<String> = designer
        .replay(events)
        .into_iter()
        .map(|e| {
            tracing::warn!("Rejected: {}", e);
            e.to_string()
        })
        .collect();

    let output = serde_json::json!({
        "connectionId": designer.connection_id(),
        "relationships": designer.wire_relationships(),
        "selectedColumns": designer.selected_columns(),
        "edges": designer.edges(),
        "nodes": designer.nodes(),
        "rejections": rejections,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("joinery=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = DesignerConfig::from_env();
    tracing::info!(
        "Config loaded: storage_dir={}, strict_types={}",
        config.has_storage_dir(),
        config.strict_type_check
    );

    let session = match std::env::args().nth(1).or_else(|| std::env::var("JOINERY_SESSION").ok()) {
        Some(path) => {
            tracing::info!("Replaying session {}", path);
            serde_json::from_str(&std::fs::read_to_string(&path)?)?
        }
        None => {
            tracing::info!("No session file given, replaying suggestions on the demo schema");
            demo_session()
        }
    };

    match config.storage_dir.clone() {
        Some(dir) => run(session, &config, FileStore::new(dir)),
        None => run(session, &config, MemoryStore::new()),
    }
}
