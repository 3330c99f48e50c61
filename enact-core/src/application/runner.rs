// enact-core/src/application/runner.rs

// The process-level orchestrator: builds a runtime from an action's
// descriptor, engages the hosted context when the launch arguments call for
// it, runs the action, and reports. User-facing progress prints live here
// and nowhere deeper.

use std::sync::Arc;

use crate::application::runtime::{ActionRuntime, ActionRuntimeBuilder};
use crate::domain::dataset::Dataset;
use crate::domain::schema::TableCollection;
use crate::error::EnactError;
use crate::ports::DatabaseStore;

/// What an action declares about itself before anything runs: a name, the
/// schema bindings it will address, and optionally config tables with their
/// default contents.
pub struct ActionDescriptor {
    pub name: String,
    pub bindings: Vec<(String, TableCollection)>,
    pub config_tables: Option<TableCollection>,
    pub config_defaults: Option<Dataset>,
}

impl ActionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
            config_tables: None,
            config_defaults: None,
        }
    }

    pub fn with_binding(mut self, name: impl Into<String>, tables: TableCollection) -> Self {
        self.bindings.push((name.into(), tables));
        self
    }

    pub fn with_config(mut self, tables: TableCollection, defaults: Option<Dataset>) -> Self {
        self.config_tables = Some(tables);
        self.config_defaults = defaults;
        self
    }
}

/// A plug-in transformation program. Implementations declare their shape
/// once and do all their I/O through the runtime they are handed.
pub trait Action {
    fn descriptor(&self) -> ActionDescriptor;
    fn execute(&mut self, runtime: &mut ActionRuntime) -> Result<(), EnactError>;
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ActionReport {
    pub action: String,
    pub context: String,
    pub scenario: Option<String>,
    pub started_at: String,
    pub duration_secs: f64,
    pub success: bool,
    pub errors: Vec<String>,
}

/// Runs an action against the real process environment (`std::env::args`),
/// without a database collaborator. Hosts that can reach a database use
/// [`run_action_with`] instead.
pub fn run_action(action: &mut dyn Action) -> Result<ActionReport, EnactError> {
    let args: Vec<String> = std::env::args().collect();
    run_action_with(action, &args, None)
}

pub fn run_action_with(
    action: &mut dyn Action,
    args: &[String],
    database_store: Option<Arc<dyn DatabaseStore>>,
) -> Result<ActionReport, EnactError> {
    // A second run in the same process keeps the first subscriber.
    let _ = tracing_subscriber::fmt::try_init();

    let descriptor = action.descriptor();
    println!("🚀 Starting action '{}'...", descriptor.name);
    let started_at = chrono::Utc::now().to_rfc3339();
    let start_time = std::time::Instant::now();

    // 1. SETUP (descriptor -> runtime)
    let mut runtime = runtime_for(descriptor, database_store)?;

    // 2. CONTEXT DETECTION
    if runtime.bootstrap_hosted(args) {
        println!(
            "🔌 Hosted context engaged (scenario '{}')",
            runtime.scenario().unwrap_or_default()
        );
    } else {
        println!("📁 Local context.");
    }

    // 3. EXECUTION
    let outcome = action.execute(&mut runtime);

    // 4. REPORT
    // An action failure is an outcome, not a runner failure; only building
    // the runtime can error out of this function.
    let duration = start_time.elapsed();
    let mut errors = Vec::new();
    match outcome {
        Ok(()) => {
            println!(
                "✨ Done in {:.2}s. Action '{}' succeeded.",
                duration.as_secs_f64(),
                runtime.action_name()
            );
        }
        Err(error) => {
            eprintln!("❌ Action '{}' failed: {}", runtime.action_name(), error);
            errors.push(error.to_string());
        }
    }

    Ok(ActionReport {
        action: runtime.action_name().to_string(),
        context: runtime.context().to_string(),
        scenario: runtime.scenario().map(String::from),
        started_at,
        duration_secs: duration.as_secs_f64(),
        success: errors.is_empty(),
        errors,
    })
}

// --- HELPER FUNCTIONS ---

fn runtime_for(
    descriptor: ActionDescriptor,
    database_store: Option<Arc<dyn DatabaseStore>>,
) -> Result<ActionRuntime, EnactError> {
    let mut builder = ActionRuntimeBuilder::new(descriptor.name);
    for (name, tables) in descriptor.bindings {
        builder = builder.with_binding(name, tables);
    }
    if let Some(tables) = descriptor.config_tables {
        builder = builder.with_config(tables, descriptor.config_defaults);
    }
    if let Some(store) = database_store {
        builder = builder.with_database_store(store);
    }
    builder.build()
}
