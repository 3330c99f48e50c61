// enact-core/src/application/mod.rs

pub mod dispatcher;
pub mod runner;
pub mod runtime;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Cela permet à une action de faire :
// `use enact_core::application::{Action, ActionRuntime, run_action_with};`
// sans avoir à connaître la structure interne des fichiers.

pub use dispatcher::WriteOptions;
pub use runner::{Action, ActionDescriptor, ActionReport, run_action, run_action_with};
pub use runtime::{ActionRuntime, ActionRuntimeBuilder, CONFIG_BINDING, INPUTS_DIR_VAR};
