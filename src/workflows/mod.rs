// Workflow orchestration modules
// The run lifecycle and the pieces it is assembled from.

pub mod prompt;
pub mod scope;
pub mod state_machine;


pub use prompt::{AutoApprove, Confirmation, TerminalPrompt};
pub use scope::MacroScope;
pub use state_machine::{PriorRun, RunOrchestrator, RunOutcome, RunPhase, RunReport};
