//! # Workflow Orchestrator
//!
//! Runs ordered steps against either a direct completion backend or the
//! remote agent, reporting every step in one uniform shape.

pub mod orchestrator;
pub mod workflow;

pub use orchestrator::Orchestrator;
pub use workflow::{StepOutcome, StepResult, StepStatus, WorkflowResult, WorkflowStep};
