//! # Completion Relay Core
//!
//! Shared types and traits for the completion relay.
//!
//! This crate provides:
//! - The request/response data model for text completions
//! - Session context and agent envelope types
//! - The seams between components: [`CompletionBackend`], [`MockStrategy`]
//!   and [`WorkflowObserver`]
//! - Workflow progress events and observer fan-out

pub mod events;
pub mod traits;
pub mod types;

pub use events::{ChannelObserver, ObserverSet, WorkflowEvent};
pub use traits::{CompletionBackend, MockStrategy, TextStream, WorkflowObserver};
pub use types::{
    CompletionRequest, CompletionResponse, Envelope, EnvelopeError, EnvelopeType, HistoryEntry,
    ResponseSource, Role, SessionContext, Sourced, Usage
};
