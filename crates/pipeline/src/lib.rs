//! The request pipeline: one inbound URL in, exactly one terminal outcome
//! out, with progress relayed to a single progressively-edited status
//! message along the way.

pub mod access;
pub mod orchestrator;
pub mod outcome;
pub mod relay;
pub mod surface;

pub use {
    access::is_authorized,
    orchestrator::Orchestrator,
    outcome::{FailureKind, RequestFailure, RequestOutcome},
    relay::{ProgressDisplay, ProgressRelay, ProgressSink},
    surface::{ChatSurface, MessageRef},
};
