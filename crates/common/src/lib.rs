//! Common types and traits shared across AutoMed crates.
//!
//! This crate provides the handler contract, the findings handlers produce
//! and the error taxonomy every layer reports through.

pub mod context;
pub mod error;
pub mod finding;
pub mod traits;

pub use context::{Interaction, InteractionPhase, InteractionSink, RequestContext, TracingSink};
pub use error::{AutoMedError, Result, TeardownFailure};
pub use finding::{AggregateReport, Finding, FindingFlags, Synthesis};
pub use traits::{Handler, HandlerKind, HandlerRole, HandlerState};
