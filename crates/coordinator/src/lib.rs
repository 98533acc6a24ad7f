//! Diagnosis coordinator for AutoMed.
//!
//! The coordinator is the orchestration core that:
//! 1. Keeps the registry of specialist handlers and their lifecycle
//! 2. Sends each request to the primary assessor
//! 3. Fans out to every parallel specialist concurrently
//! 4. Consults the escalation handler when the primary assessor asks for it
//! 5. Folds all findings into one aggregate report
//!
//! # Architecture
//!
//! ```text
//! Diagnosis Request
//!      │
//!      ▼
//! ┌─────────────────┐
//! │   Coordinator   │  ◄── HandlerRegistry (roles)
//! │   (this crate)  │
//! └────────┬────────┘
//!          │
//!    ┌─────┴──────┬──────────┬──────────┐
//!    ▼            ▼          ▼          ▼
//! [Primary]   [Cardio]   [Neuro]    [Ortho]     ──► [Escalation]?
//!    │            │          │          │                │
//!    └────────────┴────┬─────┴──────────┴────────────────┘
//!                      ▼
//!                 Aggregator
//! ```

pub mod config;
pub mod diagnosis;
pub mod registry;
pub mod synthesis;

pub use config::{CoordinatorConfig, HandlerSpec};
pub use diagnosis::{Coordinator, CoordinatorStats, DiagnosisFailure, DiagnosisStage};
pub use registry::{HandlerRegistry, HandlerSummary, RegistryEntry};
pub use synthesis::{Aggregator, CARDIAC_TRIAGE, DEFAULT_TRIAGE, TRIAGE_RULES, TriageRule};
