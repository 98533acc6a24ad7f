//! Behaviour shared by every specialist handler.
//!
//! Each concrete handler owns a [`SpecialistCore`] which keeps its identity,
//! its private [`HandlerState`] and the interaction logging around a case.

use automed_common::{Finding, HandlerState, InteractionPhase, RequestContext};
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use tracing::info;

/// Identity and state of one specialist handler.
pub struct SpecialistCore {
    id: String,
    state: Mutex<HandlerState>,
}

impl SpecialistCore {
    pub fn new(id: impl Into<String>, state: HandlerState) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(state),
        }
    }

    /// Build an identifier of the form `<specialty>-<8 hex chars>`.
    pub fn generated_id(specialty: &str) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}", specialty.to_lowercase(), &suffix[..8])
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn specialty(&self) -> String {
        self.state.lock().specialty.clone()
    }

    pub fn state(&self) -> HandlerState {
        self.state.lock().clone()
    }

    pub fn merge(&self, patch: Map<String, Value>) {
        let rejected = self.state.lock().merge(patch);
        if !rejected.is_empty() {
            tracing::warn!(
                agent_name = %self.id,
                keys = ?rejected,
                "Ignoring state keys that shadow built-in fields"
            );
        }
        tracing::debug!(agent_name = %self.id, "Agent state updated");
    }

    /// Count a new case and record the input the handler received.
    pub fn begin_case(&self, ctx: &RequestContext) -> u64 {
        let handled = {
            let mut state = self.state.lock();
            state.cases_handled += 1;
            state.cases_handled
        };

        ctx.record(
            &self.id,
            InteractionPhase::Received,
            &json!({ "symptoms": ctx.symptoms(), "kwargs": ctx.params() }),
        );

        handled
    }

    /// Record the finding the handler is about to return.
    pub fn finish_case(&self, ctx: &RequestContext, finding: &Finding) {
        let output = serde_json::to_value(finding).unwrap_or(Value::Null);
        ctx.record(&self.id, InteractionPhase::Produced, &output);
    }

    pub fn log_start(&self) {
        let state = self.state.lock();
        info!(
            agent_name = %self.id,
            specialty = %state.specialty,
            expertise_areas = ?state.expertise_areas,
            "Initializing specialist agent"
        );
    }

    pub fn log_stop(&self) {
        let state = self.state.lock();
        info!(
            agent_name = %self.id,
            specialty = %state.specialty,
            cases_handled = state.cases_handled,
            "Cleaning up specialist agent"
        );
    }
}

/// First `n` characters of `text`, for echoing symptoms back in hypotheses.
pub(crate) fn preview(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}
