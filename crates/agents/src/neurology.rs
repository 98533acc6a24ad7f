//! Mock neurology specialist for neurological symptoms.

use crate::specialist::{SpecialistCore, preview};
use async_trait::async_trait;
use automed_common::{Finding, Handler, HandlerState, RequestContext, Result};
use serde_json::{Map, Value};

pub const NEUROLOGY_HANDLER_ID: &str = "NeuroBotMock";

pub struct NeuroBotMock {
    core: SpecialistCore,
}

impl NeuroBotMock {
    pub fn new() -> Self {
        Self::with_id(NEUROLOGY_HANDLER_ID)
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            core: SpecialistCore::new(id, HandlerState::new("Neurology")),
        }
    }
}

impl Default for NeuroBotMock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for NeuroBotMock {
    fn id(&self) -> &str {
        self.core.id()
    }

    async fn start(&self) -> Result<()> {
        self.core.log_start();
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.core.log_stop();
        Ok(())
    }

    async fn produce_finding(&self, ctx: &RequestContext) -> Result<Finding> {
        self.core.begin_case(ctx);

        let symptoms = ctx.symptoms();
        let lower = symptoms.to_lowercase();
        let mut hypothesis = format!(
            "Mock neurological evaluation for symptoms: '{}...'. No specific neurological concerns from mock.",
            preview(symptoms, 50)
        );
        // Headache takes precedence over dizziness
        if lower.contains("headache") {
            hypothesis.push_str(" Noted 'headache'.");
        } else if lower.contains("dizziness") {
            hypothesis.push_str(" Noted 'dizziness'.");
        }

        let finding = Finding::new(self.id(), hypothesis)
            .with_confidence(0.25)
            .with_details(format!("This is a mock response from {}.", self.id()));

        self.core.finish_case(ctx, &finding);
        Ok(finding)
    }

    fn state(&self) -> HandlerState {
        self.core.state()
    }

    fn merge_state(&self, patch: Map<String, Value>) {
        self.core.merge(patch);
    }
}
