//! Mock orthopedics specialist for musculoskeletal symptoms.

use crate::specialist::{SpecialistCore, preview};
use async_trait::async_trait;
use automed_common::{Finding, Handler, HandlerState, RequestContext, Result};
use serde_json::{Map, Value};

pub const ORTHOPEDICS_HANDLER_ID: &str = "OrthoBotMock";

pub struct OrthoBotMock {
    core: SpecialistCore,
}

impl OrthoBotMock {
    pub fn new() -> Self {
        Self::with_id(ORTHOPEDICS_HANDLER_ID)
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            core: SpecialistCore::new(id, HandlerState::new("Orthopedics")),
        }
    }
}

impl Default for OrthoBotMock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for OrthoBotMock {
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
        let indicator = if lower.contains("knee pain") || lower.contains("joint pain") {
            "Possible musculoskeletal issue noted by mock."
        } else {
            "No obvious orthopedic indicators from mock."
        };
        let hypothesis = format!(
            "Mock orthopedic check for symptoms: '{}...'. {}",
            preview(symptoms, 50),
            indicator
        );

        let finding = Finding::new(self.id(), hypothesis)
            .with_confidence(0.2)
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
