//! Mock cardiology specialist for heart-related symptoms.

use crate::specialist::{SpecialistCore, preview};
use async_trait::async_trait;
use automed_common::{Finding, Handler, HandlerKind, HandlerState, RequestContext, Result};
use serde_json::{Map, Value};

pub const CARDIOLOGY_HANDLER_ID: &str = "CardioBotMock";

pub struct CardioBotMock {
    core: SpecialistCore,
}

impl CardioBotMock {
    pub fn new() -> Self {
        Self::with_id(CARDIOLOGY_HANDLER_ID)
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            core: SpecialistCore::new(id, HandlerState::new(HandlerKind::Cardiology.specialty())),
        }
    }
}

impl Default for CardioBotMock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for CardioBotMock {
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
        let mut hypothesis = format!(
            "Mock cardiac assessment for symptoms: '{}...'. No immediate red flags detected by mock.",
            preview(symptoms, 50)
        );
        if symptoms.to_lowercase().contains("chest pain") {
            hypothesis.push_str(" Noted 'chest pain', further evaluation recommended if real.");
        }

        let finding = Finding::new(self.id(), hypothesis)
            .with_specialty(HandlerKind::Cardiology.specialty())
            .with_confidence(0.3)
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
