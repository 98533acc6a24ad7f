//! Emergency medicine - consulted only for escalated cases.

use crate::specialist::SpecialistCore;
use async_trait::async_trait;
use automed_common::{Finding, FindingFlags, Handler, HandlerState, RequestContext, Result};
use serde_json::{Map, Value};

const SPECIALTY: &str = "EmergencyMedicine";

/// Escalation handler for urgent cases.
pub struct EmergencyMedicineAgent {
    core: SpecialistCore,
}

impl EmergencyMedicineAgent {
    pub fn new() -> Self {
        Self::with_id(SpecialistCore::generated_id(SPECIALTY))
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        let state = HandlerState::new(SPECIALTY).with_expertise([
            "emergency care",
            "urgent assessment",
            "critical care",
        ]);

        Self {
            core: SpecialistCore::new(id, state),
        }
    }
}

impl Default for EmergencyMedicineAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for EmergencyMedicineAgent {
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

        let finding = Finding::new(self.id(), "Emergency assessment in progress")
            .with_specialty(SPECIALTY)
            .with_confidence(0.0)
            .with_details("Evaluating emergency status")
            .with_actions(Vec::<String>::new())
            .with_flags(FindingFlags {
                emergency_response_needed: Some(false),
                ..Default::default()
            });

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
