//! General practitioner - initial assessment of every case.

use crate::specialist::SpecialistCore;
use async_trait::async_trait;
use automed_common::{Finding, FindingFlags, Handler, HandlerState, RequestContext, Result};
use serde_json::{Map, Value};

const SPECIALTY: &str = "GeneralPractitioner";

/// Primary assessor that decides whether a case needs emergency escalation.
///
/// Without red-flag phrases configured it never asks for escalation.
pub struct GeneralPractitionerAgent {
    core: SpecialistCore,
    red_flags: Vec<String>,
}

impl GeneralPractitionerAgent {
    pub fn new() -> Self {
        Self::with_id(SpecialistCore::generated_id(SPECIALTY))
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        let state = HandlerState::new(SPECIALTY).with_expertise([
            "general medicine",
            "initial assessment",
            "triage",
        ]);

        Self {
            core: SpecialistCore::new(id, state),
            red_flags: Vec::new(),
        }
    }

    /// Phrases that make the assessment request emergency care (case-insensitive).
    pub fn with_red_flags<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.red_flags = phrases
            .into_iter()
            .map(|p| p.into().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    fn needs_emergency_care(&self, symptoms: &str) -> bool {
        let lower = symptoms.to_lowercase();
        self.red_flags.iter().any(|flag| lower.contains(flag))
    }
}

impl Default for GeneralPractitionerAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for GeneralPractitionerAgent {
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

        let finding = Finding::new(self.id(), "Initial assessment in progress")
            .with_specialty(SPECIALTY)
            .with_confidence(0.0)
            .with_details("Analyzing reported symptoms")
            .with_actions(["Await specialist consultation"])
            .with_flags(FindingFlags {
                needs_emergency_care: Some(self.needs_emergency_care(ctx.symptoms())),
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
