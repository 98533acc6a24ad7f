//! Specialist handlers for AutoMed.
//!
//! - **General practitioner**: primary assessor, may request escalation
//! - **Emergency medicine**: escalation handler
//! - **Cardiology / Neurology / Orthopedics**: parallel mock specialists
//!
//! Every handler is a deterministic stub keyed off substring checks on the
//! symptom text. They share identity, state and interaction logging through
//! [`SpecialistCore`].

pub mod cardiology;
pub mod emergency;
pub mod general_practitioner;
pub mod neurology;
pub mod orthopedics;
pub mod specialist;

use automed_common::{Handler, HandlerKind};
use std::sync::Arc;

pub use cardiology::{CARDIOLOGY_HANDLER_ID, CardioBotMock};
pub use emergency::EmergencyMedicineAgent;
pub use general_practitioner::GeneralPractitionerAgent;
pub use neurology::{NEUROLOGY_HANDLER_ID, NeuroBotMock};
pub use orthopedics::{ORTHOPEDICS_HANDLER_ID, OrthoBotMock};
pub use specialist::SpecialistCore;

/// Per-instance overrides applied when building a handler from configuration.
#[derive(Debug, Clone, Default)]
pub struct HandlerOptions {
    /// Replaces the handler's default identifier
    pub id: Option<String>,
    /// Escalation phrases; only meaningful for the general practitioner
    pub red_flags: Vec<String>,
}

/// Instantiate the handler implementation for `kind`.
pub fn build_handler(kind: HandlerKind, options: &HandlerOptions) -> Arc<dyn Handler> {
    let id = options.id.clone();
    match kind {
        HandlerKind::GeneralPractitioner => {
            let agent = match id {
                Some(id) => GeneralPractitionerAgent::with_id(id),
                None => GeneralPractitionerAgent::new(),
            };
            Arc::new(agent.with_red_flags(options.red_flags.iter().cloned()))
        }
        HandlerKind::EmergencyMedicine => Arc::new(match id {
            Some(id) => EmergencyMedicineAgent::with_id(id),
            None => EmergencyMedicineAgent::new(),
        }),
        HandlerKind::Cardiology => Arc::new(match id {
            Some(id) => CardioBotMock::with_id(id),
            None => CardioBotMock::new(),
        }),
        HandlerKind::Neurology => Arc::new(match id {
            Some(id) => NeuroBotMock::with_id(id),
            None => NeuroBotMock::new(),
        }),
        HandlerKind::Orthopedics => Arc::new(match id {
            Some(id) => OrthoBotMock::with_id(id),
            None => OrthoBotMock::new(),
        }),
    }
}
