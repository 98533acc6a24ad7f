//! Core handler trait and role tags.
//!
//! These live in `automed-common` so that both the coordinator and the
//! agents crate can reference them without circular dependencies.

use crate::{Finding, RequestContext, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The part a handler plays in a diagnosis request.
///
/// Assigned when the handler is registered; the coordinator routes by role,
/// never by concrete handler type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerRole {
    /// Assesses every case first and decides whether escalation is needed
    PrimaryAssessor,
    /// Always consulted, independently of the primary assessment
    ParallelSpecialist,
    /// Consulted only when the primary assessor raises its flag
    Escalation,
}

impl std::fmt::Display for HandlerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PrimaryAssessor => "primary_assessor",
            Self::ParallelSpecialist => "parallel_specialist",
            Self::Escalation => "escalation",
        };
        f.write_str(name)
    }
}

/// Concrete handler implementations available to the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    GeneralPractitioner,
    EmergencyMedicine,
    Cardiology,
    Neurology,
    Orthopedics,
}

impl HandlerKind {
    /// Specialty name reported in handler state and on findings.
    pub fn specialty(self) -> &'static str {
        match self {
            Self::GeneralPractitioner => "GeneralPractitioner",
            Self::EmergencyMedicine => "EmergencyMedicine",
            Self::Cardiology => "Cardiology",
            Self::Neurology => "Neurology",
            Self::Orthopedics => "Orthopedics",
        }
    }
}

/// Keys owned by [`HandlerState`]'s own fields; never accepted into `extra`.
const RESERVED_STATE_KEYS: &[&str] = &["specialty", "expertise_areas", "cases_handled"];

/// Per-handler bookkeeping, owned and mutated only by its handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerState {
    pub specialty: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expertise_areas: Vec<String>,

    pub cases_handled: u64,

    /// Free-form entries merged in via [`Handler::merge_state`]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HandlerState {
    pub fn new(specialty: impl Into<String>) -> Self {
        Self {
            specialty: specialty.into(),
            ..Default::default()
        }
    }

    pub fn with_expertise<I, S>(mut self, areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expertise_areas = areas.into_iter().map(Into::into).collect();
        self
    }

    /// Merge `patch` into the free-form entries, overwriting existing keys.
    ///
    /// Keys naming one of the typed fields are dropped so the flattened
    /// JSON never carries the same key twice. Returns the dropped keys.
    pub fn merge(&mut self, patch: Map<String, Value>) -> Vec<String> {
        let mut rejected = Vec::new();
        for (key, value) in patch {
            if RESERVED_STATE_KEYS.contains(&key.as_str()) {
                rejected.push(key);
            } else {
                self.extra.insert(key, value);
            }
        }
        rejected
    }
}

/// The capability every specialist handler implements.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Get the handler's unique identifier.
    fn id(&self) -> &str;

    /// Acquire whatever the handler needs before it can produce findings.
    async fn start(&self) -> Result<()>;

    /// Release the handler's resources.
    async fn stop(&self) -> Result<()>;

    /// Produce this handler's finding for one request.
    ///
    /// Increments the handler's own cases-handled counter and nothing else.
    async fn produce_finding(&self, ctx: &RequestContext) -> Result<Finding>;

    /// Snapshot of the handler's current state.
    fn state(&self) -> HandlerState;

    /// Merge free-form entries into the handler's state.
    fn merge_state(&self, patch: Map<String, Value>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_matches_display() {
        for role in [
            HandlerRole::PrimaryAssessor,
            HandlerRole::ParallelSpecialist,
            HandlerRole::Escalation,
        ] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role));
        }
    }

    #[test]
    fn test_state_merge_overwrites_and_flattens() {
        let mut state = HandlerState::new("Cardiology");
        state.merge(serde_json::json!({"model": "v1"}).as_object().cloned().unwrap());
        state.merge(serde_json::json!({"model": "v2", "warm": true}).as_object().cloned().unwrap());

        assert_eq!(state.extra["model"], "v2");
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["warm"], true);
        assert_eq!(json["cases_handled"], 0);
        assert!(json.get("expertise_areas").is_none());
    }

    #[test]
    fn test_state_merge_drops_typed_field_keys() {
        let mut state = HandlerState::new("Cardiology");
        let rejected = state.merge(
            serde_json::json!({"cases_handled": 99, "specialty": "x", "on_call": true})
                .as_object()
                .cloned()
                .unwrap(),
        );

        assert_eq!(rejected.len(), 2);
        assert!(rejected.contains(&"cases_handled".to_string()));
        assert!(rejected.contains(&"specialty".to_string()));
        assert_eq!(state.cases_handled, 0);
        assert_eq!(state.specialty, "Cardiology");

        let text = serde_json::to_string(&state).unwrap();
        assert_eq!(text.matches("\"cases_handled\"").count(), 1);
        assert_eq!(text.matches("\"specialty\"").count(), 1);
        assert!(text.contains("\"on_call\":true"));
    }

    #[test]
    fn test_kind_specialty_names() {
        assert_eq!(HandlerKind::Cardiology.specialty(), "Cardiology");
        assert_eq!(HandlerKind::GeneralPractitioner.specialty(), "GeneralPractitioner");
    }
}
