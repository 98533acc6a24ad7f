//! Findings produced by handlers and the report assembled from them.

use serde::{Deserialize, Serialize};

/// Structured flags a handler may attach to its finding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingFlags {
    /// Raised by the primary assessor when the case should be escalated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_emergency_care: Option<bool>,

    /// Reported by the escalation handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_response_needed: Option<bool>,
}

/// One handler's output for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier of the handler that produced this finding
    #[serde(rename = "agent_name")]
    pub handler_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,

    pub hypothesis: String,

    /// Confidence score, 0.0 - 1.0 by convention
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Alternate confidence field some handlers report instead of `confidence`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_mock: Option<f64>,

    #[serde(default)]
    pub details: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_actions: Option<Vec<String>>,

    #[serde(flatten)]
    pub flags: FindingFlags,
}

impl Finding {
    pub fn new(handler_id: impl Into<String>, hypothesis: impl Into<String>) -> Self {
        Self {
            handler_id: handler_id.into(),
            specialty: None,
            hypothesis: hypothesis.into(),
            confidence: None,
            confidence_mock: None,
            details: String::new(),
            recommended_actions: None,
            flags: FindingFlags::default(),
        }
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recommended_actions = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_flags(mut self, flags: FindingFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Whether the producing handler asked for the escalation handler to be consulted.
    pub fn needs_escalation(&self) -> bool {
        self.flags.needs_emergency_care.unwrap_or(false)
    }

    /// Confidence as reported, preferring `confidence` over `confidence_mock`.
    pub fn reported_confidence(&self) -> Option<f64> {
        self.confidence.or(self.confidence_mock)
    }
}

/// Synthesized summary section of an [`AggregateReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    pub patient_id: String,
    pub overall_summary: String,
    pub consolidated_hypotheses_mock: String,
    pub triage_recommendation_mock: String,
    pub confidence_overall_mock: f64,
    pub notes: String,
}

/// The coordinator's final, request-scoped output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub case_id: String,
    pub initial_assessment: Finding,
    pub specialist_assessments: Vec<Finding>,
    pub synthesis: Synthesis,
    pub coordinating_agent: String,

    /// Handlers whose finding was dropped because the invocation failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omitted_handlers: Vec<String>,
}
