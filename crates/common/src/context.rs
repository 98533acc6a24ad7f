//! Per-request context threaded through the coordinator and every handler call.

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Which side of a handler call an interaction record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionPhase {
    /// Input received by the handler
    Received,
    /// Output produced by the handler
    Produced,
    /// The handler gave up on the input
    Failed,
}

/// A structured record of one handler interaction.
#[derive(Debug, Clone, Serialize)]
pub struct Interaction<'a> {
    pub request_id: &'a str,
    pub handler_id: &'a str,
    pub phase: InteractionPhase,
    pub payload: &'a Value,
}

/// Destination for handler interaction records.
///
/// Handlers never log interactions through a global; they go through the
/// sink carried by the [`RequestContext`] so tests can capture them.
pub trait InteractionSink: Send + Sync {
    fn record(&self, interaction: &Interaction<'_>);
}

/// Default sink that emits interactions as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl InteractionSink for TracingSink {
    fn record(&self, interaction: &Interaction<'_>) {
        match interaction.phase {
            InteractionPhase::Received => debug!(
                patient_id = %interaction.request_id,
                agent_name = %interaction.handler_id,
                input = %interaction.payload,
                "Interaction for patient_id: {}",
                interaction.request_id
            ),
            InteractionPhase::Produced => info!(
                patient_id = %interaction.request_id,
                agent_name = %interaction.handler_id,
                output = %interaction.payload,
                "Interaction for patient_id: {}",
                interaction.request_id
            ),
            InteractionPhase::Failed => error!(
                patient_id = %interaction.request_id,
                agent_name = %interaction.handler_id,
                detail = %interaction.payload,
                "Interaction for patient_id: {}",
                interaction.request_id
            ),
        }
    }
}

/// Request identifier, symptom text and extras for one diagnosis request.
///
/// Created once at the request boundary and never mutated afterwards; each
/// handler invocation receives its own clone.
#[derive(Clone)]
pub struct RequestContext {
    request_id: String,
    symptoms: String,
    params: Map<String, Value>,
    sink: Arc<dyn InteractionSink>,
}

impl RequestContext {
    /// Create a context with a freshly generated request id.
    pub fn new(symptoms: impl Into<String>) -> Self {
        Self::with_request_id(uuid::Uuid::new_v4().to_string(), symptoms)
    }

    pub fn with_request_id(request_id: impl Into<String>, symptoms: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            symptoms: symptoms.into(),
            params: Map::new(),
            sink: Arc::new(TracingSink),
        }
    }

    /// Attach handler-specific extra parameters.
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Route interaction records to a different sink.
    pub fn with_sink(mut self, sink: Arc<dyn InteractionSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn symptoms(&self) -> &str {
        &self.symptoms
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Record an interaction for `handler_id` through this request's sink.
    pub fn record(&self, handler_id: &str, phase: InteractionPhase, payload: &Value) {
        self.sink.record(&Interaction {
            request_id: &self.request_id,
            handler_id,
            phase,
            payload,
        });
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("symptoms", &self.symptoms)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<(String, String, InteractionPhase)>>);

    impl InteractionSink for Capture {
        fn record(&self, interaction: &Interaction<'_>) {
            self.0.lock().push((
                interaction.request_id.to_string(),
                interaction.handler_id.to_string(),
                interaction.phase,
            ));
        }
    }

    #[test]
    fn test_new_context_gets_unique_ids() {
        let a = RequestContext::new("cough");
        let b = RequestContext::new("cough");
        assert_ne!(a.request_id(), b.request_id());
        assert_eq!(a.symptoms(), "cough");
        assert!(a.params().is_empty());
    }

    #[test]
    fn test_record_goes_through_injected_sink() {
        let capture = Arc::new(Capture::default());
        let ctx = RequestContext::with_request_id("req-1", "headache")
            .with_sink(capture.clone() as Arc<dyn InteractionSink>);

        ctx.record("NeuroBotMock", InteractionPhase::Received, &Value::Null);
        ctx.clone()
            .record("NeuroBotMock", InteractionPhase::Produced, &Value::Null);

        let seen = capture.0.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "req-1");
        assert_eq!(seen[1].2, InteractionPhase::Produced);
    }
}
