//! The coordinator that drives one diagnosis request through its handlers.
//!
//! ```text
//! Started ─► PrimaryAssessed ─► ParallelCollected ─► [EscalationCollected] ─► Synthesized ─► Completed
//!    └──────────────┴──────────────────┴──────────────────────┴──────────────────┴──► Failed
//! ```

use crate::config::CoordinatorConfig;
use crate::registry::HandlerRegistry;
use crate::synthesis::Aggregator;
use automed_common::{
    AggregateReport, AutoMedError, Finding, Handler, HandlerRole, InteractionPhase, RequestContext,
    Result,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Where a diagnosis request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisStage {
    Started,
    PrimaryAssessed,
    ParallelCollected,
    EscalationCollected,
    Synthesized,
    Completed,
    Failed,
}

/// A request that ended in [`DiagnosisStage::Failed`].
#[derive(Debug, thiserror::Error)]
#[error("diagnosis request {request_id} failed after {stage:?}: {error}")]
pub struct DiagnosisFailure {
    pub request_id: String,
    /// Last stage the request reached before failing
    pub stage: DiagnosisStage,
    #[source]
    pub error: AutoMedError,
}

impl DiagnosisFailure {
    pub fn code(&self) -> &'static str {
        self.error.code()
    }
}

/// Counters exposed for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoordinatorStats {
    pub in_flight: u64,
    pub total_handled: u64,
    pub total_failed: u64,
}

/// Decrements the in-flight counter however the request ends, including
/// when the request future is dropped mid-flight.
struct InFlightGuard<'a>(&'a AtomicU64);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicU64) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Orchestrates diagnosis requests across the registered handlers.
pub struct Coordinator {
    id: String,
    registry: Arc<HandlerRegistry>,
    aggregator: Aggregator,
    handler_timeout: Duration,
    in_flight: AtomicU64,
    total_handled: AtomicU64,
    total_failed: AtomicU64,
}

impl Coordinator {
    pub fn new(config: &CoordinatorConfig, registry: Arc<HandlerRegistry>) -> Self {
        info!(
            coordinator_id = %config.coordinator_id,
            handler_timeout_ms = config.handler_timeout_ms,
            "Initializing Central Coordinator Agent"
        );

        Self {
            id: config.coordinator_id.clone(),
            registry,
            aggregator: Aggregator::new(),
            handler_timeout: config.handler_timeout(),
            in_flight: AtomicU64::new(0),
            total_handled: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            in_flight: self.in_flight.load(Ordering::SeqCst),
            total_handled: self.total_handled.load(Ordering::SeqCst),
            total_failed: self.total_failed.load(Ordering::SeqCst),
        }
    }

    /// Identifiers of every registered handler.
    pub async fn active_specialists(&self) -> Vec<String> {
        self.registry.list_identifiers().await
    }

    /// Diagnose `symptoms` under a freshly generated request id.
    pub async fn diagnose(
        &self,
        symptoms: &str,
    ) -> std::result::Result<AggregateReport, DiagnosisFailure> {
        self.process(RequestContext::new(symptoms)).await
    }

    /// Run one request through every stage.
    pub async fn process(
        &self,
        ctx: RequestContext,
    ) -> std::result::Result<AggregateReport, DiagnosisFailure> {
        let _guard = InFlightGuard::enter(&self.in_flight);
        let mut stage = DiagnosisStage::Started;

        debug!(
            patient_id = %ctx.request_id(),
            symptoms_length = ctx.symptoms().len(),
            "Diagnosis request started"
        );

        match self.run_stages(&ctx, &mut stage).await {
            Ok(report) => {
                self.total_handled.fetch_add(1, Ordering::SeqCst);
                info!(
                    patient_id = %ctx.request_id(),
                    stage = ?DiagnosisStage::Completed,
                    num_specialist_assessments = report.specialist_assessments.len(),
                    triage_recommendation = %report.synthesis.triage_recommendation_mock,
                    "Diagnosis process complete"
                );
                Ok(report)
            }
            Err(error) => {
                self.total_failed.fetch_add(1, Ordering::SeqCst);
                error!(
                    patient_id = %ctx.request_id(),
                    stage = ?stage,
                    code = error.code(),
                    error = %error,
                    "Diagnosis request failed"
                );
                Err(DiagnosisFailure {
                    request_id: ctx.request_id().to_string(),
                    stage,
                    error,
                })
            }
        }
    }

    async fn run_stages(
        &self,
        ctx: &RequestContext,
        stage: &mut DiagnosisStage,
    ) -> Result<AggregateReport> {
        // Primary assessment: missing handler or failed call is fatal
        let primary = self
            .registry
            .lookup_by_role(HandlerRole::PrimaryAssessor)
            .await
            .ok_or(AutoMedError::NoPrimaryAssessor)?;
        let initial_assessment = self.invoke(primary, ctx).await?;
        *stage = DiagnosisStage::PrimaryAssessed;

        // Parallel specialists: failures are dropped from the report
        let specialists = self
            .registry
            .handlers_with_role(HandlerRole::ParallelSpecialist)
            .await;
        let (mut findings, mut omitted) = self.fan_out(specialists, ctx).await;
        *stage = DiagnosisStage::ParallelCollected;

        if initial_assessment.needs_escalation()
            && self.escalate(ctx, &mut findings, &mut omitted).await
        {
            *stage = DiagnosisStage::EscalationCollected;
        }

        let mut report = self
            .aggregator
            .aggregate(ctx, initial_assessment, findings, &self.id);
        report.omitted_handlers = omitted;
        *stage = DiagnosisStage::Synthesized;

        Ok(report)
    }

    /// Consult the escalation handler, appending its finding on success.
    ///
    /// Returns whether an escalation finding was collected. A missing or
    /// failing escalation handler never fails the request.
    async fn escalate(
        &self,
        ctx: &RequestContext,
        findings: &mut Vec<Finding>,
        omitted: &mut Vec<String>,
    ) -> bool {
        let Some(handler) = self.registry.lookup_by_role(HandlerRole::Escalation).await else {
            warn!(
                patient_id = %ctx.request_id(),
                "Escalation requested but no escalation handler is registered"
            );
            return false;
        };

        let handler_id = handler.id().to_string();
        match self.invoke(handler, ctx).await {
            Ok(finding) => {
                findings.push(finding);
                true
            }
            Err(e) => {
                warn!(
                    patient_id = %ctx.request_id(),
                    agent_name = %handler_id,
                    error = %e,
                    "Escalation handler failed, continuing without it"
                );
                omitted.push(handler_id);
                false
            }
        }
    }

    /// Invoke every handler concurrently; join in the order given.
    async fn fan_out(
        &self,
        handlers: Vec<Arc<dyn Handler>>,
        ctx: &RequestContext,
    ) -> (Vec<Finding>, Vec<String>) {
        let calls: Vec<_> = handlers
            .into_iter()
            .map(|handler| {
                let id = handler.id().to_string();
                (id, self.invoke(handler, ctx))
            })
            .collect();

        let mut findings = Vec::with_capacity(calls.len());
        let mut omitted = Vec::new();
        for (id, call) in calls {
            match call.await {
                Ok(finding) => findings.push(finding),
                Err(e) => {
                    warn!(
                        patient_id = %ctx.request_id(),
                        agent_name = %id,
                        error = %e,
                        "Specialist failed, omitting its finding"
                    );
                    omitted.push(id);
                }
            }
        }
        (findings, omitted)
    }

    /// Start one handler call on its own task, bounded by the handler timeout.
    ///
    /// The task is spawned eagerly, so calls made back to back run
    /// concurrently. If the returned future is dropped the spawned call is
    /// left to finish on its own.
    fn invoke(
        &self,
        handler: Arc<dyn Handler>,
        ctx: &RequestContext,
    ) -> impl std::future::Future<Output = Result<Finding>> + Send + 'static {
        let handler_id = handler.id().to_string();
        let task_ctx = ctx.clone();
        let ctx = ctx.clone();
        let timeout = self.handler_timeout;

        let handle = tokio::spawn(async move { handler.produce_finding(&task_ctx).await });

        async move {
            let reason = match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(Ok(finding))) => return Ok(finding),
                Ok(Ok(Err(e))) => e.to_string(),
                Ok(Err(join_err)) => format!("handler task aborted: {}", join_err),
                Err(_) => format!("timed out after {}ms", timeout.as_millis()),
            };

            ctx.record(
                &handler_id,
                InteractionPhase::Failed,
                &json!({ "error": reason }),
            );
            Err(AutoMedError::invocation(handler_id, reason))
        }
    }
}
