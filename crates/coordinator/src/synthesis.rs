//! Aggregation of handler findings into the final report.
//!
//! Everything here is a pure function of its inputs: no state, no I/O. The
//! overall confidence and notes are fixed placeholders until a real scoring
//! model replaces them.

use automed_common::{AggregateReport, Finding, HandlerKind, RequestContext, Synthesis};
use tracing::info;

pub const DEFAULT_TRIAGE: &str =
    "Mock Triage: Review by a human telemedicine provider is recommended.";
pub const CARDIAC_TRIAGE: &str =
    "Mock Triage: Potential cardiac concern noted. Prioritize human review.";

const OVERALL_CONFIDENCE: f64 = 0.1;
const CONSOLIDATED_HYPOTHESES: &str = "Multiple mock hypotheses - see summary.";
const NOTES: &str = "This is a mock synthesis from Phase 2. LLM reasoning will be added later.";

/// A triage rule: the recommendation applies when `matches` holds for the findings.
#[derive(Clone, Copy)]
pub struct TriageRule {
    pub name: &'static str,
    pub matches: fn(&[Finding]) -> bool,
    pub recommendation: &'static str,
}

/// A cardiology finding that mentions chest pain. Keyed on the specialty the
/// finding reports, so configured handler ids do not affect it.
fn cardiac_chest_pain(findings: &[Finding]) -> bool {
    let cardiology = HandlerKind::Cardiology.specialty();
    findings.iter().any(|f| {
        f.specialty.as_deref() == Some(cardiology)
            && f.hypothesis.to_lowercase().contains("chest pain")
    })
}

/// Rules in priority order; the first match wins.
pub const TRIAGE_RULES: &[TriageRule] = &[TriageRule {
    name: "cardiac_chest_pain",
    matches: cardiac_chest_pain,
    recommendation: CARDIAC_TRIAGE,
}];

/// Folds the primary assessment and specialist findings into one report.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// Build the aggregate report for one request.
    pub fn aggregate(
        &self,
        ctx: &RequestContext,
        primary: Finding,
        findings: Vec<Finding>,
        coordinator_id: &str,
    ) -> AggregateReport {
        let synthesis = self.synthesize(ctx, &findings);

        AggregateReport {
            case_id: ctx.request_id().to_string(),
            initial_assessment: primary,
            specialist_assessments: findings,
            synthesis,
            coordinating_agent: coordinator_id.to_string(),
            omitted_handlers: Vec::new(),
        }
    }

    /// Summarize the specialist findings and pick a triage recommendation.
    pub fn synthesize(&self, ctx: &RequestContext, findings: &[Finding]) -> Synthesis {
        info!(
            patient_id = %ctx.request_id(),
            num_specialist_reports = findings.len(),
            "Synthesizing findings"
        );

        let overall_summary = summarize(ctx, findings);
        let triage = triage_recommendation(findings);

        info!(
            patient_id = %ctx.request_id(),
            triage_recommendation = %triage,
            summary_preview = %overall_summary.chars().take(200).collect::<String>(),
            "Synthesis complete"
        );

        Synthesis {
            patient_id: ctx.request_id().to_string(),
            overall_summary,
            consolidated_hypotheses_mock: CONSOLIDATED_HYPOTHESES.into(),
            triage_recommendation_mock: triage.into(),
            confidence_overall_mock: OVERALL_CONFIDENCE,
            notes: NOTES.into(),
        }
    }
}

/// Human-readable summary: header, then one block per finding.
pub fn summarize(ctx: &RequestContext, findings: &[Finding]) -> String {
    let mut parts = vec![
        format!(
            "Central Reasoning Mock Summary for Patient ID: {}",
            ctx.request_id()
        ),
        format!("Original Symptoms: {}", ctx.symptoms()),
        "\n--- Specialist Agent Reports ---".to_string(),
    ];

    if findings.is_empty() {
        parts.push("No specialist agent reports were provided.".into());
    }

    for finding in findings {
        let confidence = finding
            .reported_confidence()
            .map(|c| format!("{:?}", c))
            .unwrap_or_else(|| "N/A".into());
        parts.push(format!(
            "\nReport from {}:\n  Hypothesis: {}\n  Confidence: {}\n  Details: {}",
            finding.handler_id, finding.hypothesis, confidence, finding.details
        ));
    }

    parts.join("\n")
}

/// Apply [`TRIAGE_RULES`] in order, falling back to [`DEFAULT_TRIAGE`].
pub fn triage_recommendation(findings: &[Finding]) -> &'static str {
    TRIAGE_RULES
        .iter()
        .find(|rule| (rule.matches)(findings))
        .map(|rule| rule.recommendation)
        .unwrap_or(DEFAULT_TRIAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RequestContext {
        RequestContext::with_request_id("case-7", "severe chest pain")
    }

    fn cardio(hypothesis: &str) -> Finding {
        Finding::new("CardioBotMock", hypothesis)
            .with_specialty("Cardiology")
            .with_confidence(0.3)
    }

    #[test]
    fn test_empty_findings_say_so() {
        let summary = summarize(&ctx(), &[]);
        assert!(summary.starts_with("Central Reasoning Mock Summary for Patient ID: case-7\n"));
        assert!(summary.contains("Original Symptoms: severe chest pain"));
        assert!(summary.ends_with(
            "--- Specialist Agent Reports ---\nNo specialist agent reports were provided."
        ));
    }

    #[test]
    fn test_summary_block_per_finding() {
        let findings = vec![
            cardio("heart ok").with_details("mock"),
            Finding::new("NeuroBotMock", "brain ok"),
        ];
        let summary = summarize(&ctx(), &findings);

        assert!(summary.contains(
            "\nReport from CardioBotMock:\n  Hypothesis: heart ok\n  Confidence: 0.3\n  Details: mock"
        ));
        assert!(summary.contains("Report from NeuroBotMock:\n  Hypothesis: brain ok\n  Confidence: N/A"));
        assert!(!summary.contains("No specialist agent reports"));
    }

    #[test]
    fn test_confidence_falls_back_to_mock_field() {
        let mut finding = Finding::new("Legacy", "h");
        finding.confidence_mock = Some(0.55);
        assert!(summarize(&ctx(), &[finding]).contains("Confidence: 0.55"));
    }

    #[test]
    fn test_cardiac_rule_ignores_handler_id() {
        let renamed = Finding::new("cardio-1", "Noted 'chest pain'").with_specialty("Cardiology");
        assert_eq!(triage_recommendation(&[renamed]), CARDIAC_TRIAGE);
    }

    #[test]
    fn test_cardiac_rule_case_insensitive() {
        assert_eq!(triage_recommendation(&[cardio("Noted CHEST Pain")]), CARDIAC_TRIAGE);
    }

    #[test]
    fn test_cardiac_rule_requires_cardiac_handler() {
        let other = Finding::new("NeuroBotMock", "chest pain mentioned");
        assert_eq!(triage_recommendation(&[other]), DEFAULT_TRIAGE);
        // Borrowing the cardiology id does not make a finding cardiac
        let impostor = Finding::new("CardioBotMock", "chest pain mentioned");
        assert_eq!(triage_recommendation(&[impostor]), DEFAULT_TRIAGE);
        assert_eq!(triage_recommendation(&[cardio("all clear")]), DEFAULT_TRIAGE);
        assert_eq!(triage_recommendation(&[]), DEFAULT_TRIAGE);
    }

    #[test]
    fn test_aggregate_fills_report() {
        let primary = Finding::new("gp-1", "Initial assessment in progress");
        let report = Aggregator::new().aggregate(
            &ctx(),
            primary.clone(),
            vec![cardio("chest pain noted")],
            "central-coordinator",
        );

        assert_eq!(report.case_id, "case-7");
        assert_eq!(report.initial_assessment, primary);
        assert_eq!(report.specialist_assessments.len(), 1);
        assert_eq!(report.synthesis.patient_id, "case-7");
        assert_eq!(report.synthesis.triage_recommendation_mock, CARDIAC_TRIAGE);
        assert_eq!(report.synthesis.confidence_overall_mock, 0.1);
        assert_eq!(report.coordinating_agent, "central-coordinator");

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("omitted_handlers").is_none());
        assert!(json["synthesis"]["overall_summary"].is_string());
    }

    #[test]
    fn test_primary_is_not_part_of_summary_or_triage() {
        // Only specialist findings feed the summary and the triage rules
        let report = Aggregator::new().aggregate(
            &ctx(),
            cardio("chest pain"),
            Vec::new(),
            "central-coordinator",
        );
        assert_eq!(report.synthesis.triage_recommendation_mock, DEFAULT_TRIAGE);
        assert!(report.synthesis.overall_summary.contains("No specialist agent reports"));
    }
}
