//! Configuration for the coordinator.
//!
//! Which handlers are registered, and in which role, is an explicit list of
//! `[[handlers]]` entries rather than something inferred from handler types.

use automed_common::{HandlerKind, HandlerRole};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Main coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Identifier reported as `coordinating_agent`
    #[serde(default = "default_coordinator_id")]
    pub coordinator_id: String,

    /// Upper bound on a single handler invocation, in milliseconds
    #[serde(default = "default_handler_timeout")]
    pub handler_timeout_ms: u64,

    /// Handlers to register at startup, in registration order
    #[serde(default = "default_handlers")]
    pub handlers: Vec<HandlerSpec>,
}

/// One handler to register and the role it plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSpec {
    pub role: HandlerRole,

    pub kind: HandlerKind,

    /// Override the handler's default identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Phrases that make a primary assessor request escalation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub red_flags: Vec<String>,
}

impl HandlerSpec {
    pub fn new(role: HandlerRole, kind: HandlerKind) -> Self {
        Self {
            role,
            kind,
            id: None,
            red_flags: Vec::new(),
        }
    }
}

fn default_coordinator_id() -> String {
    "central-coordinator".into()
}

fn default_handler_timeout() -> u64 {
    5000
}

fn default_handlers() -> Vec<HandlerSpec> {
    vec![
        HandlerSpec::new(HandlerRole::PrimaryAssessor, HandlerKind::GeneralPractitioner),
        HandlerSpec::new(HandlerRole::Escalation, HandlerKind::EmergencyMedicine),
        HandlerSpec::new(HandlerRole::ParallelSpecialist, HandlerKind::Cardiology),
        HandlerSpec::new(HandlerRole::ParallelSpecialist, HandlerKind::Neurology),
        HandlerSpec::new(HandlerRole::ParallelSpecialist, HandlerKind::Orthopedics),
    ]
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            coordinator_id: default_coordinator_id(),
            handler_timeout_ms: default_handler_timeout(),
            handlers: default_handlers(),
        }
    }
}

impl CoordinatorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the registry would refuse anyway.
    ///
    /// Checks explicit ids for duplicates and requires a non-zero timeout.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.handler_timeout_ms == 0 {
            anyhow::bail!("handler_timeout_ms must be greater than zero");
        }

        let mut seen = HashSet::new();
        for spec in &self.handlers {
            if let Some(id) = &spec.id {
                if !seen.insert(id.as_str()) {
                    anyhow::bail!("handler id '{}' is configured more than once", id);
                }
            }
        }

        if !self
            .handlers
            .iter()
            .any(|spec| spec.role == HandlerRole::PrimaryAssessor)
        {
            tracing::warn!("No primary assessor configured; every diagnosis request will fail");
        }

        Ok(())
    }

    pub fn handler_timeout(&self) -> Duration {
        Duration::from_millis(self.handler_timeout_ms)
    }
}
