//! Application state for the API server.

use automed_agents::{HandlerOptions, build_handler};
use automed_common::Result;
use automed_coordinator::{Coordinator, CoordinatorConfig, HandlerRegistry};
use std::sync::Arc;
use tracing::info;

/// Shared application state for the API server.
pub struct AppState {
    /// The coordinator every diagnosis request goes through
    pub coordinator: Arc<Coordinator>,

    /// Server start time (for health checks)
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build the configured handlers, start them and wire up the coordinator.
    pub async fn new(config: CoordinatorConfig) -> Result<Self> {
        let registry = Arc::new(HandlerRegistry::new());

        let batch = config
            .handlers
            .iter()
            .map(|spec| {
                let options = HandlerOptions {
                    id: spec.id.clone(),
                    red_flags: spec.red_flags.clone(),
                };
                (spec.role, build_handler(spec.kind, &options))
            })
            .collect();
        let ids = registry.register_all(batch).await?;
        info!(handler_count = ids.len(), "Registered configured handlers");

        Ok(Self::with_coordinator(Arc::new(Coordinator::new(
            &config, registry,
        ))))
    }

    /// Wrap an already assembled coordinator.
    pub fn with_coordinator(coordinator: Arc<Coordinator>) -> Self {
        Self {
            coordinator,
            start_time: std::time::Instant::now(),
        }
    }

    /// Get the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Stop every registered handler.
    pub async fn shutdown(&self) -> Result<usize> {
        self.coordinator.registry().deregister_all().await
    }
}
