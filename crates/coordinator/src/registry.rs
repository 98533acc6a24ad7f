//! Registry of active handlers and their lifecycle.
//!
//! Read-mostly after startup: diagnosis traffic takes the read lock, while
//! registration and teardown take the write lock for an exclusive pass.

use automed_common::{AutoMedError, Handler, HandlerRole, HandlerState, Result, TeardownFailure};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// A registered handler and the role it was registered under.
#[derive(Clone)]
pub struct RegistryEntry {
    pub role: HandlerRole,
    pub handler: Arc<dyn Handler>,
}

/// Point-in-time view of one registered handler.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerSummary {
    pub id: String,
    pub role: HandlerRole,
    pub state: HandlerState,
}

/// Holds every active handler in registration order.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: RwLock<Vec<RegistryEntry>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate a handler, start it, and register it under `role`.
    ///
    /// The handler is only stored once `start` has completed. A colliding
    /// identifier is rejected before the new handler is started.
    pub async fn register<F, H>(&self, role: HandlerRole, factory: F) -> Result<String>
    where
        F: FnOnce() -> H,
        H: Handler + 'static,
    {
        self.register_handler(role, Arc::new(factory())).await
    }

    /// Start and register an already constructed handler.
    pub async fn register_handler(
        &self,
        role: HandlerRole,
        handler: Arc<dyn Handler>,
    ) -> Result<String> {
        let mut entries = self.entries.write().await;
        let id = handler.id().to_string();

        if entries.iter().any(|e| e.handler.id() == id) {
            warn!(agent_name = %id, "Rejecting duplicate handler registration");
            return Err(AutoMedError::DuplicateHandler(id));
        }

        handler
            .start()
            .await
            .map_err(|e| AutoMedError::HandlerSetup {
                handler: id.clone(),
                reason: e.to_string(),
            })?;

        entries.push(RegistryEntry { role, handler });
        info!(agent_name = %id, role = %role, "Specialist agent initialized");
        Ok(id)
    }

    /// Register a batch of handlers, starting them concurrently.
    ///
    /// All-or-nothing: on a duplicate id nothing is started, and if any
    /// `start` fails the handlers that did start are stopped again.
    pub async fn register_all(
        &self,
        batch: Vec<(HandlerRole, Arc<dyn Handler>)>,
    ) -> Result<Vec<String>> {
        let mut entries = self.entries.write().await;

        let mut seen: HashSet<String> = entries
            .iter()
            .map(|e| e.handler.id().to_string())
            .collect();
        for (_, handler) in &batch {
            if !seen.insert(handler.id().to_string()) {
                return Err(AutoMedError::DuplicateHandler(handler.id().to_string()));
            }
        }

        // Start everything concurrently, then join in batch order
        let handles: Vec<_> = batch
            .iter()
            .map(|(_, handler)| {
                let handler = handler.clone();
                tokio::spawn(async move { handler.start().await })
            })
            .collect();

        let mut first_failure = None;
        let mut started = Vec::new();
        for ((_, handler), handle) in batch.iter().zip(handles) {
            let outcome = match handle.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(join_err) => Err(format!("start task aborted: {}", join_err)),
            };
            match outcome {
                Ok(()) => started.push(handler.clone()),
                Err(reason) => {
                    error!(agent_name = %handler.id(), error = %reason, "Handler failed to start");
                    first_failure.get_or_insert(AutoMedError::HandlerSetup {
                        handler: handler.id().to_string(),
                        reason,
                    });
                }
            }
        }

        if let Some(err) = first_failure {
            let failures = stop_concurrently(started).await;
            for failure in &failures {
                warn!(
                    agent_name = %failure.handler_id,
                    error = %failure.reason,
                    "Rollback stop failed"
                );
            }
            return Err(err);
        }

        let mut ids = Vec::with_capacity(batch.len());
        for (role, handler) in batch {
            info!(agent_name = %handler.id(), role = %role, "Specialist agent initialized");
            ids.push(handler.id().to_string());
            entries.push(RegistryEntry { role, handler });
        }

        info!(active_specialists = ?ids, "Handler registration complete");
        Ok(ids)
    }

    /// Stop and remove a single handler.
    pub async fn deregister(&self, id: &str) -> Result<()> {
        let entry = {
            let mut entries = self.entries.write().await;
            let pos = entries
                .iter()
                .position(|e| e.handler.id() == id)
                .ok_or_else(|| AutoMedError::HandlerNotFound(id.to_string()))?;
            entries.remove(pos)
        };

        entry.handler.stop().await?;
        info!(agent_name = %id, "Handler deregistered");
        Ok(())
    }

    /// Stop every handler concurrently and clear the registry.
    ///
    /// Every handler's `stop` is awaited even if others fail or panic; the
    /// failures are reported together afterwards. Returns how many handlers
    /// were stopped cleanly.
    pub async fn deregister_all(&self) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let handlers: Vec<_> = entries.drain(..).map(|e| e.handler).collect();
        let total = handlers.len();

        info!(handler_count = total, "Stopping all handlers");
        let failures = stop_concurrently(handlers).await;

        if failures.is_empty() {
            Ok(total)
        } else {
            for failure in &failures {
                error!(
                    agent_name = %failure.handler_id,
                    error = %failure.reason,
                    "Handler failed to stop"
                );
            }
            Err(AutoMedError::RegistryTeardown(failures))
        }
    }

    /// Registered identifiers, in registration order.
    pub async fn list_identifiers(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| e.handler.id().to_string())
            .collect()
    }

    /// First handler registered under `role`, if any.
    pub async fn lookup_by_role(&self, role: HandlerRole) -> Option<Arc<dyn Handler>> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.role == role)
            .map(|e| e.handler.clone())
    }

    /// Every handler registered under `role`, in registration order.
    pub async fn handlers_with_role(&self, role: HandlerRole) -> Vec<Arc<dyn Handler>> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.role == role)
            .map(|e| e.handler.clone())
            .collect()
    }

    pub async fn snapshot(&self) -> Vec<HandlerSummary> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| HandlerSummary {
                id: e.handler.id().to_string(),
                role: e.role,
                state: e.handler.state(),
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Call `stop` on every handler concurrently and collect what went wrong.
async fn stop_concurrently(handlers: Vec<Arc<dyn Handler>>) -> Vec<TeardownFailure> {
    let handles: Vec<_> = handlers
        .into_iter()
        .map(|handler| {
            let id = handler.id().to_string();
            (id, tokio::spawn(async move { handler.stop().await }))
        })
        .collect();

    let mut failures = Vec::new();
    for (handler_id, handle) in handles {
        let reason = match handle.await {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e.to_string(),
            Err(join_err) => format!("stop task aborted: {}", join_err),
        };
        failures.push(TeardownFailure { handler_id, reason });
    }
    failures
}
