//! External change listener
//!
//! Watches the store's change feed and applies writes made by other contexts
//! to the engine. If the feed lags, individual values are lost, so the
//! listener falls back to a full reload from the store.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::engine::TaxonomyEngine;
use crate::store::StoreChange;

pub struct ExternalChangeListener {
    engine: Arc<TaxonomyEngine>,
    changes: broadcast::Receiver<StoreChange>,
    shutdown: CancellationToken,
}

impl ExternalChangeListener {
    /// Subscribe to the store feed immediately, so no write made after this
    /// call is missed even if `run` starts later
    pub fn new(engine: Arc<TaxonomyEngine>, shutdown: CancellationToken) -> Self {
        let changes = engine.repository().store().changes();
        Self {
            engine,
            changes,
            shutdown,
        }
    }

    /// Run until cancelled or the store feed closes
    pub async fn run(mut self) {
        tracing::info!(
            key = %self.engine.repository().document_key(),
            context = %self.engine.repository().store().context_id(),
            "External change listener started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("External change listener shutting down");
                    break;
                }

                result = self.changes.recv() => {
                    match result {
                        Ok(change) => {
                            self.engine.handle_store_change(&change);
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "External change listener lagged, reloading taxonomy");
                            if let Err(e) = self.engine.reload() {
                                tracing::error!(error = %e, "Recovery reload failed");
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Store change feed closed, listener stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}
