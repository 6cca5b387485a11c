//! The trade engine: one entry point for every workflow operation.
//!
//! Operations are split by concern across `workflow::service`,
//! `document::service` and `reports::service`; each adds an `impl` block to
//! [`TradeEngine`]. Every public operation runs in one store transaction
//! under a deadline. A missed deadline surfaces as
//! [`EngineError::Transient`], and the dropped store transaction leaves no
//! trace. Audit writes happen after that deadline has been met, under their
//! own, so a slow audit store can only delay a committed result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tradeflow_shared::EngineConfig;

use crate::audit::AuditTrail;
use crate::error::{EngineError, EngineResult};
use crate::risk::RiskEngine;
use crate::storage::StorageService;
use crate::store::{AuditStore, TradeStore};

/// Runtime settings for the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Deadline for one operation, store calls included.
    pub operation_timeout: Duration,
    /// Deadline for one audit write.
    pub audit_timeout: Duration,
    /// Lets a bank export a transaction without an assigned seller.
    pub export_unassigned_to_bank: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl EngineSettings {
    /// Settings derived from configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            operation_timeout: Duration::from_millis(config.workflow.store_timeout_ms),
            audit_timeout: Duration::from_millis(config.workflow.audit_timeout_ms),
            export_unassigned_to_bank: config.workflow.export_unassigned_to_bank,
        }
    }

    /// Override the operation deadline.
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Override the audit write deadline.
    #[must_use]
    pub fn with_audit_timeout(mut self, timeout: Duration) -> Self {
        self.audit_timeout = timeout;
        self
    }

    /// Override the export policy for unassigned transactions.
    #[must_use]
    pub fn with_export_unassigned_to_bank(mut self, allow: bool) -> Self {
        self.export_unassigned_to_bank = allow;
        self
    }
}

/// Trade-finance workflow engine.
pub struct TradeEngine<S, A> {
    pub(crate) store: Arc<S>,
    pub(crate) audit: AuditTrail<A>,
    pub(crate) storage: Arc<StorageService>,
    pub(crate) risk: RiskEngine,
    pub(crate) settings: EngineSettings,
}

impl<S: TradeStore, A: AuditStore> TradeEngine<S, A> {
    /// Builds an engine from configuration.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        audit_store: Arc<A>,
        storage: Arc<StorageService>,
        config: &EngineConfig,
    ) -> Self {
        let settings = EngineSettings::from_config(config);
        Self {
            store,
            audit: AuditTrail::new(audit_store, settings.audit_timeout),
            storage,
            risk: RiskEngine::from_settings(&config.risk),
            settings,
        }
    }

    /// Replaces the runtime settings.
    #[must_use]
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.audit = self.audit.with_timeout(settings.audit_timeout);
        self.settings = settings;
        self
    }

    /// Replaces the risk model.
    #[must_use]
    pub fn with_risk_engine(mut self, risk: RiskEngine) -> Self {
        self.risk = risk;
        self
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The store this engine writes to.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs `op` under the operation deadline.
    ///
    /// `op` must end at its commit; audit writes belong after `run` returns.
    pub(crate) async fn run<T, F>(&self, operation: &'static str, op: F) -> EngineResult<T>
    where
        F: Future<Output = EngineResult<T>>,
    {
        match tokio::time::timeout(self.settings.operation_timeout, op).await {
            Ok(result) => result,
            Err(_) => {
                let ms = self.settings.operation_timeout.as_millis();
                tracing::warn!(operation, timeout_ms = %ms, "operation timed out");
                Err(EngineError::Transient(format!(
                    "{operation} timed out after {ms}ms"
                )))
            }
        }
    }
}
