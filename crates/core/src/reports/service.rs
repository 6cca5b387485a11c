//! Read models: summaries, exports and analytics.

use chrono::Utc;
use rust_decimal::Decimal;
use tradeflow_shared::types::{PageRequest, PageResponse, TransactionId};

use super::types::{AnalyticsOverview, RiskDistribution, TransactionReport, TransactionSummary};
use crate::actor::{Actor, Role};
use crate::audit::{AuditAction, AuditLogEntry, EntityType};
use crate::engine::TradeEngine;
use crate::error::{EngineError, EngineResult};
use crate::ledger::LedgerSubject;
use crate::policy::{Operation, Standing, access};
use crate::risk::{RiskLevel, RiskScore};
use crate::store::{AuditStore, StoreTransaction, TradeStore, TransactionFilter};
use crate::workflow::types::{TradeTransaction, TransactionStatus};

/// Statuses on the bank's work queue.
const BANK_QUEUE: [TransactionStatus; 2] = [TransactionStatus::PoCreated, TransactionStatus::PoShipped];

/// Service for building read models.
pub struct ReportService;

impl ReportService {
    /// Portfolio totals from all transactions and risk snapshots.
    #[must_use]
    pub fn overview(transactions: &[TradeTransaction], scores: &[RiskScore]) -> AnalyticsOverview {
        let total = count(transactions.len());
        let completed = count(
            transactions
                .iter()
                .filter(|t| t.status == TransactionStatus::PoCompleted)
                .count(),
        );
        let high = count(scores.iter().filter(|s| s.level == RiskLevel::High).count());

        let average_risk_score = if scores.is_empty() {
            Decimal::ZERO
        } else {
            let sum: Decimal = scores.iter().map(|s| Decimal::from(s.score)).sum();
            (sum / Decimal::from(count(scores.len()))).round_dp(1)
        };

        AnalyticsOverview {
            total_transactions: total,
            completed_transactions: completed,
            pending_transactions: total - completed,
            high_risk_count: high,
            average_risk_score,
        }
    }

    /// Snapshot counts per level.
    #[must_use]
    pub fn distribution(scores: &[RiskScore]) -> RiskDistribution {
        scores
            .iter()
            .fold(RiskDistribution::default(), |mut acc, score| {
                match score.level {
                    RiskLevel::Low => acc.low += 1,
                    RiskLevel::Medium => acc.medium += 1,
                    RiskLevel::High => acc.high += 1,
                }
                acc
            })
    }
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

impl<S: TradeStore, A: AuditStore> TradeEngine<S, A> {
    async fn summary_in(
        &self,
        tx: &mut S::Tx,
        transaction: TradeTransaction,
    ) -> EngineResult<TransactionSummary> {
        let documents = tx.list_documents(transaction.id).await?;
        let ledger = tx.list_ledger(LedgerSubject::Transaction(transaction.id)).await?;
        let latest_risk = tx.latest_risk_score(transaction.id).await?;
        Ok(TransactionSummary {
            transaction,
            documents,
            ledger,
            latest_risk,
        })
    }

    /// Transaction with documents, ledger and latest risk.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound`
    /// - `Forbidden` if the actor may not read the transaction
    #[tracing::instrument(skip_all, fields(actor_id = %actor.id, role = %actor.role, transaction_id = %id))]
    pub async fn transaction_summary(
        &self,
        actor: Actor,
        id: TransactionId,
    ) -> EngineResult<TransactionSummary> {
        self.run("transaction_summary", async {
            let mut tx = self.store.begin().await?;
            let transaction = tx
                .find_transaction(id)
                .await?
                .ok_or(EngineError::TransactionNotFound(id))?;
            access::require(&actor, Operation::Read, Standing::of(&actor, &transaction), false)?;
            let summary = self.summary_in(&mut tx, transaction).await?;
            tx.rollback().await?;
            Ok(summary)
        })
        .await
    }

    /// Transactions visible to the actor, newest first.
    ///
    /// Buyers see their own, banks their work queue (`PO_CREATED` and
    /// `PO_SHIPPED`), auditors and admins everything.
    ///
    /// # Errors
    ///
    /// - `Forbidden` for sellers
    pub async fn list_transactions(&self, actor: Actor) -> EngineResult<Vec<TradeTransaction>> {
        self.run("list_transactions", async {
            access::require(&actor, Operation::List, Standing::Portfolio, false)?;
            let filter = match actor.role {
                Role::Buyer => TransactionFilter::buyer(actor.id),
                Role::Bank => TransactionFilter::statuses(&BANK_QUEUE),
                _ => TransactionFilter::all(),
            };
            let mut tx = self.store.begin().await?;
            let list = tx.list_transactions(&filter).await?;
            tx.rollback().await?;
            Ok(list)
        })
        .await
    }

    /// Read-only export of a transaction. Records an `EXPORT` audit entry.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound`
    /// - `Forbidden` if the actor may not export this transaction
    #[tracing::instrument(skip_all, fields(actor_id = %actor.id, role = %actor.role, transaction_id = %id))]
    pub async fn export_report(
        &self,
        actor: Actor,
        id: TransactionId,
    ) -> EngineResult<TransactionReport> {
        let summary = self
            .run("export", async {
                let mut tx = self.store.begin().await?;
                let transaction = tx
                    .find_transaction(id)
                    .await?
                    .ok_or(EngineError::TransactionNotFound(id))?;
                access::require(
                    &actor,
                    Operation::Export,
                    Standing::of(&actor, &transaction),
                    self.settings.export_unassigned_to_bank,
                )?;
                let summary = self.summary_in(&mut tx, transaction).await?;
                tx.rollback().await?;
                Ok(summary)
            })
            .await?;

        self.audit
            .log(actor.id, AuditAction::Export, EntityType::Transaction, id)
            .await;
        Ok(TransactionReport {
            summary,
            exported_by: actor.id,
            exported_at: Utc::now(),
        })
    }

    /// Portfolio totals.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is a bank, auditor or admin
    pub async fn analytics_overview(&self, actor: Actor) -> EngineResult<AnalyticsOverview> {
        self.run("analytics_overview", async {
            access::require(&actor, Operation::ViewAnalytics, Standing::Portfolio, false)?;
            let mut tx = self.store.begin().await?;
            let transactions = tx.list_transactions(&TransactionFilter::all()).await?;
            let scores = tx.list_risk_scores().await?;
            tx.rollback().await?;
            Ok(ReportService::overview(&transactions, &scores))
        })
        .await
    }

    /// Risk snapshot counts per level.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is a bank, auditor or admin
    pub async fn risk_distribution(&self, actor: Actor) -> EngineResult<RiskDistribution> {
        self.run("risk_distribution", async {
            access::require(&actor, Operation::ViewAnalytics, Standing::Portfolio, false)?;
            let mut tx = self.store.begin().await?;
            let scores = tx.list_risk_scores().await?;
            tx.rollback().await?;
            Ok(ReportService::distribution(&scores))
        })
        .await
    }

    /// The `limit` highest risk snapshots.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is a bank, auditor or admin
    pub async fn top_risks(&self, actor: Actor, limit: usize) -> EngineResult<Vec<RiskScore>> {
        self.run("top_risks", async {
            access::require(&actor, Operation::ViewAnalytics, Standing::Portfolio, false)?;
            let mut tx = self.store.begin().await?;
            let mut scores = tx.list_risk_scores().await?;
            tx.rollback().await?;
            scores.truncate(limit);
            Ok(scores)
        })
        .await
    }

    /// Audit entries, newest first.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is an auditor or admin
    pub async fn list_audit_logs(
        &self,
        actor: Actor,
        page: PageRequest,
    ) -> EngineResult<PageResponse<AuditLogEntry>> {
        self.run("list_audit_logs", async {
            access::require(&actor, Operation::ViewAuditLogs, Standing::Portfolio, false)?;
            let (entries, total) = self.audit.store().list(page).await?;
            Ok(PageResponse::new(entries, page, total))
        })
        .await
    }
}
