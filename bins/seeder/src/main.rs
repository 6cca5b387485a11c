//! Demo data seeder for Tradeflow.
//!
//! Drives a handful of trades through the engine so local databases have
//! transactions in every lifecycle state, verified documents, ledger history
//! and risk snapshots.
//!
//! Usage:
//!   seeder            - Seed the database from configuration
//!   seeder --memory   - Run the same flow against the in-memory store

use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tradeflow_core::document::{DocumentAction, DocumentType, UploadDocumentInput};
use tradeflow_core::storage::{StorageConfig, StorageService};
use tradeflow_core::store::{AuditStore, MemoryStore, TradeStore};
use tradeflow_core::workflow::CreateTransactionInput;
use tradeflow_core::{Actor, Role, TradeEngine};
use tradeflow_db::{SeaOrmAuditStore, SeaOrmStore};
use tradeflow_shared::EngineConfig;
use tradeflow_shared::types::{ActorId, CurrencyCode, TransactionId};

/// How far a seeded trade is driven.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Created,
    Approved,
    Shipped,
    Completed,
}

struct Trade {
    po_number: &'static str,
    amount: i64,
    country: &'static str,
    stage: Stage,
}

const TRADES: &[Trade] = &[
    Trade {
        po_number: "PO-2026-0001",
        amount: 45_000,
        country: "US",
        stage: Stage::Completed,
    },
    Trade {
        po_number: "PO-2026-0002",
        amount: 2_400_000,
        country: "NG",
        stage: Stage::Completed,
    },
    Trade {
        po_number: "PO-2026-0003",
        amount: 180_000,
        country: "GB",
        stage: Stage::Shipped,
    },
    Trade {
        po_number: "PO-2026-0004",
        amount: 12_500,
        country: "DE",
        stage: Stage::Approved,
    },
    Trade {
        po_number: "PO-2026-0005",
        amount: 730_000,
        country: "US",
        stage: Stage::Created,
    },
];

struct Cast {
    buyer: Actor,
    seller: Actor,
    bank: Actor,
    auditor: Actor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradeflow=info,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::load().context("Failed to load configuration")?;
    let storage = Arc::new(
        StorageService::from_config(StorageConfig::from(&config.storage))
            .context("Failed to initialize document storage")?,
    );

    if std::env::args().any(|arg| arg == "--memory") {
        info!("Seeding in-memory store");
        let store = Arc::new(MemoryStore::new());
        let engine = TradeEngine::new(Arc::clone(&store), store, storage, &config);
        return seed(&engine).await;
    }

    let db = tradeflow_db::connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");
    let engine = TradeEngine::new(
        Arc::new(SeaOrmStore::new(db.clone())),
        Arc::new(SeaOrmAuditStore::new(db)),
        storage,
        &config,
    );
    seed(&engine).await
}

async fn seed<S: TradeStore, A: AuditStore>(engine: &TradeEngine<S, A>) -> anyhow::Result<()> {
    let cast = Cast {
        buyer: Actor::new(ActorId::new(), Role::Buyer),
        seller: Actor::new(ActorId::new(), Role::Seller),
        bank: Actor::new(ActorId::new(), Role::Bank),
        auditor: Actor::new(ActorId::new(), Role::Auditor),
    };

    for trade in TRADES {
        let id = seed_trade(engine, &cast, trade)
            .await
            .with_context(|| format!("Failed to seed {}", trade.po_number))?;
        info!(po_number = trade.po_number, transaction_id = %id, stage = ?trade.stage, "Seeded trade");
    }

    let overview = engine.analytics_overview(cast.auditor).await?;
    info!(
        total = overview.total_transactions,
        completed = overview.completed_transactions,
        high_risk = overview.high_risk_count,
        average_score = %overview.average_risk_score,
        "Seeding complete"
    );
    Ok(())
}

async fn seed_trade<S: TradeStore, A: AuditStore>(
    engine: &TradeEngine<S, A>,
    cast: &Cast,
    trade: &Trade,
) -> anyhow::Result<TransactionId> {
    let transaction = engine
        .create_transaction(
            cast.buyer,
            CreateTransactionInput {
                amount: Decimal::from(trade.amount),
                currency: CurrencyCode::USD,
                seller_id: Some(cast.seller.id),
                buyer_country: Some(trade.country.to_string()),
                po_number: trade.po_number.to_string(),
                po_content: format!("Purchase order {}", trade.po_number).into_bytes(),
            },
        )
        .await?;
    let id = transaction.id;

    let summary = engine.transaction_summary(cast.buyer, id).await?;
    if let Some(po) = summary.documents.first() {
        engine
            .perform_action(cast.buyer, po.id, DocumentAction::Amend, json!({ "note": "final quantities" }))
            .await?;
        engine.verify_document(cast.auditor, po.id).await?;
    }
    if matches!(trade.stage, Stage::Created) {
        return Ok(id);
    }

    engine.approve(cast.bank, id).await?;
    if matches!(trade.stage, Stage::Approved) {
        return Ok(id);
    }

    let suffix = trade.po_number.trim_start_matches("PO-");
    for doc_type in [DocumentType::Invoice, DocumentType::BillOfLading] {
        let doc_number = format!("{}-{suffix}", doc_type.as_str());
        let document = engine
            .upload_document(
                cast.seller,
                UploadDocumentInput {
                    transaction_id: id,
                    doc_type,
                    content: format!("{doc_type} {doc_number}").into_bytes(),
                    doc_number,
                },
            )
            .await?;
        engine.verify_document(cast.bank, document.id).await?;
    }
    engine.ship(cast.buyer, id).await?;
    if matches!(trade.stage, Stage::Shipped) {
        return Ok(id);
    }

    let completion = engine.complete(cast.bank, id).await?;
    info!(
        risk_score = completion.risk.score,
        risk_level = %completion.risk.level,
        "Trade settled"
    );
    Ok(id)
}
