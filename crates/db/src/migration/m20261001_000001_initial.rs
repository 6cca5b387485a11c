//! Initial database migration.
//!
//! Creates the enums, tables, indexes and integrity triggers for trade
//! transactions, documents, the ledger, risk snapshots and the audit log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TRADE TABLES
        // ============================================================
        db.execute_unprepared(TRADE_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(DOCUMENTS_SQL).await?;
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;
        db.execute_unprepared(RISK_SCORES_SQL).await?;

        // ============================================================
        // PART 3: AUDIT
        // ============================================================
        db.execute_unprepared(AUDIT_LOGS_SQL).await?;

        // ============================================================
        // PART 4: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE trade_status AS ENUM (
    'PO_CREATED',
    'PO_APPROVED',
    'PO_SHIPPED',
    'PO_COMPLETED'
);

CREATE TYPE document_type AS ENUM (
    'PO',
    'INVOICE',
    'BILL_OF_LADING',
    'LOC',
    'COO',
    'INSURANCE_CERT'
);

CREATE TYPE ledger_action AS ENUM (
    'PO_CREATED',
    'PO_APPROVED',
    'PO_SHIPPED',
    'PO_COMPLETED',
    'DOCUMENT_UPLOADED',
    'VERIFIED',
    'AMENDED',
    'RECEIVED',
    'SHIPPED',
    'ISSUE_BOL',
    'ISSUE_INVOICE',
    'PAID',
    'ISSUE_LOC'
);

CREATE TYPE risk_level AS ENUM ('LOW', 'MEDIUM', 'HIGH');

CREATE TYPE audit_action AS ENUM (
    'PO_CREATED',
    'PO_APPROVED',
    'PO_SHIPPED',
    'PO_COMPLETED',
    'DOCUMENT_UPLOADED',
    'VERIFIED',
    'DOCUMENT_ACTION',
    'RISK_ASSESSED',
    'EXPORT',
    'TRANSACTION_DELETED'
);

CREATE TYPE audit_entity_type AS ENUM ('TRANSACTION', 'DOCUMENT');
";

const TRADE_TRANSACTIONS_SQL: &str = r"
CREATE TABLE trade_transactions (
    id UUID PRIMARY KEY,
    buyer_id UUID NOT NULL,
    seller_id UUID,
    amount NUMERIC(19, 4) NOT NULL,
    currency CHAR(3) NOT NULL,
    buyer_country VARCHAR(8),
    status trade_status NOT NULL DEFAULT 'PO_CREATED',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_tt_buyer_created ON trade_transactions(buyer_id, created_at);
CREATE INDEX idx_tt_seller ON trade_transactions(seller_id);
CREATE INDEX idx_tt_status ON trade_transactions(status);
";

const DOCUMENTS_SQL: &str = r"
CREATE TABLE documents (
    id UUID PRIMARY KEY,
    transaction_id UUID REFERENCES trade_transactions(id) ON DELETE CASCADE,
    owner_id UUID NOT NULL,
    doc_type document_type NOT NULL,
    doc_number VARCHAR(100) NOT NULL,
    storage_ref TEXT NOT NULL,
    content_hash CHAR(64) NOT NULL,
    is_verified BOOLEAN NOT NULL DEFAULT false,
    verified_by UUID,
    verified_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (transaction_id, doc_type, doc_number),
    CONSTRAINT chk_verification_complete CHECK (
        (is_verified AND verified_by IS NOT NULL AND verified_at IS NOT NULL)
        OR (NOT is_verified AND verified_by IS NULL AND verified_at IS NULL)
    )
);

CREATE INDEX idx_doc_transaction ON documents(transaction_id, created_at);
";

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    transaction_id UUID REFERENCES trade_transactions(id) ON DELETE CASCADE,
    document_id UUID REFERENCES documents(id) ON DELETE CASCADE,
    actor_id UUID NOT NULL,
    action ledger_action NOT NULL,
    details JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_ledger_subject CHECK (transaction_id IS NOT NULL OR document_id IS NOT NULL)
);

CREATE INDEX idx_le_transaction ON ledger_entries(transaction_id, created_at);
CREATE INDEX idx_le_document ON ledger_entries(document_id, created_at);
";

const RISK_SCORES_SQL: &str = r"
CREATE TABLE risk_scores (
    id UUID PRIMARY KEY,
    transaction_id UUID REFERENCES trade_transactions(id) ON DELETE CASCADE,
    buyer_id UUID NOT NULL,
    score SMALLINT NOT NULL,
    level risk_level NOT NULL,
    rationale JSONB NOT NULL DEFAULT '[]'::jsonb,
    computed_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_score_range CHECK (score BETWEEN 0 AND 100)
);

CREATE INDEX idx_rs_transaction ON risk_scores(transaction_id, computed_at DESC);
CREATE INDEX idx_rs_score ON risk_scores(score DESC);
";

const AUDIT_LOGS_SQL: &str = r"
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY,
    actor_id UUID NOT NULL,
    action audit_action NOT NULL,
    entity_type audit_entity_type NOT NULL,
    entity_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_audit_created ON audit_logs(created_at DESC);
CREATE INDEX idx_audit_entity ON audit_logs(entity_type, entity_id);
";

const TRIGGERS_SQL: &str = r"
-- Ledger entries are never rewritten. Deletes are only allowed when they
-- cascade from a parent row (trigger depth > 1).
CREATE OR REPLACE FUNCTION prevent_ledger_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF TG_OP = 'UPDATE' THEN
        RAISE EXCEPTION 'ledger entries are append-only';
    END IF;
    IF pg_trigger_depth() > 1 THEN
        RETURN OLD;
    END IF;
    RAISE EXCEPTION 'ledger entries are append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_ledger_immutable
    BEFORE UPDATE OR DELETE ON ledger_entries
    FOR EACH ROW EXECUTE FUNCTION prevent_ledger_modification();

-- Audit rows are never rewritten or removed.
CREATE OR REPLACE FUNCTION prevent_audit_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'audit log is append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_audit_immutable
    BEFORE UPDATE OR DELETE ON audit_logs
    FOR EACH ROW EXECUTE FUNCTION prevent_audit_modification();

-- Verification is set once and never cleared or reassigned.
CREATE OR REPLACE FUNCTION prevent_unverify()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.is_verified AND (
        NOT NEW.is_verified
        OR NEW.verified_by IS DISTINCT FROM OLD.verified_by
        OR NEW.verified_at IS DISTINCT FROM OLD.verified_at
    ) THEN
        RAISE EXCEPTION 'document % is already verified', OLD.id;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_document_verification_once
    BEFORE UPDATE ON documents
    FOR EACH ROW EXECUTE FUNCTION prevent_unverify();

-- Status only moves one step forward along the lifecycle.
CREATE OR REPLACE FUNCTION enforce_trade_status_order()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.status <> OLD.status
       AND array_position(enum_range(NULL::trade_status), NEW.status)
           <> array_position(enum_range(NULL::trade_status), OLD.status) + 1 THEN
        RAISE EXCEPTION 'invalid status change % -> %', OLD.status, NEW.status;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_trade_status_order
    BEFORE UPDATE ON trade_transactions
    FOR EACH ROW EXECUTE FUNCTION enforce_trade_status_order();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS risk_scores CASCADE;
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS documents CASCADE;
DROP TABLE IF EXISTS trade_transactions CASCADE;

DROP FUNCTION IF EXISTS prevent_ledger_modification() CASCADE;
DROP FUNCTION IF EXISTS prevent_audit_modification() CASCADE;
DROP FUNCTION IF EXISTS prevent_unverify() CASCADE;
DROP FUNCTION IF EXISTS enforce_trade_status_order() CASCADE;

DROP TYPE IF EXISTS audit_entity_type;
DROP TYPE IF EXISTS audit_action;
DROP TYPE IF EXISTS risk_level;
DROP TYPE IF EXISTS ledger_action;
DROP TYPE IF EXISTS document_type;
DROP TYPE IF EXISTS trade_status;
";
