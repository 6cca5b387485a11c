//! Read and administrative access, as a third [`TransitionTable`].
//!
//! The "state" here is how the actor stands towards the transaction in
//! question ([`Standing`]); operations that are not about one transaction use
//! [`Standing::Portfolio`]. Rows never change the standing.

use std::fmt;

use crate::actor::{Actor, Role};
use crate::error::{EngineError, EngineResult};
use crate::workflow::types::TradeTransaction;

use super::table::{Denial, Transition, TransitionTable};

/// How an actor stands towards a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    /// Not about a single transaction.
    Portfolio,
    /// The buyer, or the assigned seller.
    Party,
    /// Not a party, and no seller has been assigned yet.
    Unassigned,
    /// Not a party to a transaction with an assigned seller.
    Outsider,
}

impl Standing {
    /// Standing of `actor` towards `transaction`.
    #[must_use]
    pub fn of(actor: &Actor, transaction: &TradeTransaction) -> Self {
        if transaction.buyer_id == actor.id || transaction.seller_id == Some(actor.id) {
            Self::Party
        } else if transaction.seller_id.is_none() {
            Self::Unassigned
        } else {
            Self::Outsider
        }
    }
}

/// Operations gated by the access table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read a transaction, its documents or its ledger.
    Read,
    /// Attach a document to a transaction.
    Upload,
    /// Export a transaction report.
    Export,
    /// List transactions.
    List,
    /// Compute a risk snapshot on demand.
    AssessRisk,
    /// Portfolio analytics.
    ViewAnalytics,
    /// Read the audit trail.
    ViewAuditLogs,
    /// Cascade-delete a transaction.
    Delete,
}

impl Operation {
    /// Wire name used in errors.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Upload => "UPLOAD",
            Self::Export => "EXPORT",
            Self::List => "LIST",
            Self::AssessRisk => "ASSESS_RISK",
            Self::ViewAnalytics => "VIEW_ANALYTICS",
            Self::ViewAuditLogs => "VIEW_AUDIT_LOGS",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const fn grant(role: Role, operation: Operation, standing: Standing) -> Transition<Standing, Operation> {
    Transition {
        role,
        action: operation,
        from: Some(standing),
        to: standing,
    }
}

const ACCESS_ROWS: &[Transition<Standing, Operation>] = {
    use Operation::{AssessRisk, Delete, Export, List, Read, Upload, ViewAnalytics, ViewAuditLogs};
    use Role::{Admin, Auditor, Bank, Buyer, Seller};
    use Standing::{Outsider, Party, Portfolio, Unassigned};

    &[
        // Parties read and upload to their own trades; banks and oversight to all.
        grant(Buyer, Read, Party),
        grant(Seller, Read, Party),
        grant(Bank, Read, Party),
        grant(Bank, Read, Unassigned),
        grant(Bank, Read, Outsider),
        grant(Bank, Read, Portfolio),
        grant(Auditor, Read, Party),
        grant(Auditor, Read, Unassigned),
        grant(Auditor, Read, Outsider),
        grant(Auditor, Read, Portfolio),
        grant(Admin, Read, Party),
        grant(Admin, Read, Unassigned),
        grant(Admin, Read, Outsider),
        grant(Admin, Read, Portfolio),
        grant(Buyer, Upload, Party),
        grant(Seller, Upload, Party),
        grant(Bank, Upload, Party),
        grant(Bank, Upload, Unassigned),
        grant(Bank, Upload, Outsider),
        grant(Auditor, Upload, Party),
        grant(Auditor, Upload, Unassigned),
        grant(Auditor, Upload, Outsider),
        grant(Admin, Upload, Party),
        grant(Admin, Upload, Unassigned),
        grant(Admin, Upload, Outsider),
        // Export is fail-closed: a bank must be the assigned seller.
        grant(Buyer, Export, Party),
        grant(Seller, Export, Party),
        grant(Bank, Export, Party),
        grant(Auditor, Export, Party),
        grant(Auditor, Export, Unassigned),
        grant(Auditor, Export, Outsider),
        grant(Admin, Export, Party),
        grant(Admin, Export, Unassigned),
        grant(Admin, Export, Outsider),
        grant(Buyer, List, Portfolio),
        grant(Bank, List, Portfolio),
        grant(Auditor, List, Portfolio),
        grant(Admin, List, Portfolio),
        grant(Bank, AssessRisk, Portfolio),
        grant(Auditor, AssessRisk, Portfolio),
        grant(Admin, AssessRisk, Portfolio),
        grant(Bank, ViewAnalytics, Portfolio),
        grant(Auditor, ViewAnalytics, Portfolio),
        grant(Admin, ViewAnalytics, Portfolio),
        grant(Auditor, ViewAuditLogs, Portfolio),
        grant(Admin, ViewAuditLogs, Portfolio),
        grant(Admin, Delete, Portfolio),
    ]
};

/// Access table. Every `(role, operation, standing)` not listed is denied.
pub static ACCESS_TABLE: TransitionTable<Standing, Operation> = TransitionTable::new(ACCESS_ROWS);

/// Rows added when `workflow.export_unassigned_to_bank` is on.
static UNASSIGNED_BANK_EXPORT: TransitionTable<Standing, Operation> =
    TransitionTable::new(&[grant(Role::Bank, Operation::Export, Standing::Unassigned)]);

/// Checks `operation` for `actor` at `standing`.
///
/// With `export_unassigned_to_bank` set, a bank may also export a
/// transaction that has no seller yet.
///
/// # Errors
///
/// Returns [`Denial::Forbidden`] if the role may never perform the operation
/// and [`Denial::InvalidState`] if it may, but not at this standing.
pub fn check_access(
    actor: &Actor,
    operation: Operation,
    standing: Standing,
    export_unassigned_to_bank: bool,
) -> Result<(), Denial<Standing, Operation>> {
    match ACCESS_TABLE.resolve(Some(standing), actor.role, operation) {
        Ok(_) => Ok(()),
        Err(denial) if export_unassigned_to_bank => UNASSIGNED_BANK_EXPORT
            .resolve(Some(standing), actor.role, operation)
            .map(|_| ())
            .map_err(|_| denial),
        Err(denial) => Err(denial),
    }
}

/// [`check_access`] as an engine result; denials are logged and become
/// `Forbidden`.
pub(crate) fn require(
    actor: &Actor,
    operation: Operation,
    standing: Standing,
    export_unassigned_to_bank: bool,
) -> EngineResult<()> {
    check_access(actor, operation, standing, export_unassigned_to_bank).map_err(|_| {
        let err = EngineError::forbidden(actor.role, operation.as_str());
        tracing::warn!(error = %err, ?standing, "access denied");
        err
    })
}

/// Whether `actor` may read `transaction`.
#[must_use]
pub fn can_view(actor: &Actor, transaction: &TradeTransaction) -> bool {
    check_access(actor, Operation::Read, Standing::of(actor, transaction), false).is_ok()
}
