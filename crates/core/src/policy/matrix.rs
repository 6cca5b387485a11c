//! The two static transition tables the engine runs on.
//!
//! [`TRANSACTION_TABLE`] drives the coarse transaction lifecycle,
//! [`DOCUMENT_MATRIX`] the role × document type × action policy. Both are
//! instances of [`TransitionTable`]; no operation performs its own role check.

use crate::actor::Role;
use crate::document::types::{DocumentAction, DocumentType};
use crate::workflow::types::{TransactionAction, TransactionStatus};

use super::table::{Transition, TransitionTable};

const fn tx(
    role: Role,
    action: TransactionAction,
    from: Option<TransactionStatus>,
    to: TransactionStatus,
) -> Transition<TransactionStatus, TransactionAction> {
    Transition {
        role,
        action,
        from,
        to,
    }
}

const fn doc(
    role: Role,
    action: DocumentAction,
    from: DocumentType,
    to: DocumentType,
) -> Transition<DocumentType, DocumentAction> {
    Transition {
        role,
        action,
        from: Some(from),
        to,
    }
}

const TRANSACTION_ROWS: &[Transition<TransactionStatus, TransactionAction>] = &[
    tx(
        Role::Buyer,
        TransactionAction::Create,
        None,
        TransactionStatus::PoCreated,
    ),
    tx(
        Role::Bank,
        TransactionAction::Approve,
        Some(TransactionStatus::PoCreated),
        TransactionStatus::PoApproved,
    ),
    tx(
        Role::Buyer,
        TransactionAction::Ship,
        Some(TransactionStatus::PoApproved),
        TransactionStatus::PoShipped,
    ),
    tx(
        Role::Bank,
        TransactionAction::Complete,
        Some(TransactionStatus::PoShipped),
        TransactionStatus::PoCompleted,
    ),
];

/// Transaction lifecycle. Shipping belongs to the buyer.
pub static TRANSACTION_TABLE: TransitionTable<TransactionStatus, TransactionAction> =
    TransitionTable::new(TRANSACTION_ROWS);

const DOCUMENT_ROWS: &[Transition<DocumentType, DocumentAction>] = {
    use DocumentAction::{Amend, IssueBol, IssueInvoice, IssueLoc, Paid, Received, Shipped, Verify};
    use DocumentType::{BillOfLading, Coo, InsuranceCert, Invoice, Loc, Po};

    &[
        doc(Role::Buyer, Amend, Po, Po),
        doc(Role::Buyer, Received, BillOfLading, BillOfLading),
        doc(Role::Seller, Shipped, BillOfLading, BillOfLading),
        doc(Role::Seller, IssueBol, Po, BillOfLading),
        doc(Role::Seller, IssueBol, Loc, BillOfLading),
        doc(Role::Seller, IssueInvoice, BillOfLading, Invoice),
        doc(Role::Auditor, Verify, Po, Po),
        doc(Role::Auditor, Verify, Loc, Loc),
        doc(Role::Bank, Paid, Invoice, Invoice),
        doc(Role::Bank, IssueLoc, Po, Loc),
        doc(Role::Bank, IssueLoc, Loc, Loc),
        doc(Role::Bank, Verify, Po, Po),
        doc(Role::Bank, Verify, Invoice, Invoice),
        doc(Role::Bank, Verify, BillOfLading, BillOfLading),
        doc(Role::Bank, Verify, Loc, Loc),
        doc(Role::Bank, Verify, Coo, Coo),
        doc(Role::Bank, Verify, InsuranceCert, InsuranceCert),
    ]
};

/// Document policy matrix. Every triple not listed is denied.
pub static DOCUMENT_MATRIX: TransitionTable<DocumentType, DocumentAction> =
    TransitionTable::new(DOCUMENT_ROWS);

/// Looks up `(role, doc_type, action)` in the document matrix.
///
/// Returns the resulting document type when allowed (identical to `doc_type`
/// for actions that do not mutate the type), or `None` when denied.
#[must_use]
pub fn document_policy(role: Role, doc_type: DocumentType, action: DocumentAction) -> Option<DocumentType> {
    DOCUMENT_MATRIX.resolve(Some(doc_type), role, action).ok()
}
