//! Property-based tests for the transition tables.

use proptest::prelude::*;

use crate::actor::Role;
use crate::document::types::{DocumentAction, DocumentType};
use crate::policy::matrix::{DOCUMENT_MATRIX, TRANSACTION_TABLE, document_policy};
use crate::policy::table::Denial;
use crate::workflow::types::{TransactionAction, TransactionStatus};

fn arb_role() -> impl Strategy<Value = Role> {
    proptest::sample::select(Role::ALL.to_vec())
}

fn arb_status() -> impl Strategy<Value = Option<TransactionStatus>> {
    proptest::option::of(proptest::sample::select(TransactionStatus::ALL.to_vec()))
}

fn arb_tx_action() -> impl Strategy<Value = TransactionAction> {
    prop_oneof![
        Just(TransactionAction::Create),
        Just(TransactionAction::Approve),
        Just(TransactionAction::Ship),
        Just(TransactionAction::Complete),
    ]
}

fn arb_doc_type() -> impl Strategy<Value = DocumentType> {
    proptest::sample::select(DocumentType::ALL.to_vec())
}

fn arb_doc_action() -> impl Strategy<Value = DocumentAction> {
    proptest::sample::select(DocumentAction::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any allowed transaction step moves exactly one status forward.
    #[test]
    fn prop_transaction_steps_never_skip_or_regress(
        current in arb_status(),
        role in arb_role(),
        action in arb_tx_action(),
    ) {
        if let Ok(next) = TRANSACTION_TABLE.resolve(current, role, action) {
            match current {
                None => prop_assert_eq!(next, TransactionStatus::PoCreated),
                Some(status) => prop_assert_eq!(status.successor(), Some(next)),
            }
        }
    }

    /// Nothing leaves the terminal status.
    #[test]
    fn prop_completed_is_terminal(role in arb_role(), action in arb_tx_action()) {
        prop_assert!(
            TRANSACTION_TABLE
                .resolve(Some(TransactionStatus::PoCompleted), role, action)
                .is_err()
        );
    }

    /// A role that owns no row for an action is always Forbidden, whatever the state.
    #[test]
    fn prop_role_checked_before_state(
        current in arb_status(),
        role in arb_role(),
        action in arb_tx_action(),
    ) {
        let result = TRANSACTION_TABLE.resolve(current, role, action);
        if !TRANSACTION_TABLE.permits(role, action) {
            prop_assert_eq!(result, Err(Denial::Forbidden { role, action }));
        }
    }

    /// The matrix is fail-closed: allowed iff an explicit row matches.
    #[test]
    fn prop_document_matrix_fail_closed(
        role in arb_role(),
        doc_type in arb_doc_type(),
        action in arb_doc_action(),
    ) {
        let listed = DOCUMENT_MATRIX
            .rows()
            .iter()
            .find(|row| row.role == role && row.action == action && row.from == Some(doc_type));
        prop_assert_eq!(document_policy(role, doc_type, action), listed.map(|row| row.to));
    }

    /// Only ISSUE_* actions change a document's type.
    #[test]
    fn prop_only_issue_actions_mutate_type(
        role in arb_role(),
        doc_type in arb_doc_type(),
        action in arb_doc_action(),
    ) {
        if let Some(next) = document_policy(role, doc_type, action) {
            let mutating = matches!(
                action,
                DocumentAction::IssueBol | DocumentAction::IssueInvoice | DocumentAction::IssueLoc
            );
            if !mutating {
                prop_assert_eq!(next, doc_type);
            }
        }
    }
}
