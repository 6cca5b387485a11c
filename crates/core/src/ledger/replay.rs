//! Rebuilds transaction state from its ledger.
//!
//! The ledger is the provenance record: folding a transaction's entries in
//! append order must land on the same status, verification flags and document
//! types as the stored rows. Replay is strict and rejects any history the
//! engine could not have produced.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tradeflow_shared::types::{ActorId, DocumentId, LedgerEntryId};

use super::types::{LedgerAction, LedgerEntry};
use crate::document::types::DocumentType;
use crate::workflow::types::TransactionStatus;

/// State reconstructed from a ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayedState {
    /// Last status reached; `None` if no lifecycle entry was seen.
    pub status: Option<TransactionStatus>,
    /// Verifier per verified document.
    pub verified: BTreeMap<DocumentId, ActorId>,
    /// Current type per uploaded document.
    pub doc_types: BTreeMap<DocumentId, DocumentType>,
}

impl ReplayedState {
    /// Types of every verified document.
    #[must_use]
    pub fn verified_types(&self) -> BTreeSet<DocumentType> {
        self.verified
            .keys()
            .filter_map(|id| self.doc_types.get(id).copied())
            .collect()
    }

    /// Returns true if the document was verified.
    #[must_use]
    pub fn is_verified(&self, document_id: DocumentId) -> bool {
        self.verified.contains_key(&document_id)
    }
}

/// Why a history could not be replayed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// Entries are not in ascending time order.
    #[error("entry {entry_id} precedes the entry before it")]
    NotChronological {
        /// Offending entry.
        entry_id: LedgerEntryId,
    },

    /// A lifecycle entry does not follow its required predecessor.
    #[error("entry {entry_id}: {action} cannot follow {previous:?}")]
    OutOfOrder {
        /// Offending entry.
        entry_id: LedgerEntryId,
        /// The lifecycle action found.
        action: LedgerAction,
        /// Status reached so far.
        previous: Option<TransactionStatus>,
    },

    /// A document-level entry carries no document id.
    #[error("entry {entry_id}: {action} without a document")]
    MissingDocument {
        /// Offending entry.
        entry_id: LedgerEntryId,
        /// The action found.
        action: LedgerAction,
    },

    /// A document was acted on before its upload entry.
    #[error("entry {entry_id}: document {document_id} was never uploaded")]
    UnknownDocument {
        /// Offending entry.
        entry_id: LedgerEntryId,
        /// The document.
        document_id: DocumentId,
    },

    /// A document was verified twice.
    #[error("entry {entry_id}: document {document_id} already verified")]
    DuplicateVerification {
        /// Offending entry.
        entry_id: LedgerEntryId,
        /// The document.
        document_id: DocumentId,
    },

    /// An action names a source type the document did not have.
    #[error("entry {entry_id}: document {document_id} is {actual}, entry says {recorded}")]
    TypeMismatch {
        /// Offending entry.
        entry_id: LedgerEntryId,
        /// The document.
        document_id: DocumentId,
        /// Type according to replay.
        actual: DocumentType,
        /// Type the entry recorded.
        recorded: DocumentType,
    },

    /// A required details field is missing or unreadable.
    #[error("entry {entry_id}: missing detail '{field}'")]
    MissingDetail {
        /// Offending entry.
        entry_id: LedgerEntryId,
        /// Field name.
        field: &'static str,
    },
}

/// Folds entries, in append order, into the state they describe.
///
/// # Errors
///
/// Returns the first [`ReplayError`] encountered.
pub fn replay<'a, I>(entries: I) -> Result<ReplayedState, ReplayError>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut state = ReplayedState::default();
    let mut last_at: Option<DateTime<Utc>> = None;

    for entry in entries {
        if last_at.is_some_and(|at| entry.created_at < at) {
            return Err(ReplayError::NotChronological { entry_id: entry.id });
        }
        last_at = Some(entry.created_at);

        if let Some(next) = entry.action.transaction_status() {
            let expected = match state.status {
                None => Some(TransactionStatus::PoCreated),
                Some(current) => current.successor(),
            };
            if expected != Some(next) {
                return Err(ReplayError::OutOfOrder {
                    entry_id: entry.id,
                    action: entry.action,
                    previous: state.status,
                });
            }
            state.status = Some(next);
            continue;
        }

        let document_id = entry.document_id.ok_or(ReplayError::MissingDocument {
            entry_id: entry.id,
            action: entry.action,
        })?;

        match entry.action {
            LedgerAction::DocumentUploaded => {
                let doc_type =
                    entry
                        .detail_doc_type("doc_type")
                        .ok_or(ReplayError::MissingDetail {
                            entry_id: entry.id,
                            field: "doc_type",
                        })?;
                state.doc_types.insert(document_id, doc_type);
            }
            LedgerAction::Verified => {
                if !state.doc_types.contains_key(&document_id) {
                    return Err(ReplayError::UnknownDocument {
                        entry_id: entry.id,
                        document_id,
                    });
                }
                if state.verified.insert(document_id, entry.actor_id).is_some() {
                    return Err(ReplayError::DuplicateVerification {
                        entry_id: entry.id,
                        document_id,
                    });
                }
            }
            _ => apply_type_change(&mut state, entry, document_id)?,
        }
    }

    Ok(state)
}

fn apply_type_change(
    state: &mut ReplayedState,
    entry: &LedgerEntry,
    document_id: DocumentId,
) -> Result<(), ReplayError> {
    let actual = *state
        .doc_types
        .get(&document_id)
        .ok_or(ReplayError::UnknownDocument {
            entry_id: entry.id,
            document_id,
        })?;

    if let Some(recorded) = entry.detail_doc_type("doc_type")
        && recorded != actual
    {
        return Err(ReplayError::TypeMismatch {
            entry_id: entry.id,
            document_id,
            actual,
            recorded,
        });
    }

    if let Some(next) = entry.detail_doc_type("next_doc_type") {
        state.doc_types.insert(document_id, next);
    }
    Ok(())
}
