// ============================================================================
// Transaction State Management
// ============================================================================
//
// Lifecycle: Active -> Committed | Aborted. Changes are applied to the table
// as they happen and recorded here; rollback walks the log backwards and
// restores every before-image.
//
// ============================================================================

use super::Change;
use crate::error::{AppError, AppResult};
use crate::storage::{Record, Table};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global transaction ID counter
static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Generate a new unique transaction ID
    pub fn new() -> Self {
        TransactionId(NEXT_TXN_ID.fetch_add(1, Ordering::SeqCst))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

/// Transaction state
///
/// ```text
/// Active ──commit──> Committed
///   │
///   └──rollback──> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    Aborted,
}

impl TransactionState {
    pub fn is_active(&self) -> bool {
        matches!(self, TransactionState::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Committed | TransactionState::Aborted
        )
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionState::Active => write!(f, "ACTIVE"),
            TransactionState::Committed => write!(f, "COMMITTED"),
            TransactionState::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// A write transaction over one table.
///
/// The caller holds the table's write lock for the transaction's whole
/// lifetime, so no other writer can observe or interleave with the
/// intermediate state.
#[derive(Debug)]
pub struct Transaction<R: Record> {
    id: TransactionId,
    state: TransactionState,
    changes: Vec<Change<R>>,
}

impl<R: Record> Transaction<R> {
    pub fn begin() -> Self {
        Self {
            id: TransactionId::new(),
            state: TransactionState::Active,
            changes: Vec::new(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    /// Record a change that has already been applied to the table
    ///
    /// # Errors
    /// Returns error if transaction is not active
    pub fn record_change(&mut self, change: Change<R>) -> AppResult<()> {
        if !self.state.is_active() {
            return Err(AppError::internal(format!(
                "cannot record change: transaction {} is {}",
                self.id, self.state
            )));
        }

        self.changes.push(change);
        Ok(())
    }

    /// Mark transaction as committed; recorded changes become permanent
    ///
    /// # Errors
    /// Returns error if transaction is not active
    pub fn commit(&mut self) -> AppResult<()> {
        if !self.state.is_active() {
            return Err(AppError::internal(format!(
                "cannot commit: transaction {} is already {}",
                self.id, self.state
            )));
        }

        self.changes.clear();
        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Undo every recorded change, newest first, and mark the transaction
    /// aborted
    ///
    /// # Errors
    /// Returns error if transaction is not active
    pub fn rollback(&mut self, table: &mut Table<R>) -> AppResult<()> {
        if !self.state.is_active() {
            return Err(AppError::internal(format!(
                "cannot rollback: transaction {} is already {}",
                self.id, self.state
            )));
        }

        while let Some(change) = self.changes.pop() {
            change.revert(table);
        }
        self.state = TransactionState::Aborted;
        Ok(())
    }
}

impl<R: Record> Drop for Transaction<R> {
    fn drop(&mut self) {
        if self.state.is_active() && !self.changes.is_empty() {
            tracing::warn!(
                txn = %self.id,
                changes = self.changes.len(),
                "transaction dropped while active; changes were left applied"
            );
        }
    }
}
