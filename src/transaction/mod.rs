// ============================================================================
// Transaction Module
// ============================================================================
//
// Undo-log transactions for the in-memory store.
//
// - Transaction: Active -> Committed | Aborted
// - Change: one reversible row operation, undone in reverse order on rollback
//
// ============================================================================

pub mod change;
pub mod state;

pub use change::Change;
pub use state::{Transaction, TransactionId, TransactionState};
