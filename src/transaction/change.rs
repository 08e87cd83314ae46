// ============================================================================
// Transaction Change Tracking
// ============================================================================
//
// Each Change carries enough of the before-image to be reversed against the
// table it was applied to.
//
// ============================================================================

use crate::storage::{Record, Table};

/// A single reversible row operation recorded inside a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<R> {
    /// A row was replaced; `old_row` is the before-image
    UpdateRow { old_row: R, new_row: R },

    /// A row was removed
    DeleteRow { old_row: R },
}

impl<R: Record> Change<R> {
    /// Id of the row this change touched
    pub fn row_id(&self) -> i64 {
        match self {
            Change::UpdateRow { old_row, .. } => old_row.id(),
            Change::DeleteRow { old_row } => old_row.id(),
        }
    }

    /// Restores the table to the state it had before this change.
    pub(crate) fn revert(self, table: &mut Table<R>) {
        match self {
            Change::UpdateRow { old_row, .. } | Change::DeleteRow { old_row } => {
                table.put_raw(old_row);
            }
        }
    }
}
