use std::collections::BTreeMap;

use crate::transaction::Change;

/// A row type that can live in an in-memory [`Table`].
///
/// The hooks are how the table, not the caller, owns bookkeeping columns such
/// as a row version.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> i64;

    fn assign_id(&mut self, id: i64);

    /// Runs once when the row is first stored.
    fn on_insert(&mut self) {}

    /// Runs after every successful update, with the row as it was before.
    fn on_update(&mut self, _previous: &Self) {}
}

/// Ordered map of rows keyed by a serial id, like a `BIGSERIAL` primary key.
#[derive(Debug, Clone)]
pub struct Table<R> {
    rows: BTreeMap<i64, R>,
    next_id: i64,
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Table<R> {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Stores `row` under a fresh id and returns the stored copy.
    pub fn insert(&mut self, mut row: R) -> R {
        let id = self.next_id;
        self.next_id += 1;

        row.assign_id(id);
        row.on_insert();
        self.rows.insert(id, row.clone());
        row
    }

    pub fn get(&self, id: i64) -> Option<&R> {
        self.rows.get(&id)
    }

    pub fn scan(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    pub fn find(&self, predicate: impl Fn(&R) -> bool) -> Option<&R> {
        self.rows.values().find(|row| predicate(row))
    }

    /// Conditional update: `UPDATE ... SET <mutate> WHERE id = ? AND <predicate>`.
    ///
    /// Returns the applied change, or `None` when no row matched. The
    /// `on_update` hook runs after `mutate`, so a mutation cannot override
    /// what the hook maintains.
    pub fn update_where(
        &mut self,
        id: i64,
        predicate: impl FnOnce(&R) -> bool,
        mutate: impl FnOnce(&mut R),
    ) -> Option<Change<R>> {
        let row = self.rows.get_mut(&id)?;
        if !predicate(&*row) {
            return None;
        }

        let old_row = row.clone();
        mutate(&mut *row);
        row.assign_id(id);
        row.on_update(&old_row);

        Some(Change::UpdateRow {
            old_row,
            new_row: row.clone(),
        })
    }

    pub fn delete(&mut self, id: i64) -> Option<Change<R>> {
        self.rows
            .remove(&id)
            .map(|old_row| Change::DeleteRow { old_row })
    }

    /// Writes a before-image back verbatim, bypassing the hooks.
    pub(crate) fn put_raw(&mut self, row: R) {
        self.rows.insert(row.id(), row);
    }
}
