//! Partial-failure row collection.
//!
//! A listing keeps going when a single row cannot be decoded: the row is
//! skipped and the error is remembered. Only the most recent error is kept,
//! so a returned error does not necessarily belong to the last row read.

use crate::error::CatalogError;
use crate::Result;

#[derive(Debug)]
pub struct RowSet<T> {
    pub items: Vec<T>,
    pub last_error: Option<CatalogError>,
}

impl<T> RowSet<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            last_error: None,
        }
    }

    /// Fold one decoded row into the set.
    pub fn push_row(&mut self, row: Result<T>) {
        match row {
            Ok(item) => self.items.push(item),
            Err(e) => self.last_error = Some(e),
        }
    }

    pub fn collect<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Result<T>>,
    {
        rows.into_iter().fold(Self::new(), |mut set, row| {
            set.push_row(row);
            set
        })
    }

    pub fn is_complete(&self) -> bool {
        self.last_error.is_none()
    }

    /// Strict view: any skipped row fails the whole listing.
    pub fn into_complete(self) -> Result<Vec<T>> {
        match self.last_error {
            Some(e) => Err(e),
            None => Ok(self.items),
        }
    }
}

impl<T> Default for RowSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
