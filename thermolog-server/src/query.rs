//! Query Service: read-only facade over the Reading Store.
//!
//! Passes rows through untouched, but turns "no rows" into an explicit
//! `Lookup::Empty` so callers never confuse it with a storage error.

use thermolog_core::{Reading, ReadingStore, SortOrder, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Empty,
}

impl<T> Lookup<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Lookup::Empty)
    }
}

#[derive(Debug, Clone)]
pub struct QueryService {
    store: ReadingStore,
}

impl QueryService {
    pub fn new(store: ReadingStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ReadingStore {
        &self.store
    }

    pub async fn latest(&self) -> Result<Lookup<Reading>, StoreError> {
        Ok(match self.store.latest().await? {
            Some(reading) => Lookup::Found(reading),
            None => Lookup::Empty,
        })
    }

    pub async fn history(&self, order: SortOrder) -> Result<Lookup<Vec<Reading>>, StoreError> {
        let readings = self.store.all_ordered(order).await?;
        Ok(if readings.is_empty() {
            Lookup::Empty
        } else {
            Lookup::Found(readings)
        })
    }
}
