use chrono::{DateTime, Utc};

use crate::workflows::accounts::ChildId;
use crate::workflows::StoreError;

use super::domain::RegisterEntry;

/// Storage abstraction for the daily register.
///
/// `open_entry` and `close_entry` carry the single-open-entry invariant:
/// implementations MUST perform the open-entry check and the mutation under
/// mutual exclusion scoped at least to the child. `open_entry` returns
/// `StoreError::Conflict` when an open entry already exists; `close_entry`
/// returns `StoreError::NotFound` when none does. A SQL adapter gets this
/// from a partial unique index on open entries; the in-memory adapter uses
/// its interior mutex.
pub trait RegisterRepository: Send + Sync {
    fn open_entry(&self, entry: RegisterEntry) -> Result<RegisterEntry, StoreError>;
    fn close_entry(&self, child: ChildId, at: DateTime<Utc>)
        -> Result<RegisterEntry, StoreError>;
    fn open_for(&self, child: ChildId) -> Result<Option<RegisterEntry>, StoreError>;
    fn entries_for(&self, child: ChildId) -> Result<Vec<RegisterEntry>, StoreError>;
}
