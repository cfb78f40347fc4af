use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::accounts::ChildId;

/// Identifier wrapper for register entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

/// One clock-in event on the daily register. An entry with no `clock_out`
/// is "open": the child is currently on-site. For any child at most one
/// entry is open at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterEntry {
    pub id: EntryId,
    pub child: ChildId,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
}

impl RegisterEntry {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }
}
