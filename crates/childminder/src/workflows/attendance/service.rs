use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::workflows::accounts::{Child, ChildId, ChildRepository};
use crate::workflows::StoreError;

use super::domain::{EntryId, RegisterEntry};
use super::repository::RegisterRepository;

static ENTRY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_entry_id() -> EntryId {
    EntryId(ENTRY_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Service running the two-state clock-in/clock-out cycle per child.
pub struct AttendanceService<R, C> {
    register: Arc<R>,
    children: Arc<C>,
}

impl<R, C> AttendanceService<R, C>
where
    R: RegisterRepository + 'static,
    C: ChildRepository + 'static,
{
    pub fn new(register: Arc<R>, children: Arc<C>) -> Self {
        Self { register, children }
    }

    /// Open a register entry. A child with an entry still open must be
    /// clocked out first.
    pub fn clock_in(&self, child_id: ChildId) -> Result<RegisterEntry, AttendanceError> {
        self.children
            .fetch(child_id)?
            .ok_or(AttendanceError::NotFound)?;

        let entry = RegisterEntry {
            id: next_entry_id(),
            child: child_id,
            clock_in: Utc::now(),
            clock_out: None,
        };

        match self.register.open_entry(entry) {
            Ok(stored) => Ok(stored),
            Err(StoreError::Conflict) => Err(AttendanceError::AlreadyClockedIn),
            Err(other) => Err(other.into()),
        }
    }

    /// Close the single open entry for a child.
    pub fn clock_out(&self, child_id: ChildId) -> Result<RegisterEntry, AttendanceError> {
        self.children
            .fetch(child_id)?
            .ok_or(AttendanceError::NotFound)?;

        match self.register.close_entry(child_id, Utc::now()) {
            Ok(entry) => Ok(entry),
            Err(StoreError::NotFound) => Err(AttendanceError::NotClockedIn),
            Err(other) => Err(other.into()),
        }
    }

    /// Every child on the books with their open entry, for the staff
    /// register screen.
    pub fn register_view(&self) -> Result<Vec<RegisterRow>, AttendanceError> {
        let mut rows = Vec::new();
        for child in self.children.all()? {
            let open = self.register.open_for(child.id)?;
            rows.push(RegisterRow::build(&child, open.as_ref()));
        }
        Ok(rows)
    }
}

/// One row of the staff register screen.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRow {
    pub child_id: u64,
    pub full_name: String,
    pub contracted_days: String,
    /// Set when the child is currently clocked in.
    pub clocked_in_at: Option<DateTime<Utc>>,
}

impl RegisterRow {
    fn build(child: &Child, open: Option<&RegisterEntry>) -> Self {
        Self {
            child_id: child.id.0,
            full_name: child.full_name(),
            contracted_days: child.contracted_days_display(),
            clocked_in_at: open.map(|entry| entry.clock_in),
        }
    }
}

/// Error raised by the attendance workflow.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error("child not found")]
    NotFound,
    #[error("child must be clocked out of the existing entry before clocking in again")]
    AlreadyClockedIn,
    #[error("child must be clocked in before being clocked out")]
    NotClockedIn,
    #[error(transparent)]
    Store(#[from] StoreError),
}
