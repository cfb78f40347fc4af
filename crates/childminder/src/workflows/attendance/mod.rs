//! Daily attendance: a two-state clock-in/clock-out cycle per child. The
//! standing invariant is that a child has at most one register entry with no
//! clock-out at any time.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{EntryId, RegisterEntry};
pub use repository::RegisterRepository;
pub use router::attendance_router;
pub use service::{AttendanceError, AttendanceService, RegisterRow};
