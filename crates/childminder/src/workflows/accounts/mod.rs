//! Guardian accounts and child enrolment: provisioning, activation
//! provenance, password-reset links, and the ownership check every
//! child-scoped operation sits behind.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Child, ChildId, Guardian, GuardianId};
pub use repository::{ChildRepository, GuardianRepository};
pub use router::accounts_router;
pub use service::{AccountsError, AccountsService, ActivationTokens, NewChild, NewGuardian};
