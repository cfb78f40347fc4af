//! Core library for the childminding setting's web application: guardians
//! register and link children, complete the three one-per-child legal
//! documents, and staff keep the daily register. Persistent storage,
//! authentication, and token generation stay behind collaborator traits.

pub mod config;
pub mod error;
pub mod notify;
pub mod sanitise;
pub mod telemetry;
pub mod workflows;
