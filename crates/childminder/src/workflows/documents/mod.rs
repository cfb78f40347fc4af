//! The document lifecycle: each legal document (contract, consent form,
//! child record) is created exactly once per child, captures an immutable
//! signed snapshot with provenance, renders to PDF, and fans out by email to
//! the business owner and the submitting guardian before the submission is
//! reported complete. Per (child, kind) the state machine is
//! `Absent -> Created`, terminal: there is no edit or delete path.

pub mod domain;
pub mod render;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ChildRecord, ConsentForm, ConsentSubmission, Contract, ContractSubmission, Document,
    DocumentId, DocumentKind, RecordSubmission, Signatures,
};
pub use render::{document_sheet, encode_pdf, render_document, DocumentSheet, RenderError, SheetLine};
pub use repository::DocumentRepository;
pub use router::{documents_router, ChildDetailView, DocumentCreatedView};
pub use service::{DocumentError, DocumentService};
