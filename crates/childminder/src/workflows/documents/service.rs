use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, warn};

use crate::config::BusinessConfig;
use crate::notify::{DeliveryError, MailAttachment, Notifier, OutboundMessage};
use crate::sanitise;
use crate::workflows::accounts::{
    Child, ChildId, ChildRepository, Guardian, GuardianId, GuardianRepository,
};
use crate::workflows::{optional_field, required_field, StoreError, ValidationError};

use super::domain::{
    ChildRecord, ConsentForm, ConsentSubmission, Contract, ContractSubmission, Document,
    DocumentId, DocumentKind, RecordSubmission, Signatures,
};
use super::render::{self, RenderError};
use super::repository::DocumentRepository;

static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_document_id() -> DocumentId {
    DocumentId(DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Service composing the ownership check, the one-per-child invariant,
/// provenance stamping, PDF rendering, and the two-party notification.
pub struct DocumentService<D, C, G, N> {
    documents: Arc<D>,
    children: Arc<C>,
    guardians: Arc<G>,
    notifier: Arc<N>,
    business: BusinessConfig,
}

impl<D, C, G, N> DocumentService<D, C, G, N>
where
    D: DocumentRepository + 'static,
    C: ChildRepository + 'static,
    G: GuardianRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        documents: Arc<D>,
        children: Arc<C>,
        guardians: Arc<G>,
        notifier: Arc<N>,
        business: BusinessConfig,
    ) -> Self {
        Self {
            documents,
            children,
            guardians,
            notifier,
            business,
        }
    }

    /// Create the contract for a child. Create-once: a second submission for
    /// the same child fails with `AlreadyExists` and nothing is overwritten.
    pub fn create_contract(
        &self,
        guardian_id: GuardianId,
        child_id: ChildId,
        submission: ContractSubmission,
        signer_ip: Option<IpAddr>,
    ) -> Result<Document, DocumentError> {
        let (guardian, child) = self.resolve_owned_child(guardian_id, child_id)?;
        self.ensure_absent(child_id, DocumentKind::Contract)?;

        let now = Utc::now();
        let contract = Contract {
            id: next_document_id(),
            child: child_id,
            parent1_name: required_name("parent1_name", submission.parent1_name.as_deref())?,
            parent1_address: required_field(
                "parent1_address",
                submission.parent1_address.as_deref(),
            )?,
            parent1_telephone_home: optional_phone(submission.parent1_telephone_home.as_deref()),
            parent1_telephone_work: optional_phone(submission.parent1_telephone_work.as_deref()),
            parent1_telephone_mobile: optional_phone(
                submission.parent1_telephone_mobile.as_deref(),
            ),
            parent2_name: optional_field(submission.parent2_name.as_deref())
                .map(|name| sanitise::trim_name(&name)),
            parent2_address: optional_field(submission.parent2_address.as_deref()),
            parent2_telephone_home: optional_phone(submission.parent2_telephone_home.as_deref()),
            parent2_telephone_work: optional_phone(submission.parent2_telephone_work.as_deref()),
            parent2_telephone_mobile: optional_phone(
                submission.parent2_telephone_mobile.as_deref(),
            ),
            legal_contact: optional_field(submission.legal_contact.as_deref()),
            authorised_collectors: required_field(
                "authorised_collectors",
                submission.authorised_collectors.as_deref(),
            )?,
            collection_password: required_field(
                "collection_password",
                submission.collection_password.as_deref(),
            )?,
            day_fee_gbp: self.business.day_fee_gbp,
            start_date: child.contract_start_date,
            signatures: self.signatures(
                required_field("parent_signature", submission.parent_signature.as_deref())?,
                signer_ip,
            ),
            created_at: now,
            updated_at: now,
        };

        let stored = self.insert(Document::Contract(contract))?;
        self.render_and_notify(&guardian, &child, &stored)?;
        Ok(stored)
    }

    /// Create the consent form for a child.
    pub fn create_consent(
        &self,
        guardian_id: GuardianId,
        child_id: ChildId,
        submission: ConsentSubmission,
        signer_ip: Option<IpAddr>,
    ) -> Result<Document, DocumentError> {
        let (guardian, child) = self.resolve_owned_child(guardian_id, child_id)?;
        self.ensure_absent(child_id, DocumentKind::Consent)?;

        let now = Utc::now();
        let consent = ConsentForm {
            id: next_document_id(),
            child: child_id,
            policies_signature: required_field(
                "policies_signature",
                submission.policies_signature.as_deref(),
            )?,
            complaints_signature: required_field(
                "complaints_signature",
                submission.complaints_signature.as_deref(),
            )?,
            emergency_signature: required_field(
                "emergency_signature",
                submission.emergency_signature.as_deref(),
            )?,
            emergency_caregiver_signature: required_field(
                "emergency_caregiver_signature",
                submission.emergency_caregiver_signature.as_deref(),
            )?,
            outings_signature: required_field(
                "outings_signature",
                submission.outings_signature.as_deref(),
            )?,
            photos_signature: required_field(
                "photos_signature",
                submission.photos_signature.as_deref(),
            )?,
            transport_signature: required_field(
                "transport_signature",
                submission.transport_signature.as_deref(),
            )?,
            equipment_signature: required_field(
                "equipment_signature",
                submission.equipment_signature.as_deref(),
            )?,
            firstaid_signature: required_field(
                "firstaid_signature",
                submission.firstaid_signature.as_deref(),
            )?,
            sharing_signature: required_field(
                "sharing_signature",
                submission.sharing_signature.as_deref(),
            )?,
            plaster_signature: required_field(
                "plaster_signature",
                submission.plaster_signature.as_deref(),
            )?,
            suncream_wipes_signature: required_field(
                "suncream_wipes_signature",
                submission.suncream_wipes_signature.as_deref(),
            )?,
            calpol_signature: required_field(
                "calpol_signature",
                submission.calpol_signature.as_deref(),
            )?,
            signatures: self.signatures(
                required_field("parent_signature", submission.parent_signature.as_deref())?,
                signer_ip,
            ),
            created_at: now,
            updated_at: now,
        };

        let stored = self.insert(Document::Consent(consent))?;
        self.render_and_notify(&guardian, &child, &stored)?;
        Ok(stored)
    }

    /// Create the child record for a child.
    pub fn create_record(
        &self,
        guardian_id: GuardianId,
        child_id: ChildId,
        submission: RecordSubmission,
        signer_ip: Option<IpAddr>,
    ) -> Result<Document, DocumentError> {
        let (guardian, child) = self.resolve_owned_child(guardian_id, child_id)?;
        self.ensure_absent(child_id, DocumentKind::Record)?;

        let now = Utc::now();
        let record = ChildRecord {
            id: next_document_id(),
            child: child_id,
            home_address: required_field("home_address", submission.home_address.as_deref())?,
            languages_spoken: required_field(
                "languages_spoken",
                submission.languages_spoken.as_deref(),
            )?,
            religion_cultural_needs: optional_field(
                submission.religion_cultural_needs.as_deref(),
            ),
            doctor_name: required_name("doctor_name", submission.doctor_name.as_deref())?,
            doctor_surgery: required_field(
                "doctor_surgery",
                submission.doctor_surgery.as_deref(),
            )?,
            doctor_phone: sanitise::clean_phone(&required_field(
                "doctor_phone",
                submission.doctor_phone.as_deref(),
            )?),
            medical_conditions: optional_field(submission.medical_conditions.as_deref()),
            allergies: optional_field(submission.allergies.as_deref()),
            dietary_needs: optional_field(submission.dietary_needs.as_deref()),
            medication: optional_field(submission.medication.as_deref()),
            vaccinations: optional_field(submission.vaccinations.as_deref()),
            emergency_contact1_name: required_name(
                "emergency_contact1_name",
                submission.emergency_contact1_name.as_deref(),
            )?,
            emergency_contact1_relationship: required_field(
                "emergency_contact1_relationship",
                submission.emergency_contact1_relationship.as_deref(),
            )?,
            emergency_contact1_phone: sanitise::clean_phone(&required_field(
                "emergency_contact1_phone",
                submission.emergency_contact1_phone.as_deref(),
            )?),
            emergency_contact2_name: optional_field(submission.emergency_contact2_name.as_deref())
                .map(|name| sanitise::trim_name(&name)),
            emergency_contact2_relationship: optional_field(
                submission.emergency_contact2_relationship.as_deref(),
            ),
            emergency_contact2_phone: optional_phone(
                submission.emergency_contact2_phone.as_deref(),
            ),
            additional_notes: optional_field(submission.additional_notes.as_deref()),
            signatures: self.signatures(
                required_field("parent_signature", submission.parent_signature.as_deref())?,
                signer_ip,
            ),
            created_at: now,
            updated_at: now,
        };

        let stored = self.insert(Document::Record(record))?;
        self.render_and_notify(&guardian, &child, &stored)?;
        Ok(stored)
    }

    /// Documents currently in place for a child, for the child detail view.
    pub fn documents_for(
        &self,
        guardian_id: GuardianId,
        child_id: ChildId,
    ) -> Result<(Child, Vec<Document>), DocumentError> {
        let (_, child) = self.resolve_owned_child(guardian_id, child_id)?;
        let documents = self.documents.for_child(child_id)?;
        Ok((child, documents))
    }

    fn resolve_owned_child(
        &self,
        guardian_id: GuardianId,
        child_id: ChildId,
    ) -> Result<(Guardian, Child), DocumentError> {
        let guardian = self
            .guardians
            .fetch(guardian_id)?
            .ok_or(DocumentError::Forbidden)?;
        let child = self
            .children
            .fetch(child_id)?
            .ok_or(DocumentError::NotFound)?;
        if child.guardian != guardian.id {
            return Err(DocumentError::Forbidden);
        }
        Ok((guardian, child))
    }

    /// Early duplicate check for a friendly error. The race-proof check is
    /// the repository's conditional insert.
    fn ensure_absent(&self, child: ChildId, kind: DocumentKind) -> Result<(), DocumentError> {
        match self.documents.fetch(child, kind)? {
            Some(_) => Err(DocumentError::AlreadyExists(kind)),
            None => Ok(()),
        }
    }

    fn insert(&self, document: Document) -> Result<Document, DocumentError> {
        let kind = document.kind();
        match self.documents.insert(document) {
            Ok(stored) => Ok(stored),
            Err(StoreError::Conflict) => Err(DocumentError::AlreadyExists(kind)),
            Err(other) => Err(other.into()),
        }
    }

    fn signatures(&self, parent_signature: String, signer_ip: Option<IpAddr>) -> Signatures {
        let now = Utc::now();
        Signatures {
            parent_signature,
            parent_signed_at: now,
            parent_ip: signer_ip,
            childminder_signature: self.business.signer_name.clone(),
            childminder_signed_at: now,
        }
    }

    /// Render the stored document and fan out both notifications over one
    /// mail session. The document is already persisted: a failure here is
    /// logged and surfaced, but nothing is rolled back.
    fn render_and_notify(
        &self,
        guardian: &Guardian,
        child: &Child,
        document: &Document,
    ) -> Result<(), DocumentError> {
        let kind = document.kind();

        let pdf = render::render_document(document, child, &self.business).map_err(|err| {
            error!(kind = kind.label(), child = child.id.0, %err, "pdf render failed after persistence");
            err
        })?;

        let attachment = MailAttachment::pdf(
            format!(
                "{}_{}_{}.pdf",
                child.first_name,
                child.last_name,
                kind.attachment_stem()
            ),
            pdf,
        );

        let subject = match kind {
            DocumentKind::Contract => format!("Contract signed for {}", child.full_name()),
            DocumentKind::Consent => format!("Consent form signed for {}", child.full_name()),
            DocumentKind::Record => format!("Child Record completed for {}", child.full_name()),
        };

        let owner_message = OutboundMessage::plain(
            subject.clone(),
            self.business.trading_name.clone(),
            vec![self.business.owner_address.clone()],
            self.owner_body(guardian, child, kind),
        )
        .with_reply_to(guardian.mailbox())
        .with_attachment(attachment.clone());

        let guardian_message = OutboundMessage::plain(
            subject,
            self.business.trading_name.clone(),
            vec![guardian.email.clone()],
            self.guardian_body(guardian, child, kind),
        )
        .with_reply_to(format!(
            "\"{}\" <{}>",
            self.business.trading_name, self.business.owner_address
        ))
        .with_attachment(attachment);

        let report = self
            .notifier
            .dispatch(&[owner_message, guardian_message])
            .map_err(|err| {
                error!(kind = kind.label(), child = child.id.0, %err, "notification dispatch failed after persistence");
                err
            })?;

        for failure in &report.failures {
            warn!(
                recipient = %failure.recipient,
                reason = %failure.reason,
                kind = kind.label(),
                "document notification refused for one recipient"
            );
        }

        Ok(())
    }

    fn owner_body(&self, guardian: &Guardian, child: &Child, kind: DocumentKind) -> String {
        match kind {
            DocumentKind::Contract => format!(
                "{} has signed a contract on behalf of their child, {}.",
                guardian.full_name(),
                child.full_name()
            ),
            DocumentKind::Consent => format!(
                "{} has signed a consent form on behalf of their child, {}.",
                guardian.full_name(),
                child.full_name()
            ),
            DocumentKind::Record => format!(
                "{} has completed the child record form for {}.",
                guardian.full_name(),
                child.full_name()
            ),
        }
    }

    fn guardian_body(&self, guardian: &Guardian, child: &Child, kind: DocumentKind) -> String {
        match kind {
            DocumentKind::Contract => format!(
                "Hello {},\n\n\
                 Thank you so much for completing your child's contract. We cannot wait to \
                 welcome {} to our setting!\n\n\
                 Please see attached your filled-out contract. If you have any issues with the \
                 contents of the contract, or if this wasn't you filling out the contract, \
                 please contact us immediately.\n\n\
                 Kind regards,\n\n{}",
                guardian.first_name, child.first_name, self.business.trading_name
            ),
            DocumentKind::Consent => format!(
                "Hello {},\n\n\
                 Thank you for completing your child's consent forms. We cannot wait to welcome \
                 {} to our setting!\n\n\
                 Please see attached your filled-out consent form. If you have any issues with \
                 the contents of the form, or if this wasn't you filling it out, please contact \
                 us immediately.\n\n\
                 Kind regards,\n\n{}",
                guardian.first_name, child.first_name, self.business.trading_name
            ),
            DocumentKind::Record => format!(
                "Hello {},\n\n\
                 Thank you for completing the child record form for {}. This ensures we have \
                 up-to-date details for emergencies, health, and wellbeing.\n\n\
                 Attached is your completed copy.\n\n\
                 Kind regards,\n\n{}",
                guardian.first_name, child.first_name, self.business.trading_name
            ),
        }
    }
}

fn required_name(
    name: &'static str,
    value: Option<&str>,
) -> Result<String, ValidationError> {
    required_field(name, value).map(|cleaned| sanitise::trim_name(&cleaned))
}

fn optional_phone(value: Option<&str>) -> Option<String> {
    optional_field(value)
        .map(|phone| sanitise::clean_phone(&phone))
        .filter(|phone| !phone.is_empty())
}

/// Error raised by the document workflow.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("child not found")]
    NotFound,
    #[error("the requested child does not belong to this guardian")]
    Forbidden,
    #[error("a {} is already in place for this child", .0.label())]
    AlreadyExists(DocumentKind),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
