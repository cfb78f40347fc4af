use std::net::IpAddr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::accounts::ChildId;

/// Identifier wrapper for stored legal documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

/// The three legal documents a child can hold, each create-once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Contract,
    Consent,
    Record,
}

impl DocumentKind {
    /// Human-readable name used in messages to guardians.
    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::Contract => "contract",
            DocumentKind::Consent => "consent form",
            DocumentKind::Record => "child record",
        }
    }

    /// Stem used in the attachment filename
    /// `{First}_{Last}_{stem}.pdf`.
    pub const fn attachment_stem(self) -> &'static str {
        match self {
            DocumentKind::Contract => "Contract",
            DocumentKind::Consent => "Consent",
            DocumentKind::Record => "Child_Record",
        }
    }
}

/// Signing provenance captured at creation. No code path updates these
/// after the document is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signatures {
    /// Typed name, not a cryptographic signature.
    pub parent_signature: String,
    pub parent_signed_at: DateTime<Utc>,
    /// Null when the transport did not supply a client address.
    pub parent_ip: Option<IpAddr>,
    pub childminder_signature: String,
    pub childminder_signed_at: DateTime<Utc>,
}

/// The childminding contract: parental responsibility, collection
/// arrangements, and fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: DocumentId,
    pub child: ChildId,
    pub parent1_name: String,
    pub parent1_address: String,
    pub parent1_telephone_home: Option<String>,
    pub parent1_telephone_work: Option<String>,
    pub parent1_telephone_mobile: Option<String>,
    pub parent2_name: Option<String>,
    pub parent2_address: Option<String>,
    pub parent2_telephone_home: Option<String>,
    pub parent2_telephone_work: Option<String>,
    pub parent2_telephone_mobile: Option<String>,
    /// Additional contact with legal rights, when one exists.
    pub legal_contact: Option<String>,
    /// Authorised collectors with addresses and phone numbers.
    pub authorised_collectors: String,
    pub collection_password: String,
    pub day_fee_gbp: u32,
    pub start_date: NaiveDate,
    pub signatures: Signatures,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The consent form: thirteen named consents, each a typed signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentForm {
    pub id: DocumentId,
    pub child: ChildId,
    pub policies_signature: String,
    pub complaints_signature: String,
    pub emergency_signature: String,
    pub emergency_caregiver_signature: String,
    pub outings_signature: String,
    pub photos_signature: String,
    pub transport_signature: String,
    pub equipment_signature: String,
    pub firstaid_signature: String,
    pub sharing_signature: String,
    pub plaster_signature: String,
    pub suncream_wipes_signature: String,
    pub calpol_signature: String,
    pub signatures: Signatures,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The child record: home, health, and emergency-contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRecord {
    pub id: DocumentId,
    pub child: ChildId,
    pub home_address: String,
    pub languages_spoken: String,
    pub religion_cultural_needs: Option<String>,
    pub doctor_name: String,
    pub doctor_surgery: String,
    pub doctor_phone: String,
    pub medical_conditions: Option<String>,
    pub allergies: Option<String>,
    pub dietary_needs: Option<String>,
    pub medication: Option<String>,
    pub vaccinations: Option<String>,
    pub emergency_contact1_name: String,
    pub emergency_contact1_relationship: String,
    pub emergency_contact1_phone: String,
    pub emergency_contact2_name: Option<String>,
    pub emergency_contact2_relationship: Option<String>,
    pub emergency_contact2_phone: Option<String>,
    pub additional_notes: Option<String>,
    pub signatures: Signatures,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored document of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Document {
    Contract(Contract),
    Consent(ConsentForm),
    Record(ChildRecord),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Contract(_) => DocumentKind::Contract,
            Document::Consent(_) => DocumentKind::Consent,
            Document::Record(_) => DocumentKind::Record,
        }
    }

    pub fn child(&self) -> ChildId {
        match self {
            Document::Contract(contract) => contract.child,
            Document::Consent(consent) => consent.child,
            Document::Record(record) => record.child,
        }
    }

    pub fn signatures(&self) -> &Signatures {
        match self {
            Document::Contract(contract) => &contract.signatures,
            Document::Consent(consent) => &consent.signatures,
            Document::Record(record) => &record.signatures,
        }
    }
}

/// Inbound contract form. Every field is optional at the wire level so a
/// missing required field becomes a typed validation error, not a
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractSubmission {
    #[serde(default)]
    pub parent1_name: Option<String>,
    #[serde(default)]
    pub parent1_address: Option<String>,
    #[serde(default)]
    pub parent1_telephone_home: Option<String>,
    #[serde(default)]
    pub parent1_telephone_work: Option<String>,
    #[serde(default)]
    pub parent1_telephone_mobile: Option<String>,
    #[serde(default)]
    pub parent2_name: Option<String>,
    #[serde(default)]
    pub parent2_address: Option<String>,
    #[serde(default)]
    pub parent2_telephone_home: Option<String>,
    #[serde(default)]
    pub parent2_telephone_work: Option<String>,
    #[serde(default)]
    pub parent2_telephone_mobile: Option<String>,
    #[serde(default)]
    pub legal_contact: Option<String>,
    #[serde(default)]
    pub authorised_collectors: Option<String>,
    #[serde(default)]
    pub collection_password: Option<String>,
    #[serde(default)]
    pub parent_signature: Option<String>,
}

/// Inbound consent form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsentSubmission {
    #[serde(default)]
    pub policies_signature: Option<String>,
    #[serde(default)]
    pub complaints_signature: Option<String>,
    #[serde(default)]
    pub emergency_signature: Option<String>,
    #[serde(default)]
    pub emergency_caregiver_signature: Option<String>,
    #[serde(default)]
    pub outings_signature: Option<String>,
    #[serde(default)]
    pub photos_signature: Option<String>,
    #[serde(default)]
    pub transport_signature: Option<String>,
    #[serde(default)]
    pub equipment_signature: Option<String>,
    #[serde(default)]
    pub firstaid_signature: Option<String>,
    #[serde(default)]
    pub sharing_signature: Option<String>,
    #[serde(default)]
    pub plaster_signature: Option<String>,
    #[serde(default)]
    pub suncream_wipes_signature: Option<String>,
    #[serde(default)]
    pub calpol_signature: Option<String>,
    #[serde(default)]
    pub parent_signature: Option<String>,
}

/// Inbound child record form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordSubmission {
    #[serde(default)]
    pub home_address: Option<String>,
    #[serde(default)]
    pub languages_spoken: Option<String>,
    #[serde(default)]
    pub religion_cultural_needs: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub doctor_surgery: Option<String>,
    #[serde(default)]
    pub doctor_phone: Option<String>,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub dietary_needs: Option<String>,
    #[serde(default)]
    pub medication: Option<String>,
    #[serde(default)]
    pub vaccinations: Option<String>,
    #[serde(default)]
    pub emergency_contact1_name: Option<String>,
    #[serde(default)]
    pub emergency_contact1_relationship: Option<String>,
    #[serde(default)]
    pub emergency_contact1_phone: Option<String>,
    #[serde(default)]
    pub emergency_contact2_name: Option<String>,
    #[serde(default)]
    pub emergency_contact2_relationship: Option<String>,
    #[serde(default)]
    pub emergency_contact2_phone: Option<String>,
    #[serde(default)]
    pub additional_notes: Option<String>,
    #[serde(default)]
    pub parent_signature: Option<String>,
}
