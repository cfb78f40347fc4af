use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::config::BusinessConfig;
use crate::notify::{DeliveryError, DeliveryReport, Notifier, OutboundMessage, RecipientFailure};
use crate::workflows::accounts::{
    Child, ChildId, ChildRepository, Guardian, GuardianId, GuardianRepository,
};
use crate::workflows::documents::domain::{
    ConsentSubmission, ContractSubmission, Document, DocumentKind, RecordSubmission,
};
use crate::workflows::documents::repository::DocumentRepository;
use crate::workflows::documents::service::DocumentService;
use crate::workflows::StoreError;

pub(super) const GUARDIAN: GuardianId = GuardianId(11);
pub(super) const OTHER_GUARDIAN: GuardianId = GuardianId(12);
pub(super) const CHILD: ChildId = ChildId(7);

pub(super) fn business() -> BusinessConfig {
    BusinessConfig {
        trading_name: "Little Ducklings Childminding".to_string(),
        signer_name: "Laura Oldfield".to_string(),
        day_fee_gbp: 45,
        owner_address: "owner@example.com".to_string(),
        public_url: "https://setting.example.com".to_string(),
    }
}

pub(super) fn guardian() -> Guardian {
    Guardian {
        id: GUARDIAN,
        first_name: "Jo".to_string(),
        last_name: "Bloggs".to_string(),
        email: "jo@example.com".to_string(),
        telephone: "+447700900123".to_string(),
        ipv4_on_activation: None,
        time_on_activation: None,
    }
}

pub(super) fn child() -> Child {
    Child {
        id: CHILD,
        first_name: "Maya".to_string(),
        last_name: "Bloggs".to_string(),
        dob: NaiveDate::from_ymd_opt(2021, 4, 12).expect("valid date"),
        guardian: GUARDIAN,
        contracted_days: vec![0, 1, 3],
        contract_start_date: NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
    }
}

pub(super) fn contract_submission() -> ContractSubmission {
    ContractSubmission {
        parent1_name: Some(" jo  BLOGGS ".to_string()),
        parent1_address: Some("12  Duck Lane,\nPondham".to_string()),
        parent1_telephone_home: Some("0121 496 0000".to_string()),
        parent1_telephone_work: None,
        parent1_telephone_mobile: Some("+44 7700 900123".to_string()),
        parent2_name: Some("sam bloggs".to_string()),
        parent2_address: Some("12 Duck Lane, Pondham".to_string()),
        parent2_telephone_home: None,
        parent2_telephone_work: None,
        parent2_telephone_mobile: Some("+44 7700 900456".to_string()),
        legal_contact: None,
        authorised_collectors: Some("Granny Bloggs, 3 Pond Row, 0121 496 1111".to_string()),
        collection_password: Some("quackers".to_string()),
        parent_signature: Some("Jo Bloggs".to_string()),
    }
}

pub(super) fn consent_submission() -> ConsentSubmission {
    let signed = || Some("Jo Bloggs".to_string());
    ConsentSubmission {
        policies_signature: signed(),
        complaints_signature: signed(),
        emergency_signature: signed(),
        emergency_caregiver_signature: signed(),
        outings_signature: signed(),
        photos_signature: signed(),
        transport_signature: signed(),
        equipment_signature: signed(),
        firstaid_signature: signed(),
        sharing_signature: signed(),
        plaster_signature: signed(),
        suncream_wipes_signature: signed(),
        calpol_signature: signed(),
        parent_signature: Some("Jo Bloggs".to_string()),
    }
}

pub(super) fn record_submission() -> RecordSubmission {
    RecordSubmission {
        home_address: Some("12 Duck Lane, Pondham".to_string()),
        languages_spoken: Some("English, Welsh".to_string()),
        religion_cultural_needs: Some("No pork".to_string()),
        doctor_name: Some("dr patel".to_string()),
        doctor_surgery: Some("Pondham Surgery".to_string()),
        doctor_phone: Some("0121 496 2222".to_string()),
        medical_conditions: Some("Mild asthma".to_string()),
        allergies: Some("Peanuts".to_string()),
        dietary_needs: None,
        medication: Some("Inhaler as needed".to_string()),
        vaccinations: Some("Up to date".to_string()),
        emergency_contact1_name: Some("granny bloggs".to_string()),
        emergency_contact1_relationship: Some("Grandmother".to_string()),
        emergency_contact1_phone: Some("0121 496 1111".to_string()),
        emergency_contact2_name: None,
        emergency_contact2_relationship: None,
        emergency_contact2_phone: None,
        additional_notes: Some("Naps after lunch".to_string()),
        parent_signature: Some("Jo Bloggs".to_string()),
    }
}

#[derive(Default)]
pub(super) struct MemoryGuardians {
    guardians: Mutex<HashMap<GuardianId, Guardian>>,
}

impl MemoryGuardians {
    pub(super) fn with(entries: Vec<Guardian>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut guard = store.guardians.lock().expect("guardian mutex poisoned");
            for guardian in entries {
                guard.insert(guardian.id, guardian);
            }
        }
        Arc::new(store)
    }
}

impl GuardianRepository for MemoryGuardians {
    fn insert(&self, guardian: Guardian) -> Result<Guardian, StoreError> {
        let mut guard = self.guardians.lock().expect("guardian mutex poisoned");
        if guard.contains_key(&guardian.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(guardian.id, guardian.clone());
        Ok(guardian)
    }

    fn update(&self, guardian: Guardian) -> Result<(), StoreError> {
        let mut guard = self.guardians.lock().expect("guardian mutex poisoned");
        if guard.contains_key(&guardian.id) {
            guard.insert(guardian.id, guardian);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn fetch(&self, id: GuardianId) -> Result<Option<Guardian>, StoreError> {
        let guard = self.guardians.lock().expect("guardian mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Guardian>, StoreError> {
        let guard = self.guardians.lock().expect("guardian mutex poisoned");
        Ok(guard.values().find(|g| g.email == email).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryChildren {
    children: Mutex<HashMap<ChildId, Child>>,
}

impl MemoryChildren {
    pub(super) fn with(entries: Vec<Child>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut guard = store.children.lock().expect("children mutex poisoned");
            for child in entries {
                guard.insert(child.id, child);
            }
        }
        Arc::new(store)
    }
}

impl ChildRepository for MemoryChildren {
    fn insert(&self, child: Child) -> Result<Child, StoreError> {
        let mut guard = self.children.lock().expect("children mutex poisoned");
        if guard.contains_key(&child.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(child.id, child.clone());
        Ok(child)
    }

    fn fetch(&self, id: ChildId) -> Result<Option<Child>, StoreError> {
        let guard = self.children.lock().expect("children mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn children_of(&self, guardian: GuardianId) -> Result<Vec<Child>, StoreError> {
        let guard = self.children.lock().expect("children mutex poisoned");
        Ok(guard
            .values()
            .filter(|child| child.guardian == guardian)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<Child>, StoreError> {
        let guard = self.children.lock().expect("children mutex poisoned");
        let mut children: Vec<Child> = guard.values().cloned().collect();
        children.sort_by_key(|child| child.id.0);
        Ok(children)
    }
}

/// In-memory document store. The conditional insert runs under one mutex,
/// which is the per-child mutual exclusion the repository contract asks for.
#[derive(Default)]
pub(super) struct MemoryDocuments {
    documents: Mutex<HashMap<(ChildId, DocumentKind), Document>>,
}

impl MemoryDocuments {
    pub(super) fn count(&self) -> usize {
        self.documents
            .lock()
            .expect("document mutex poisoned")
            .len()
    }
}

impl DocumentRepository for MemoryDocuments {
    fn insert(&self, document: Document) -> Result<Document, StoreError> {
        let mut guard = self.documents.lock().expect("document mutex poisoned");
        let key = (document.child(), document.kind());
        if guard.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        guard.insert(key, document.clone());
        Ok(document)
    }

    fn fetch(&self, child: ChildId, kind: DocumentKind) -> Result<Option<Document>, StoreError> {
        let guard = self.documents.lock().expect("document mutex poisoned");
        Ok(guard.get(&(child, kind)).cloned())
    }

    fn for_child(&self, child: ChildId) -> Result<Vec<Document>, StoreError> {
        let guard = self.documents.lock().expect("document mutex poisoned");
        let mut documents: Vec<Document> = guard
            .iter()
            .filter(|((owner, _), _)| *owner == child)
            .map(|(_, document)| document.clone())
            .collect();
        documents.sort_by_key(|document| document.kind().attachment_stem());
        Ok(documents)
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    pub(super) sent: Mutex<Vec<OutboundMessage>>,
}

impl MemoryNotifier {
    pub(super) fn messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for MemoryNotifier {
    fn dispatch(&self, batch: &[OutboundMessage]) -> Result<DeliveryReport, DeliveryError> {
        let mut guard = self.sent.lock().expect("notifier mutex poisoned");
        guard.extend(batch.iter().cloned());
        Ok(DeliveryReport {
            delivered: batch.iter().map(|message| message.to.len()).sum(),
            failures: Vec::new(),
        })
    }
}

/// Notifier whose session never comes up.
pub(super) struct DeadRelayNotifier;

impl Notifier for DeadRelayNotifier {
    fn dispatch(&self, _batch: &[OutboundMessage]) -> Result<DeliveryReport, DeliveryError> {
        Err(DeliveryError::Session("connection refused".to_string()))
    }
}

/// Notifier that refuses one named recipient but accepts the rest.
pub(super) struct PickyNotifier {
    pub(super) refuse: String,
    pub(super) sent: Mutex<Vec<OutboundMessage>>,
}

impl Notifier for PickyNotifier {
    fn dispatch(&self, batch: &[OutboundMessage]) -> Result<DeliveryReport, DeliveryError> {
        let mut report = DeliveryReport::default();
        let mut guard = self.sent.lock().expect("notifier mutex poisoned");
        for message in batch {
            for recipient in &message.to {
                if *recipient == self.refuse {
                    report.failures.push(RecipientFailure {
                        recipient: recipient.clone(),
                        reason: "mailbox unavailable".to_string(),
                    });
                } else {
                    report.delivered += 1;
                }
            }
            guard.push(message.clone());
        }
        Ok(report)
    }
}

pub(super) type TestService =
    DocumentService<MemoryDocuments, MemoryChildren, MemoryGuardians, MemoryNotifier>;

pub(super) fn build_service() -> (Arc<TestService>, Arc<MemoryDocuments>, Arc<MemoryNotifier>) {
    let documents = Arc::new(MemoryDocuments::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = Arc::new(DocumentService::new(
        documents.clone(),
        MemoryChildren::with(vec![child()]),
        MemoryGuardians::with(vec![guardian()]),
        notifier.clone(),
        business(),
    ));
    (service, documents, notifier)
}
