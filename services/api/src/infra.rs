use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use childminder::workflows::accounts::{
    ActivationTokens, Child, ChildId, ChildRepository, Guardian, GuardianId, GuardianRepository,
};
use childminder::workflows::attendance::{RegisterEntry, RegisterRepository};
use childminder::workflows::documents::{Document, DocumentKind, DocumentRepository};
use childminder::workflows::StoreError;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryGuardianStore {
    guardians: Mutex<HashMap<GuardianId, Guardian>>,
}

impl GuardianRepository for InMemoryGuardianStore {
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
pub(crate) struct InMemoryChildStore {
    children: Mutex<HashMap<ChildId, Child>>,
}

impl ChildRepository for InMemoryChildStore {
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

/// Conditional insert under one mutex so the one-per-child invariant holds
/// for racing submissions, per the repository contract.
#[derive(Default)]
pub(crate) struct InMemoryDocumentStore {
    documents: Mutex<HashMap<(ChildId, DocumentKind), Document>>,
}

impl DocumentRepository for InMemoryDocumentStore {
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
        Ok(guard
            .iter()
            .filter(|((owner, _), _)| *owner == child)
            .map(|(_, document)| document.clone())
            .collect())
    }
}

/// Open-check and mutation under one mutex so at most one open entry per
/// child survives racing clock-ins.
#[derive(Default)]
pub(crate) struct InMemoryRegisterStore {
    entries: Mutex<Vec<RegisterEntry>>,
}

impl RegisterRepository for InMemoryRegisterStore {
    fn open_entry(&self, entry: RegisterEntry) -> Result<RegisterEntry, StoreError> {
        let mut guard = self.entries.lock().expect("register mutex poisoned");
        if guard.iter().any(|e| e.child == entry.child && e.is_open()) {
            return Err(StoreError::Conflict);
        }
        guard.push(entry.clone());
        Ok(entry)
    }

    fn close_entry(
        &self,
        child: ChildId,
        at: DateTime<Utc>,
    ) -> Result<RegisterEntry, StoreError> {
        let mut guard = self.entries.lock().expect("register mutex poisoned");
        let open = guard
            .iter_mut()
            .find(|e| e.child == child && e.is_open())
            .ok_or(StoreError::NotFound)?;
        open.clock_out = Some(at);
        Ok(open.clone())
    }

    fn open_for(&self, child: ChildId) -> Result<Option<RegisterEntry>, StoreError> {
        let guard = self.entries.lock().expect("register mutex poisoned");
        Ok(guard
            .iter()
            .find(|e| e.child == child && e.is_open())
            .cloned())
    }

    fn entries_for(&self, child: ChildId) -> Result<Vec<RegisterEntry>, StoreError> {
        let guard = self.entries.lock().expect("register mutex poisoned");
        Ok(guard.iter().filter(|e| e.child == child).cloned().collect())
    }
}

/// Stand-in token collaborator until the identity provider is wired in:
/// opaque, deterministic per guardian, unguessable enough for development.
pub(crate) struct OpaqueTokens {
    salt: u64,
}

impl Default for OpaqueTokens {
    fn default() -> Self {
        Self::new(0x6d69_6e64_6572)
    }
}

impl OpaqueTokens {
    pub(crate) fn new(salt: u64) -> Self {
        Self { salt }
    }

    fn token_for(&self, guardian: &Guardian) -> String {
        let mut hasher = DefaultHasher::new();
        self.salt.hash(&mut hasher);
        guardian.id.0.hash(&mut hasher);
        guardian.email.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

impl ActivationTokens for OpaqueTokens {
    fn issue(&self, guardian: &Guardian) -> String {
        self.token_for(guardian)
    }

    fn verify(&self, guardian: &Guardian, token: &str) -> bool {
        self.token_for(guardian) == token
    }
}
