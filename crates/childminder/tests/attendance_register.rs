//! Integration scenarios for the daily register: the clock-in/clock-out
//! cycle and the single-open-entry invariant under contention.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, NaiveDate, Utc};

    use childminder::workflows::accounts::{Child, ChildId, ChildRepository, GuardianId};
    use childminder::workflows::attendance::{
        AttendanceService, RegisterEntry, RegisterRepository,
    };
    use childminder::workflows::StoreError;

    pub const CHILD: ChildId = ChildId(41);

    pub fn child() -> Child {
        Child {
            id: CHILD,
            first_name: "Maya".to_string(),
            last_name: "Bloggs".to_string(),
            dob: NaiveDate::from_ymd_opt(2021, 4, 12).expect("valid date"),
            guardian: GuardianId(21),
            contracted_days: vec![0, 1, 3],
            contract_start_date: NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
        }
    }

    #[derive(Default)]
    pub struct MemoryChildren {
        children: Mutex<HashMap<ChildId, Child>>,
    }

    impl MemoryChildren {
        pub fn with(entries: Vec<Child>) -> Arc<Self> {
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

    /// Open-check and mutation under one mutex, per the repository contract.
    #[derive(Default)]
    pub struct MemoryRegister {
        pub entries: Mutex<Vec<RegisterEntry>>,
    }

    impl RegisterRepository for MemoryRegister {
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

    pub type Service = AttendanceService<MemoryRegister, MemoryChildren>;

    pub fn build_service() -> (Arc<Service>, Arc<MemoryRegister>) {
        let register = Arc::new(MemoryRegister::default());
        let service = Arc::new(AttendanceService::new(
            register.clone(),
            MemoryChildren::with(vec![child()]),
        ));
        (service, register)
    }
}

use std::sync::{Arc, Barrier};
use std::thread;

use childminder::workflows::attendance::AttendanceError;

use common::*;

#[test]
fn clock_cycle_enforces_the_open_entry_invariant() {
    let (service, register) = build_service();

    service.clock_in(CHILD).expect("clock-in");
    match service.clock_in(CHILD) {
        Err(AttendanceError::AlreadyClockedIn) => {}
        other => panic!("expected AlreadyClockedIn, got {other:?}"),
    }

    service.clock_out(CHILD).expect("clock-out");
    service.clock_in(CHILD).expect("clock-in after clock-out");

    let entries = register.entries.lock().expect("register mutex poisoned");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries.iter().filter(|entry| entry.is_open()).count(), 1);
}

#[test]
fn concurrent_clock_ins_have_exactly_one_winner() {
    let (service, register) = build_service();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let mut handles = Vec::new();

    for _ in 0..threads {
        let service = service.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            service.clock_in(CHILD)
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.join().expect("thread completes") {
            Ok(_) => winners += 1,
            Err(AttendanceError::AlreadyClockedIn) => {}
            Err(other) => panic!("unexpected error under contention: {other:?}"),
        }
    }

    assert_eq!(winners, 1);
    let entries = register.entries.lock().expect("register mutex poisoned");
    assert_eq!(entries.iter().filter(|entry| entry.is_open()).count(), 1);
}
