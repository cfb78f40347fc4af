use crate::workflows::StoreError;

use super::domain::{Child, ChildId, Guardian, GuardianId};

/// Storage abstraction for guardian accounts.
pub trait GuardianRepository: Send + Sync {
    fn insert(&self, guardian: Guardian) -> Result<Guardian, StoreError>;
    fn update(&self, guardian: Guardian) -> Result<(), StoreError>;
    fn fetch(&self, id: GuardianId) -> Result<Option<Guardian>, StoreError>;
    fn find_by_email(&self, email: &str) -> Result<Option<Guardian>, StoreError>;
}

/// Storage abstraction for children.
pub trait ChildRepository: Send + Sync {
    fn insert(&self, child: Child) -> Result<Child, StoreError>;
    fn fetch(&self, id: ChildId) -> Result<Option<Child>, StoreError>;
    fn children_of(&self, guardian: GuardianId) -> Result<Vec<Child>, StoreError>;
    /// Every child on the books, for the staff register view.
    fn all(&self) -> Result<Vec<Child>, StoreError>;
}
