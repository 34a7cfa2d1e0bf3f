//! User identities and the directory they are resolved from.
//!
//! Identities are owned by the host's persistence layer; this crate only reads
//! them. Anonymized display names ("Student 42") are reversible back to the
//! real identity through the numeric suffix.

use crate::errors::StoreResult;
use crate::privilege::Privilege;
use serde::{Deserialize, Serialize};

pub type UserId = u64;

/// A user record, immutable for the lifetime of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    pub role_id: u32,
    pub privilege: Privilege,
}

impl Identity {
    pub fn new(id: UserId, name: impl Into<String>, role_id: u32, privilege: Privilege) -> Self {
        Self {
            id,
            name: name.into(),
            role_id,
            privilege,
        }
    }

    /// Capability rule for taking over `target`'s session.
    pub fn can_impersonate(&self, target: &Identity) -> bool {
        self.id != target.id && self.privilege.may_impersonate(target.privilege)
    }

    /// Name shown while the viewer is in anonymized view.
    pub fn anonymized_name(&self) -> String {
        format!("{} {}", self.privilege.title(), self.id)
    }
}

/// Extract the user id from an anonymized display name such as `"Student 42"`.
pub fn parse_anonymized_name(name: &str) -> Option<UserId> {
    let (title, id) = name.trim().rsplit_once(' ')?;
    if title.trim().is_empty() {
        return None;
    }
    id.parse().ok()
}

/// Lookup capability over the host's user records.
pub trait IdentityDirectory {
    fn find_by_name(&self, name: &str) -> StoreResult<Option<Identity>>;

    fn find_by_id(&self, id: UserId) -> StoreResult<Option<Identity>>;

    /// Identities whose name starts with `prefix`, in store order.
    fn find_by_name_prefix(&self, prefix: &str) -> StoreResult<Vec<Identity>>;

    /// Reverse an anonymized display name to the real identity.
    fn real_identity_from_anonymized_name(&self, name: &str) -> StoreResult<Option<Identity>> {
        match parse_anonymized_name(name) {
            Some(id) => {
                let found = self.find_by_id(id)?;
                // the title must match too, otherwise "Instructor 7" could reach a student
                Ok(found.filter(|identity| identity.anonymized_name() == name.trim()))
            }
            None => Ok(None),
        }
    }
}
