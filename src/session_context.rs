use crate::errors::StoreResult;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};

/// Session state relevant to impersonation. Owned by the host; the authority
/// only reads it and hands back the next value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub current_user: Identity,
    #[serde(default)]
    pub original_user: Option<Identity>,
    /// Identity restored when impersonation ends.
    #[serde(default)]
    pub super_user: Option<Identity>,
    #[serde(default)]
    pub impersonating: bool,
    #[serde(default)]
    pub client_ip: Option<String>,
}

impl SessionContext {
    pub fn new(current_user: Identity) -> Self {
        SessionContext {
            current_user,
            original_user: None,
            super_user: None,
            impersonating: false,
            client_ip: None,
        }
    }

    pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = Some(ip.into());
        self
    }

    /// The identity acting behind the session: the super user if one is
    /// recorded, otherwise whoever is logged in.
    pub fn acting_user(&self) -> &Identity {
        self.super_user.as_ref().unwrap_or(&self.current_user)
    }

    pub fn is_consistent(&self) -> bool {
        self.impersonating == self.original_user.is_some()
    }

    pub fn summary_string(&self) -> String {
        match &self.original_user {
            Some(original) => format!("{} (as {})", original.name, self.current_user.name),
            None => self.current_user.name.clone(),
        }
    }
}

/// Write side of the host's session storage.
pub trait SessionStore {
    /// Drop any per-session role cache so it is rebuilt for the new user.
    fn clear_cached_role(&mut self) -> StoreResult<()>;

    /// Store the session together with its current role in a single write.
    /// On error neither may be visible.
    fn commit(&mut self, session: SessionContext, current_role: u32) -> StoreResult<()>;
}

/// Session store kept in memory, used by the CLI and tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    pub session: Option<SessionContext>,
    pub current_role: Option<u32>,
    pub role_cache_clears: usize,
}

impl MemorySessionStore {
    pub fn new(session: SessionContext) -> Self {
        Self {
            current_role: Some(session.current_user.role_id),
            session: Some(session),
            role_cache_clears: 0,
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn clear_cached_role(&mut self) -> StoreResult<()> {
        self.current_role = None;
        self.role_cache_clears += 1;
        Ok(())
    }

    fn commit(&mut self, session: SessionContext, current_role: u32) -> StoreResult<()> {
        self.session = Some(session);
        self.current_role = Some(current_role);
        Ok(())
    }
}
