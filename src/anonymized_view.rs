use crate::errors::{AuthorityResult, SafeReadLock, SafeWriteLock};
use std::collections::HashSet;
use std::sync::RwLock;

/// Client addresses that currently see anonymized names.
///
/// Instructors toggle anonymized view for grading; while it is on, names typed
/// into the impersonation form are anonymized display names.
#[derive(Debug, Default)]
pub struct AnonymizedViewRegistry {
    starter_ips: RwLock<HashSet<String>>,
}

impl AnonymizedViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with addresses persisted by the host.
    pub fn from_ips<I, S>(ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            starter_ips: RwLock::new(ips.into_iter().map(Into::into).collect()),
        }
    }

    pub fn start(&self, ip: &str) -> AuthorityResult<()> {
        let mut ips = self.starter_ips.safe_write()?;
        if ips.insert(ip.to_string()) {
            tracing::debug!(ip, "anonymized view started");
        }
        Ok(())
    }

    pub fn stop(&self, ip: &str) -> AuthorityResult<()> {
        let mut ips = self.starter_ips.safe_write()?;
        if ips.remove(ip) {
            tracing::debug!(ip, "anonymized view stopped");
        }
        Ok(())
    }

    /// A missing address never counts as anonymized.
    pub fn is_anonymized_view(&self, ip: Option<&str>) -> AuthorityResult<bool> {
        match ip {
            Some(ip) => Ok(self.starter_ips.safe_read()?.contains(ip)),
            None => Ok(false),
        }
    }
}
