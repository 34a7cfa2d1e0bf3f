//! Authorization and session transitions for user impersonation.
//!
//! Support staff and graders take over another user's session to see what
//! that user sees. `ImpersonationAuthority::decide` validates the request,
//! resolves the target, checks the capability rule and computes the next
//! session without touching the host's session storage. The returned
//! [`Transition`] is committed separately, in one write, so a failed request
//! never leaves a partial session behind.

use crate::audit::{AuditAction, AuditEvent, AuditSink, LogLevel};
use crate::errors::{AuthorityError, AuthorityResult};
use crate::identity::{Identity, IdentityDirectory};
use crate::input_validator::InputValidator;
use crate::session_context::{SessionContext, SessionStore};
use serde::{Deserialize, Serialize};

/// Which form submitted the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestForm {
    /// The standalone "impersonate a user" page.
    StartPage,
    /// The in-place "impersonate a new account" box; an empty name reverts.
    SwitchAccount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonationRequest {
    pub name: String,
    pub form: RequestForm,
    /// Whether the caller is in anonymized view, so `name` is a display name.
    pub anonymized_view: bool,
}

impl ImpersonationRequest {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            form: RequestForm::StartPage,
            anonymized_view: false,
        }
    }

    pub fn switch(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            form: RequestForm::SwitchAccount,
            anonymized_view: false,
        }
    }

    pub fn revert() -> Self {
        Self::switch("")
    }

    pub fn anonymized(mut self, anonymized_view: bool) -> Self {
        self.anonymized_view = anonymized_view;
        self
    }

    fn is_revert(&self) -> bool {
        self.form == RequestForm::SwitchAccount && self.name.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    Start,
    Switch,
    Revert,
}

/// A computed, not yet committed, session change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub kind: TransitionKind,
    pub session: SessionContext,
}

impl Transition {
    pub fn current_user(&self) -> &Identity {
        &self.session.current_user
    }

    /// Commit to the host's session store and work out where to send the user.
    pub fn apply<S, R>(self, store: &mut S, resolver: &R) -> AuthorityResult<ImpersonationOutcome>
    where
        S: SessionStore + ?Sized,
        R: HomeResolver + ?Sized,
    {
        let role_id = self.session.current_user.role_id;
        let current_user = self.session.current_user.clone();

        store.clear_cached_role()?;
        store.commit(self.session, role_id)?;

        let destination = resolver.home_for(&current_user);
        Ok(ImpersonationOutcome {
            kind: self.kind,
            current_user,
            destination,
        })
    }
}

/// Where the host should route the user after a successful transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeDestination {
    pub controller: String,
    pub action: String,
}

impl HomeDestination {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }
}

/// Role-dependent home page lookup, owned by the host's router.
pub trait HomeResolver {
    fn home_for(&self, identity: &Identity) -> HomeDestination;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationOutcome {
    pub kind: TransitionKind,
    pub current_user: Identity,
    pub destination: HomeDestination,
}

/// Gate evaluated before `decide`: TAs and above always; students only while
/// a super user is already recorded on the session.
pub fn action_allowed(session: &SessionContext) -> bool {
    let privilege = session.current_user.privilege;
    if privilege.has_ta_privileges() {
        true
    } else if privilege.has_student_privileges() {
        session.super_user.is_some()
    } else {
        false
    }
}

/// [`action_allowed`] as a result, naming the caller on denial.
pub fn ensure_action_allowed(session: &SessionContext) -> AuthorityResult<()> {
    if action_allowed(session) {
        Ok(())
    } else {
        tracing::warn!(caller = %session.current_user.name, "impersonation gate denied");
        Err(AuthorityError::not_allowed(&session.current_user.name))
    }
}

pub struct ImpersonationAuthority<'a, D: IdentityDirectory + ?Sized> {
    directory: &'a D,
    audit: &'a dyn AuditSink,
    validator: InputValidator,
}

impl<'a, D: IdentityDirectory + ?Sized> ImpersonationAuthority<'a, D> {
    pub fn new(directory: &'a D, audit: &'a dyn AuditSink) -> Self {
        Self {
            directory,
            audit,
            validator: InputValidator::new(),
        }
    }

    /// Compute the session transition for `request`. `session` is never modified.
    pub fn decide(
        &self,
        session: &SessionContext,
        request: &ImpersonationRequest,
    ) -> AuthorityResult<Transition> {
        let original_user = session.acting_user();

        if request.is_revert() {
            return self.revert(session);
        }

        self.validator.validate_name("Username", &request.name)?;

        let target = self.resolve_target(request)?;

        if !original_user.can_impersonate(&target) {
            tracing::warn!(
                caller = %original_user.name,
                target_user = %request.name,
                "impersonation denied"
            );
            self.audit.record(
                AuditEvent::new(&original_user.name, AuditAction::ImpersonationDenied)
                    .with_severity(LogLevel::Warn)
                    .with_target(&target.name)
                    .with_context(format!(
                        "{} -> {}",
                        original_user.privilege, target.privilege
                    )),
            );
            return Err(AuthorityError::not_permitted(&request.name));
        }

        let mut next = session.clone();
        let kind = match request.form {
            RequestForm::StartPage => {
                if next.super_user.is_none() {
                    next.super_user = Some(session.current_user.clone());
                }
                TransitionKind::Start
            }
            RequestForm::SwitchAccount => TransitionKind::Switch,
        };
        next.original_user = Some(original_user.clone());
        next.impersonating = true;
        next.current_user = target;

        let action = match kind {
            TransitionKind::Start => AuditAction::ImpersonationStarted,
            _ => AuditAction::ImpersonationSwitched,
        };
        tracing::info!(
            caller = %original_user.name,
            target_user = %next.current_user.name,
            ?kind,
            "impersonation granted"
        );
        self.audit.record(
            AuditEvent::new(&original_user.name, action).with_target(&next.current_user.name),
        );

        Ok(Transition {
            kind,
            session: next,
        })
    }

    /// Names the caller could impersonate, for the name auto-complete.
    pub fn available_targets(
        &self,
        caller: &Identity,
        prefix: &str,
        limit: usize,
    ) -> AuthorityResult<Vec<Identity>> {
        self.validator.validate_name("Username", prefix)?;
        let mut candidates: Vec<Identity> = self
            .directory
            .find_by_name_prefix(prefix)?
            .into_iter()
            .filter(|candidate| caller.can_impersonate(candidate))
            .collect();
        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        candidates.truncate(limit);
        Ok(candidates)
    }

    fn revert(&self, session: &SessionContext) -> AuthorityResult<Transition> {
        let super_user = session
            .super_user
            .clone()
            .ok_or(AuthorityError::NoOriginalAccount)?;

        tracing::info!(
            from = %session.current_user.name,
            to = %super_user.name,
            "impersonation reverted"
        );
        self.audit.record(
            AuditEvent::new(&super_user.name, AuditAction::ImpersonationReverted)
                .with_target(&session.current_user.name),
        );

        let mut next = session.clone();
        next.current_user = super_user;
        next.super_user = None;
        next.original_user = None;
        next.impersonating = false;

        Ok(Transition {
            kind: TransitionKind::Revert,
            session: next,
        })
    }

    fn resolve_target(&self, request: &ImpersonationRequest) -> AuthorityResult<Identity> {
        let found = if request.anonymized_view {
            tracing::debug!(name = %request.name, "resolving anonymized name");
            self.directory
                .real_identity_from_anonymized_name(&request.name)?
        } else {
            self.directory.find_by_name(&request.name)?
        };
        found.ok_or_else(|| AuthorityError::user_not_found(&request.name))
    }
}
