//! Library root for the `review_authority` crate
//!
//! Decision components of a peer-review course application: who may
//! impersonate whom (and what the session looks like afterwards), and which
//! mentor a growing team gets.

// Core error handling
pub mod errors;

// Identities and sessions
pub mod identity;
pub mod privilege;
pub mod session_context;

// Impersonation
pub mod anonymized_view;
pub mod impersonation;
pub mod input_validator;

// Mentor balancing
pub mod mentor;

// Audit
pub mod audit;

// Configuration & CLI
pub mod cli;
pub mod config_loader;
pub mod roster;

pub use errors::{AuthorityError, AuthorityResult, StoreError, StoreResult};
pub use identity::{Identity, IdentityDirectory};
pub use impersonation::{
    action_allowed, ensure_action_allowed, HomeDestination, HomeResolver,
    ImpersonationAuthority, ImpersonationOutcome, ImpersonationRequest, RequestForm, Transition,
    TransitionKind,
};
pub use mentor::{MentorAssignment, MentorBalancer, MentorLoad, MentorStore};
pub use privilege::Privilege;
pub use session_context::{SessionContext, SessionStore};
