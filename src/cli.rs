use crate::anonymized_view::AnonymizedViewRegistry;
use crate::audit::{AuditSink, NullAuditSink, TracingAuditSink};
use crate::config_loader::AuthorityConfig;
use crate::errors::{AuthorityError, AuthorityResult};
use crate::identity::{Identity, IdentityDirectory};
use crate::impersonation::{
    ensure_action_allowed, HomeDestination, HomeResolver, ImpersonationAuthority,
    ImpersonationRequest,
};
use crate::mentor::MentorBalancer;
use crate::roster::Roster;
use crate::session_context::{MemorySessionStore, SessionContext};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;

/// Top-level CLI interface
#[derive(Parser)]
#[command(
    name = "review-authority",
    version = "0.1.0",
    about = "Impersonation and mentor assignment decisions over a roster file"
)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decide an impersonation request against a session file
    Impersonate {
        #[arg(short, long)]
        roster: String,
        #[arg(short, long)]
        session: String,
        /// Target user name; empty with --switch reverts
        #[arg(short, long, default_value = "")]
        name: String,
        /// Use the in-place "impersonate a new account" form
        #[arg(long)]
        switch: bool,
        /// Treat the name as an anonymized display name even if the session's
        /// client address is not listed in the roster
        #[arg(long)]
        anonymized: bool,
    },

    /// List mentors of an assignment by how many teams they supervise
    RankMentors {
        #[arg(short, long)]
        roster: String,
        #[arg(short, long)]
        assignment: u64,
    },

    /// Pick the least-loaded mentor of an assignment
    SelectMentor {
        #[arg(short, long)]
        roster: String,
        #[arg(short, long)]
        assignment: u64,
    },

    /// Names the given user could impersonate
    Candidates {
        #[arg(short, long)]
        roster: String,
        #[arg(long = "as")]
        caller: String,
        #[arg(short, long, default_value = "")]
        prefix: String,
    },
}

/// Home pages keyed on privilege, matching the web application's menus.
pub struct PrivilegeHome;

impl HomeResolver for PrivilegeHome {
    fn home_for(&self, identity: &Identity) -> HomeDestination {
        if identity.privilege.has_ta_privileges() {
            HomeDestination::new("tree_display", "list")
        } else {
            HomeDestination::new("student_task", "list")
        }
    }
}

fn read_session(path: &str) -> AuthorityResult<SessionContext> {
    let content = fs::read_to_string(path)
        .map_err(|e| AuthorityError::io(format!("reading {path}"), e))?;
    serde_json::from_str(&content)
        .map_err(|e| AuthorityError::serialization(format!("parsing {path}"), e))
}

/// Run a parsed command and return its JSON output.
pub fn run(command: Commands, config: &AuthorityConfig) -> AuthorityResult<serde_json::Value> {
    let audit: &dyn AuditSink = if config.audit_enabled {
        &TracingAuditSink
    } else {
        &NullAuditSink
    };

    match command {
        Commands::Impersonate {
            roster,
            session,
            name,
            switch,
            anonymized,
        } => {
            let roster = Roster::from_file(&roster)?;
            let session = read_session(&session)?;
            ensure_action_allowed(&session)?;

            let registry =
                AnonymizedViewRegistry::from_ips(roster.anonymized_view_ips.iter().cloned());
            let anonymized_view =
                anonymized || registry.is_anonymized_view(session.client_ip.as_deref())?;

            let request = if switch {
                ImpersonationRequest::switch(name)
            } else {
                ImpersonationRequest::start(name)
            }
            .anonymized(anonymized_view);

            let authority = ImpersonationAuthority::new(&roster, audit);
            let mut store = MemorySessionStore::new(session.clone());
            let outcome = authority
                .decide(&session, &request)?
                .apply(&mut store, &PrivilegeHome)?;

            Ok(json!({
                "outcome": outcome,
                "session": store.session,
            }))
        }
        Commands::RankMentors { roster, assignment } => {
            let mut roster = Roster::from_file(&roster)?;
            let balancer =
                MentorBalancer::new(&mut roster, audit, config.mentor_threshold_percent);
            Ok(serde_json::to_value(balancer.rank_mentors_by_load(assignment)?)?)
        }
        Commands::SelectMentor { roster, assignment } => {
            let mut roster = Roster::from_file(&roster)?;
            let balancer =
                MentorBalancer::new(&mut roster, audit, config.mentor_threshold_percent);
            Ok(serde_json::to_value(balancer.select_mentor(assignment)?)?)
        }
        Commands::Candidates {
            roster,
            caller,
            prefix,
        } => {
            let roster = Roster::from_file(&roster)?;
            let caller = roster
                .find_by_name(&caller)?
                .ok_or_else(|| AuthorityError::user_not_found(&caller))?;
            let authority = ImpersonationAuthority::new(&roster, audit);
            let names: Vec<String> = authority
                .available_targets(&caller, &prefix, config.autocomplete_limit)?
                .into_iter()
                .map(|identity| identity.name)
                .collect();
            Ok(json!(names))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn roster_file() -> tempfile::NamedTempFile {
        roster_file_with_ips(&[])
    }

    fn roster_file_with_ips(ips: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "users": [
                    {{"id": 1, "name": "alice", "role_id": 3, "privilege": "instructor"}},
                    {{"id": 2, "name": "bob", "role_id": 1, "privilege": "student"}}
                ],
                "participants": [
                    {{"id": 10, "user_id": 1, "assignment_id": 5, "duty": "mentor"}}
                ],
                "anonymized_view_ips": {}
            }}"#,
            serde_json::to_string(ips).unwrap()
        )
        .unwrap();
        file
    }

    fn session_file(json: serde_json::Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{json}").unwrap();
        file
    }

    fn alice_session(client_ip: &str) -> tempfile::NamedTempFile {
        session_file(json!({
            "current_user": {"id": 1, "name": "alice", "role_id": 3, "privilege": "instructor"},
            "client_ip": client_ip
        }))
    }

    fn impersonate(
        roster: &tempfile::NamedTempFile,
        session: &tempfile::NamedTempFile,
        name: &str,
        switch: bool,
        anonymized: bool,
    ) -> AuthorityResult<serde_json::Value> {
        run(
            Commands::Impersonate {
                roster: roster.path().to_string_lossy().into_owned(),
                session: session.path().to_string_lossy().into_owned(),
                name: name.to_string(),
                switch,
                anonymized,
            },
            &AuthorityConfig::default(),
        )
    }

    #[test]
    fn test_cli_parses_impersonate() {
        let cli = Cli::parse_from([
            "review-authority",
            "impersonate",
            "--roster",
            "r.json",
            "--session",
            "s.json",
            "--name",
            "bob",
            "--switch",
        ]);
        match cli.command {
            Commands::Impersonate { name, switch, .. } => {
                assert_eq!(name, "bob");
                assert!(switch);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_run_impersonate() {
        let roster = roster_file();
        let mut session = tempfile::NamedTempFile::new().unwrap();
        write!(
            session,
            r#"{{"current_user": {{"id": 1, "name": "alice", "role_id": 3, "privilege": "instructor"}}}}"#
        )
        .unwrap();

        let output = run(
            Commands::Impersonate {
                roster: roster.path().to_string_lossy().into_owned(),
                session: session.path().to_string_lossy().into_owned(),
                name: "bob".to_string(),
                switch: false,
                anonymized: false,
            },
            &AuthorityConfig::default(),
        )
        .unwrap();

        assert_eq!(output["session"]["current_user"]["name"], "bob");
        assert_eq!(output["session"]["super_user"]["name"], "alice");
        assert_eq!(output["outcome"]["destination"]["controller"], "student_task");
    }

    #[test]
    fn test_run_impersonate_with_anonymized_flag() {
        let roster = roster_file();
        let session = alice_session("10.0.0.5");

        let output = impersonate(&roster, &session, "Student 2", false, true).unwrap();
        assert_eq!(output["session"]["current_user"]["name"], "bob");

        // real names are not looked up while anonymized
        let err = impersonate(&roster, &session, "bob", false, true).unwrap_err();
        assert!(matches!(err, AuthorityError::UserNotFound { .. }));
    }

    #[test]
    fn test_run_impersonate_from_anonymized_client() {
        let roster = roster_file_with_ips(&["10.0.0.5"]);

        let output =
            impersonate(&roster, &alice_session("10.0.0.5"), "Student 2", false, false).unwrap();
        assert_eq!(output["session"]["current_user"]["name"], "bob");
        assert_eq!(output["session"]["original_user"]["name"], "alice");

        // a different client still types real names
        let err = impersonate(&roster, &alice_session("10.0.0.6"), "Student 2", false, false)
            .unwrap_err();
        assert!(matches!(err, AuthorityError::UserNotFound { .. }));
    }

    #[test]
    fn test_run_impersonate_gate_denial_names_caller() {
        let roster = roster_file();
        let session = session_file(json!({
            "current_user": {"id": 2, "name": "bob", "role_id": 1, "privilege": "student"}
        }));

        let err = impersonate(&roster, &session, "", true, false).unwrap_err();
        assert!(matches!(err, AuthorityError::ImpersonationNotAllowed { .. }));
        assert_eq!(
            err.user_message(),
            "bob is not allowed to impersonate other users."
        );
    }

    #[test]
    fn test_run_select_mentor() {
        let roster = roster_file();
        let output = run(
            Commands::SelectMentor {
                roster: roster.path().to_string_lossy().into_owned(),
                assignment: 5,
            },
            &AuthorityConfig::default(),
        )
        .unwrap();
        assert_eq!(output["name"], "alice");
    }
}
