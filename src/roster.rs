use crate::errors::{AuthorityError, AuthorityResult, StoreError, StoreResult};
use crate::identity::{Identity, IdentityDirectory, UserId};
use crate::mentor::{Assignment, AssignmentId, MentorStore, Participant, Team, TeamId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// In-memory user, participant and team records, loadable from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub users: Vec<Identity>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    /// Client addresses that switched on anonymized view.
    #[serde(default)]
    pub anonymized_view_ips: Vec<String>,
}

impl Roster {
    pub fn from_file<P: AsRef<Path>>(path: P) -> AuthorityResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AuthorityError::io(format!("reading {}", path.display()), e))?;
        serde_json::from_str(&content)
            .map_err(|e| AuthorityError::serialization(format!("parsing {}", path.display()), e))
    }
}

impl IdentityDirectory for Roster {
    fn find_by_name(&self, name: &str) -> StoreResult<Option<Identity>> {
        Ok(self.users.iter().find(|u| u.name == name).cloned())
    }

    fn find_by_id(&self, id: UserId) -> StoreResult<Option<Identity>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    fn find_by_name_prefix(&self, prefix: &str) -> StoreResult<Vec<Identity>> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.name.starts_with(prefix))
            .cloned()
            .collect())
    }
}

impl MentorStore for Roster {
    fn participants(&self, assignment_id: AssignmentId) -> StoreResult<Vec<Participant>> {
        Ok(self
            .participants
            .iter()
            .filter(|p| p.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    fn participants_for_user(&self, user_id: UserId) -> StoreResult<Vec<Participant>> {
        Ok(self
            .participants
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    fn teams(&self, assignment_id: AssignmentId) -> StoreResult<Vec<Team>> {
        Ok(self
            .teams
            .iter()
            .filter(|t| t.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    fn team(&self, team_id: TeamId) -> StoreResult<Option<Team>> {
        Ok(self.teams.iter().find(|t| t.id == team_id).cloned())
    }

    fn user(&self, user_id: UserId) -> StoreResult<Option<Identity>> {
        self.find_by_id(user_id)
    }

    fn assignment(&self, assignment_id: AssignmentId) -> StoreResult<Option<Assignment>> {
        Ok(self
            .assignments
            .iter()
            .find(|a| a.id == assignment_id)
            .cloned())
    }

    fn attach_mentor(&mut self, team_id: TeamId, mentor_user_id: UserId) -> StoreResult<()> {
        let team = self
            .teams
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or_else(|| StoreError::new("attach_mentor", format!("no team {team_id}")))?;
        team.mentor_user_id = Some(mentor_user_id);
        Ok(())
    }
}
