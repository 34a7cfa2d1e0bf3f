//! Mentor selection for team-based assignments.
//!
//! Mentors are participants of an assignment with the mentor duty. When a
//! team grows past the occupancy threshold it gets the mentor currently
//! supervising the fewest teams of that assignment.

use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::errors::{AuthorityError, AuthorityResult, StoreResult};
use crate::identity::{Identity, UserId};
use serde::{Deserialize, Serialize};

pub type AssignmentId = u64;
pub type ParticipantId = u64;
pub type TeamId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Duty {
    Mentor,
    Reader,
    Reviewer,
    Submitter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub user_id: UserId,
    pub assignment_id: AssignmentId,
    #[serde(default)]
    pub duty: Option<Duty>,
}

impl Participant {
    pub fn is_mentor(&self) -> bool {
        self.duty == Some(Duty::Mentor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub assignment_id: AssignmentId,
    #[serde(default)]
    pub name: String,
    pub member_count: usize,
    pub max_capacity: usize,
    #[serde(default)]
    pub mentor_user_id: Option<UserId>,
}

impl Team {
    /// Whether `member_count` is past `percent` of capacity.
    pub fn above_threshold(member_count: usize, max_capacity: usize, percent: u8) -> bool {
        // u128 keeps roster-supplied counts from overflowing
        member_count as u128 * 100 > max_capacity as u128 * u128::from(percent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub auto_assign_mentor: bool,
}

/// Persistence for participants, teams and assignments, owned by the host.
pub trait MentorStore {
    /// Participants of an assignment, in table order.
    fn participants(&self, assignment_id: AssignmentId) -> StoreResult<Vec<Participant>>;

    fn participants_for_user(&self, user_id: UserId) -> StoreResult<Vec<Participant>>;

    fn teams(&self, assignment_id: AssignmentId) -> StoreResult<Vec<Team>>;

    fn team(&self, team_id: TeamId) -> StoreResult<Option<Team>>;

    fn user(&self, user_id: UserId) -> StoreResult<Option<Identity>>;

    fn assignment(&self, assignment_id: AssignmentId) -> StoreResult<Option<Assignment>>;

    fn attach_mentor(&mut self, team_id: TeamId, mentor_user_id: UserId) -> StoreResult<()>;
}

/// A mentor paired with the number of teams they supervise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentorLoad {
    pub participant_id: ParticipantId,
    pub user_id: UserId,
    pub team_count: usize,
}

/// Result of [`MentorBalancer::maybe_assign_mentor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentorAssignment {
    Assigned(Identity),
    AlreadyMentored,
    BelowThreshold,
    /// Already above the threshold before this change.
    NotOnTransition,
    AutoAssignDisabled,
}

pub struct MentorBalancer<'a, S: MentorStore + ?Sized> {
    store: &'a mut S,
    audit: &'a dyn AuditSink,
    threshold_percent: u8,
}

impl<'a, S: MentorStore + ?Sized> MentorBalancer<'a, S> {
    pub fn new(store: &'a mut S, audit: &'a dyn AuditSink, threshold_percent: u8) -> Self {
        Self {
            store,
            audit,
            threshold_percent,
        }
    }

    pub fn list_mentors(&self, assignment_id: AssignmentId) -> AuthorityResult<Vec<Participant>> {
        Ok(self
            .store
            .participants(assignment_id)?
            .into_iter()
            .filter(Participant::is_mentor)
            .collect())
    }

    /// Mentors sorted by how many of the assignment's teams they supervise,
    /// fewest first, ties by participant id.
    pub fn rank_mentors_by_load(
        &self,
        assignment_id: AssignmentId,
    ) -> AuthorityResult<Vec<MentorLoad>> {
        let mentors = self.list_mentors(assignment_id)?;
        if mentors.is_empty() {
            return Ok(Vec::new());
        }

        let teams = self.store.teams(assignment_id)?;
        let mut loads: Vec<MentorLoad> = mentors
            .iter()
            .map(|mentor| MentorLoad {
                participant_id: mentor.id,
                user_id: mentor.user_id,
                team_count: teams
                    .iter()
                    .filter(|team| team.mentor_user_id == Some(mentor.user_id))
                    .count(),
            })
            .collect();
        loads.sort_by_key(|load| (load.team_count, load.participant_id));
        Ok(loads)
    }

    pub fn select_mentor(&self, assignment_id: AssignmentId) -> AuthorityResult<Identity> {
        let least_loaded = self
            .rank_mentors_by_load(assignment_id)?
            .into_iter()
            .next()
            .ok_or_else(|| AuthorityError::no_mentor(assignment_id))?;

        self.store
            .user(least_loaded.user_id)?
            .ok_or_else(|| AuthorityError::user_not_found(least_loaded.user_id.to_string()))
    }

    pub fn is_mentor(&self, identity: &Identity) -> AuthorityResult<bool> {
        Ok(self
            .store
            .participants_for_user(identity.id)?
            .iter()
            .any(Participant::is_mentor))
    }

    /// Attach a mentor if this membership change pushed the team over the
    /// threshold. Safe to call after every change.
    pub fn maybe_assign_mentor(
        &mut self,
        team_id: TeamId,
        previous_member_count: usize,
    ) -> AuthorityResult<MentorAssignment> {
        let team = self
            .store
            .team(team_id)?
            .ok_or_else(|| AuthorityError::operation_failed(format!("team {team_id} not found")))?;

        let auto_assign = self
            .store
            .assignment(team.assignment_id)?
            .is_some_and(|assignment| assignment.auto_assign_mentor);
        if !auto_assign {
            return Ok(MentorAssignment::AutoAssignDisabled);
        }
        if team.mentor_user_id.is_some() {
            return Ok(MentorAssignment::AlreadyMentored);
        }
        if !Team::above_threshold(team.member_count, team.max_capacity, self.threshold_percent) {
            return Ok(MentorAssignment::BelowThreshold);
        }
        if Team::above_threshold(previous_member_count, team.max_capacity, self.threshold_percent)
        {
            return Ok(MentorAssignment::NotOnTransition);
        }

        let mentor = self.select_mentor(team.assignment_id)?;
        self.store.attach_mentor(team.id, mentor.id)?;

        tracing::info!(
            team_id = team.id,
            assignment_id = team.assignment_id,
            mentor = %mentor.name,
            "mentor assigned"
        );
        self.audit.record(
            AuditEvent::new(&mentor.name, AuditAction::MentorAssigned)
                .with_target(&team.name)
                .with_context(format!(
                    "{}/{} members",
                    team.member_count, team.max_capacity
                )),
        );

        Ok(MentorAssignment::Assigned(mentor))
    }
}
