use review_authority::audit::NullAuditSink;
use review_authority::mentor::{Assignment, Duty, Participant, Team};
use review_authority::roster::Roster;
use review_authority::{
    AuthorityError, Identity, MentorAssignment, MentorBalancer, MentorLoad, MentorStore,
    Privilege,
};

const ASSIGNMENT: u64 = 1;

fn mentor(id: u64, user_id: u64) -> Participant {
    Participant {
        id,
        user_id,
        assignment_id: ASSIGNMENT,
        duty: Some(Duty::Mentor),
    }
}

fn team(id: u64, member_count: usize, mentor_user_id: Option<u64>) -> Team {
    Team {
        id,
        assignment_id: ASSIGNMENT,
        name: format!("team{id}"),
        member_count,
        max_capacity: 4,
        mentor_user_id,
    }
}

/// Mentors A (2 teams), B (0 teams), C (1 team).
fn roster() -> Roster {
    Roster {
        users: vec![
            Identity::new(101, "mentor_a", 2, Privilege::TeachingAssistant),
            Identity::new(102, "mentor_b", 2, Privilege::TeachingAssistant),
            Identity::new(103, "mentor_c", 2, Privilege::TeachingAssistant),
            Identity::new(200, "student", 1, Privilege::Student),
        ],
        participants: vec![
            mentor(1, 101),
            mentor(2, 102),
            mentor(3, 103),
            Participant {
                id: 4,
                user_id: 200,
                assignment_id: ASSIGNMENT,
                duty: Some(Duty::Submitter),
            },
        ],
        teams: vec![
            team(10, 4, Some(101)),
            team(11, 4, Some(101)),
            team(12, 3, Some(103)),
            team(13, 1, None),
        ],
        assignments: vec![Assignment {
            id: ASSIGNMENT,
            name: "OSS project".to_string(),
            auto_assign_mentor: true,
        }],
        ..Default::default()
    }
}

#[test]
fn ranks_by_team_count() {
    let mut roster = roster();
    let balancer = MentorBalancer::new(&mut roster, &NullAuditSink, 50);

    let ranked = balancer.rank_mentors_by_load(ASSIGNMENT).unwrap();
    assert_eq!(
        ranked,
        vec![
            MentorLoad { participant_id: 2, user_id: 102, team_count: 0 },
            MentorLoad { participant_id: 3, user_id: 103, team_count: 1 },
            MentorLoad { participant_id: 1, user_id: 101, team_count: 2 },
        ]
    );
    assert_eq!(balancer.select_mentor(ASSIGNMENT).unwrap().name, "mentor_b");
}

#[test]
fn ties_break_on_participant_id() {
    let mut roster = roster();
    roster.teams.clear();
    let balancer = MentorBalancer::new(&mut roster, &NullAuditSink, 50);

    let ids: Vec<u64> = balancer
        .rank_mentors_by_load(ASSIGNMENT)
        .unwrap()
        .into_iter()
        .map(|load| load.participant_id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn empty_pool_has_no_mentor() {
    let mut roster = roster();
    roster.participants.retain(|p| !p.is_mentor());
    let balancer = MentorBalancer::new(&mut roster, &NullAuditSink, 50);

    assert!(balancer.list_mentors(ASSIGNMENT).unwrap().is_empty());
    let err = balancer.select_mentor(ASSIGNMENT).unwrap_err();
    assert!(matches!(
        err,
        AuthorityError::NoMentorAvailable { assignment_id: ASSIGNMENT }
    ));
}

#[test]
fn identifies_mentors() {
    let mut roster = roster();
    let balancer = MentorBalancer::new(&mut roster, &NullAuditSink, 50);

    let a = Identity::new(101, "mentor_a", 2, Privilege::TeachingAssistant);
    let s = Identity::new(200, "student", 1, Privilege::Student);
    assert!(balancer.is_mentor(&a).unwrap());
    assert!(!balancer.is_mentor(&s).unwrap());
}

#[test]
fn assigns_once_on_crossing_half_capacity() {
    let mut roster = roster();

    // 1 -> 2 of 4 is not past half
    roster.teams[3].member_count = 2;
    {
        let mut balancer = MentorBalancer::new(&mut roster, &NullAuditSink, 50);
        assert_eq!(
            balancer.maybe_assign_mentor(13, 1).unwrap(),
            MentorAssignment::BelowThreshold
        );
    }

    // 2 -> 3 crosses
    roster.teams[3].member_count = 3;
    {
        let mut balancer = MentorBalancer::new(&mut roster, &NullAuditSink, 50);
        match balancer.maybe_assign_mentor(13, 2).unwrap() {
            MentorAssignment::Assigned(identity) => assert_eq!(identity.name, "mentor_b"),
            other => panic!("expected assignment, got {other:?}"),
        }
    }
    assert_eq!(roster.team(13).unwrap().unwrap().mentor_user_id, Some(102));

    // repeated calls keep the mentor
    roster.teams[3].member_count = 4;
    let mut balancer = MentorBalancer::new(&mut roster, &NullAuditSink, 50);
    assert_eq!(
        balancer.maybe_assign_mentor(13, 3).unwrap(),
        MentorAssignment::AlreadyMentored
    );
    assert_eq!(
        balancer.maybe_assign_mentor(13, 2).unwrap(),
        MentorAssignment::AlreadyMentored
    );
}

#[test]
fn no_assignment_when_already_above_threshold() {
    let mut roster = roster();
    roster.teams[3].member_count = 4;
    let mut balancer = MentorBalancer::new(&mut roster, &NullAuditSink, 50);

    assert_eq!(
        balancer.maybe_assign_mentor(13, 3).unwrap(),
        MentorAssignment::NotOnTransition
    );
}

#[test]
fn respects_assignment_opt_out() {
    let mut roster = roster();
    roster.assignments[0].auto_assign_mentor = false;
    roster.teams[3].member_count = 3;
    let mut balancer = MentorBalancer::new(&mut roster, &NullAuditSink, 50);

    assert_eq!(
        balancer.maybe_assign_mentor(13, 2).unwrap(),
        MentorAssignment::AutoAssignDisabled
    );
}

#[test]
fn assigns_on_team_larger_than_any_percentage_product() {
    let mut roster = roster();
    roster.teams[3].member_count = usize::MAX / 10;
    roster.teams[3].max_capacity = usize::MAX / 10;
    let mut balancer = MentorBalancer::new(&mut roster, &NullAuditSink, 50);

    match balancer.maybe_assign_mentor(13, 0).unwrap() {
        MentorAssignment::Assigned(identity) => assert_eq!(identity.name, "mentor_b"),
        other => panic!("expected assignment, got {other:?}"),
    }
}
