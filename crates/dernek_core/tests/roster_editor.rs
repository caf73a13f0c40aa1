use dernek_core::db::open_db_in_memory;
use dernek_core::{
    BoardRepository, BoardRole, BoardTerm, BoardType, Member, MemberId, MemberRepository,
    MemberType, NewTerm, Organization, OrganizationRepository, RosterEntry, RosterService,
    RosterServiceError, SqliteBoardRepository, SqliteMemberRepository,
    SqliteOrganizationRepository, ValidationErrors, ViolationCode,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Fixture {
    conn: Connection,
    org: Organization,
}

impl Fixture {
    fn new() -> Self {
        let conn = open_db_in_memory().unwrap();
        let org = Organization::new("Besiktas Dernegi");
        SqliteOrganizationRepository::try_new(&conn)
            .unwrap()
            .create_organization(&org)
            .unwrap();
        Self { conn, org }
    }

    fn members(&self, count: usize) -> Vec<MemberId> {
        let repo = SqliteMemberRepository::try_new(&self.conn).unwrap();
        (0..count)
            .map(|index| {
                let member = Member::new(self.org.id, format!("Uye{index}"), "Test");
                repo.create_member(&member).unwrap()
            })
            .collect()
    }

    fn term(&self, board_type: BoardType) -> BoardTerm {
        let boards = SqliteBoardRepository::try_new(&self.conn).unwrap();
        let board = boards.create_board(self.org.id, board_type).unwrap();
        boards
            .create_term(
                board.id,
                &NewTerm {
                    is_active: true,
                    ..NewTerm::default()
                },
            )
            .unwrap()
    }

    fn service(&self) -> RosterService<SqliteMemberRepository<'_>, SqliteBoardRepository<'_>> {
        RosterService::new(
            SqliteMemberRepository::try_new(&self.conn).unwrap(),
            SqliteBoardRepository::try_new(&self.conn).unwrap(),
        )
    }
}

fn validation_errors(err: RosterServiceError) -> ValidationErrors {
    match err {
        RosterServiceError::Validation(errors) => errors,
        other => panic!("expected validation error, got {other:?}"),
    }
}

/// Officers first, then plain regular members, then alternates.
fn executive_roster(ids: &[MemberId], regular: usize, alternate: usize) -> Vec<RosterEntry> {
    let officers = [
        BoardRole::President,
        BoardRole::VicePresident,
        BoardRole::Secretary,
        BoardRole::Treasurer,
    ];
    let mut entries = Vec::new();
    for (index, id) in ids.iter().take(regular).enumerate() {
        let role = officers.get(index).copied().unwrap_or(BoardRole::Member);
        entries.push(RosterEntry::new(*id, role, MemberType::Regular));
    }
    for id in ids.iter().skip(regular).take(alternate) {
        entries.push(RosterEntry::new(*id, BoardRole::Member, MemberType::Alternate));
    }
    entries
}

#[test]
fn valid_roster_replaces_previous_one() {
    let fx = Fixture::new();
    let term = fx.term(BoardType::Executive);
    let ids = fx.members(12);
    let service = fx.service();

    let first = executive_roster(&ids[..10], 5, 5);
    service.replace_roster(term.id, &first).unwrap();

    let mut second = executive_roster(&ids[2..12], 5, 5);
    second[0].order = Some(42);
    let stored = service.replace_roster(term.id, &second).unwrap();

    assert_eq!(stored.len(), 10);
    assert!(stored.iter().all(|m| m.term_id == term.id));
    assert!(!stored.iter().any(|m| m.member_id == ids[0] || m.member_id == ids[1]));

    let president = stored
        .iter()
        .find(|m| m.role == BoardRole::President)
        .unwrap();
    assert_eq!(president.member_id, ids[2]);
    assert_eq!(president.order, 42);
    // Order falls back to the entry position.
    assert_eq!(stored[0].member_id, ids[3]);
    assert_eq!(stored[0].order, 1);
    assert_eq!(service.roster(term.id).unwrap(), stored);
}

#[test]
fn short_regular_roster_is_rejected_and_prior_roster_kept() {
    let fx = Fixture::new();
    let term = fx.term(BoardType::Executive);
    let ids = fx.members(10);
    let service = fx.service();

    let valid = executive_roster(&ids, 5, 5);
    let before = service.replace_roster(term.id, &valid).unwrap();

    let mut short = executive_roster(&ids, 5, 5);
    short.remove(4);
    let err = service.replace_roster(term.id, &short).unwrap_err();
    let errors = validation_errors(err);
    assert_eq!(errors.codes(), vec![ViolationCode::MinRegularSeats]);
    assert_eq!(service.roster(term.id).unwrap(), before);
}

#[test]
fn duplicate_singleton_role_is_rejected() {
    let fx = Fixture::new();
    let term = fx.term(BoardType::Executive);
    let ids = fx.members(10);
    let service = fx.service();

    let mut roster = executive_roster(&ids, 5, 5);
    roster[4].role = BoardRole::President;

    let err = service.replace_roster(term.id, &roster).unwrap_err();
    let errors = validation_errors(err);
    assert!(errors.has_code(ViolationCode::DuplicateSingletonRole));
    assert!(service.roster(term.id).unwrap().is_empty());
}

#[test]
fn audit_roster_rejects_executive_roles_and_alternate_supervisor() {
    let fx = Fixture::new();
    let term = fx.term(BoardType::Audit);
    let ids = fx.members(6);
    let service = fx.service();

    let mut roster = vec![
        RosterEntry::new(ids[0], BoardRole::Treasurer, MemberType::Regular),
        RosterEntry::new(ids[1], BoardRole::Member, MemberType::Regular),
        RosterEntry::new(ids[2], BoardRole::Member, MemberType::Regular),
    ];
    roster.extend(
        ids[3..]
            .iter()
            .map(|id| RosterEntry::new(*id, BoardRole::Member, MemberType::Alternate)),
    );
    roster[3].role = BoardRole::Supervisor;

    let errors = service.validate_roster(term.id, &roster).unwrap();
    let codes = errors.iter().map(|e| e.code).collect::<Vec<_>>();
    assert_eq!(
        codes,
        vec![
            ViolationCode::RoleNotAllowed,
            ViolationCode::SingletonRoleNotRegular,
        ]
    );
}

#[test]
fn valid_audit_roster_is_accepted() {
    let fx = Fixture::new();
    let term = fx.term(BoardType::Audit);
    let ids = fx.members(6);
    let service = fx.service();

    let roster = vec![
        RosterEntry::new(ids[0], BoardRole::Supervisor, MemberType::Regular),
        RosterEntry::new(ids[1], BoardRole::Member, MemberType::Regular),
        RosterEntry::new(ids[2], BoardRole::Member, MemberType::Regular),
        RosterEntry::new(ids[3], BoardRole::Member, MemberType::Alternate),
        RosterEntry::new(ids[4], BoardRole::Member, MemberType::Alternate),
        RosterEntry::new(ids[5], BoardRole::Member, MemberType::Alternate),
    ];
    assert!(service.validate_roster(term.id, &roster).unwrap().is_empty());
    assert_eq!(service.replace_roster(term.id, &roster).unwrap().len(), 6);
}

#[test]
fn unknown_and_foreign_members_are_reported() {
    let fx = Fixture::new();
    let term = fx.term(BoardType::Executive);
    let ids = fx.members(9);
    let service = fx.service();

    let other_org = Organization::new("Baska Dernek");
    SqliteOrganizationRepository::try_new(&fx.conn)
        .unwrap()
        .create_organization(&other_org)
        .unwrap();
    let foreign = Member::new(other_org.id, "Yabanci", "Uye");
    SqliteMemberRepository::try_new(&fx.conn)
        .unwrap()
        .create_member(&foreign)
        .unwrap();

    let mut all = ids.clone();
    all.push(foreign.id);
    let mut roster = executive_roster(&all, 5, 5);
    roster[1].member_id = Uuid::new_v4();

    let errors = service.validate_roster(term.id, &roster).unwrap();
    let unknown = errors
        .iter()
        .filter(|e| e.code == ViolationCode::UnknownMember)
        .count();
    assert_eq!(unknown, 2);
}

#[test]
fn rejected_roster_serializes_as_validation_payload() {
    let fx = Fixture::new();
    let term = fx.term(BoardType::Executive);
    let ids = fx.members(9);
    let service = fx.service();

    let roster = executive_roster(&ids, 4, 5);
    let err = service.replace_roster(term.id, &roster).unwrap_err();
    let errors = validation_errors(err);

    let payload = serde_json::to_value(&errors).unwrap();
    assert_eq!(
        payload["validationErrors"][0]["code"],
        serde_json::json!("MIN_REGULAR_SEATS")
    );
    assert!(payload["validationErrors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("at least 5"));
}

#[test]
fn roster_of_missing_term_is_not_found() {
    let fx = Fixture::new();
    let service = fx.service();
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.replace_roster(missing, &[]),
        Err(RosterServiceError::TermNotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.roster(missing),
        Err(RosterServiceError::TermNotFound(_))
    ));
}
