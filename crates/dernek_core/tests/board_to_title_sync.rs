use dernek_core::db::open_db_in_memory;
use dernek_core::{
    run_board_to_title_sync, BoardMembership, BoardRepository, BoardRole, BoardTerm,
    BoardToTitleSync, BoardType, Member, MemberId, MemberRepository, MemberType, NewTerm,
    Organization, OrganizationId, OrganizationRepository, RepoError, RepoResult,
    SqliteBoardRepository, SqliteMemberRepository, SqliteOrganizationRepository, SyncOptions,
    Title, TitleChange, TitleConflict,
};
use rusqlite::Connection;
use std::collections::HashSet;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn seed_org(conn: &Connection) -> OrganizationId {
    let org = Organization::new("Uskudar Dernegi");
    SqliteOrganizationRepository::try_new(conn)
        .unwrap()
        .create_organization(&org)
        .unwrap()
}

fn add_member(conn: &Connection, org: OrganizationId, title: Option<Title>) -> MemberId {
    let mut member = Member::new(org, "Ad", "Soyad");
    member.title = title;
    SqliteMemberRepository::try_new(conn)
        .unwrap()
        .create_member(&member)
        .unwrap()
}

fn add_term(
    conn: &Connection,
    org: OrganizationId,
    board_type: BoardType,
    active: bool,
) -> BoardTerm {
    let boards = SqliteBoardRepository::try_new(conn).unwrap();
    let board = match boards.find_board(org, board_type).unwrap() {
        Some(board) => board,
        None => boards.create_board(org, board_type).unwrap(),
    };
    boards
        .create_term(
            board.id,
            &NewTerm {
                is_active: active,
                ..NewTerm::default()
            },
        )
        .unwrap()
}

fn seat(
    conn: &Connection,
    member_id: MemberId,
    term: &BoardTerm,
    role: BoardRole,
    member_type: MemberType,
) {
    let boards = SqliteBoardRepository::try_new(conn).unwrap();
    let order = boards.next_membership_order(term.id).unwrap();
    boards
        .insert_membership(&BoardMembership {
            id: Uuid::new_v4(),
            member_id,
            term_id: term.id,
            role,
            member_type,
            order,
        })
        .unwrap();
}

fn title_of(conn: &Connection, member_id: MemberId) -> Option<Title> {
    SqliteMemberRepository::try_new(conn)
        .unwrap()
        .get_member(member_id)
        .unwrap()
        .unwrap()
        .title
}

/// Member storage that fails reads of one member or refuses every claim.
struct ScriptedMembers<'a> {
    inner: SqliteMemberRepository<'a>,
    unreadable: Option<MemberId>,
    reject_claims: bool,
}

impl<'a> ScriptedMembers<'a> {
    fn new(conn: &'a Connection) -> Self {
        Self {
            inner: SqliteMemberRepository::try_new(conn).unwrap(),
            unreadable: None,
            reject_claims: false,
        }
    }
}

impl MemberRepository for ScriptedMembers<'_> {
    fn create_member(&self, member: &Member) -> RepoResult<MemberId> {
        self.inner.create_member(member)
    }

    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>> {
        if self.unreadable == Some(id) {
            return Err(RepoError::InvalidData(format!("member {id} is unreadable")));
        }
        self.inner.get_member(id)
    }

    fn list_titled_members(&self, organization: Option<OrganizationId>) -> RepoResult<Vec<Member>> {
        self.inner.list_titled_members(organization)
    }

    fn find_title_holders(
        &self,
        organization_id: OrganizationId,
        title: Title,
    ) -> RepoResult<Vec<MemberId>> {
        self.inner.find_title_holders(organization_id, title)
    }

    fn existing_member_ids(
        &self,
        organization_id: OrganizationId,
        ids: &[MemberId],
    ) -> RepoResult<HashSet<MemberId>> {
        self.inner.existing_member_ids(organization_id, ids)
    }

    fn update_member_title(&self, id: MemberId, title: Option<Title>) -> RepoResult<()> {
        self.inner.update_member_title(id, title)
    }

    fn claim_singleton_title(&self, id: MemberId, title: Title) -> RepoResult<bool> {
        if self.reject_claims {
            return Ok(false);
        }
        self.inner.claim_singleton_title(id, title)
    }
}

#[test]
fn seated_president_receives_baskan_title() {
    let conn = setup();
    let org = seed_org(&conn);
    let term = add_term(&conn, org, BoardType::Executive, true);
    let president = add_member(&conn, org, None);
    seat(&conn, president, &term, BoardRole::President, MemberType::Regular);

    let report = run_board_to_title_sync(&conn, &SyncOptions::live()).unwrap();

    assert_eq!(report.updates, 1);
    assert_eq!(report.conflicts, 0);
    assert_eq!(
        report.changes,
        vec![TitleChange {
            member_id: president,
            organization_id: org,
            from: None,
            to: Title::Baskan,
        }]
    );
    assert_eq!(title_of(&conn, president), Some(Title::Baskan));
}

#[test]
fn generic_seats_map_to_board_titles() {
    let conn = setup();
    let org = seed_org(&conn);
    let executive = add_term(&conn, org, BoardType::Executive, true);
    let audit = add_term(&conn, org, BoardType::Audit, true);

    let exec_alternate = add_member(&conn, org, Some(Title::Uye));
    let audit_regular = add_member(&conn, org, None);
    let audit_alternate = add_member(&conn, org, None);
    seat(&conn, exec_alternate, &executive, BoardRole::Member, MemberType::Alternate);
    seat(&conn, audit_regular, &audit, BoardRole::Member, MemberType::Regular);
    seat(&conn, audit_alternate, &audit, BoardRole::Member, MemberType::Alternate);

    let report = run_board_to_title_sync(&conn, &SyncOptions::live()).unwrap();

    assert_eq!(report.updates, 3);
    assert_eq!(title_of(&conn, exec_alternate), Some(Title::YonetimKuruluYedek));
    assert_eq!(title_of(&conn, audit_regular), Some(Title::DenetimKuruluAsil));
    assert_eq!(title_of(&conn, audit_alternate), Some(Title::DenetimKuruluYedek));
}

#[test]
fn occupied_singleton_title_is_reported_as_conflict() {
    let conn = setup();
    let org = seed_org(&conn);
    let term = add_term(&conn, org, BoardType::Executive, true);
    let holder = add_member(&conn, org, Some(Title::Sayman));
    let seated = add_member(&conn, org, Some(Title::YonetimKuruluAsil));
    seat(&conn, seated, &term, BoardRole::Treasurer, MemberType::Regular);

    let report = run_board_to_title_sync(&conn, &SyncOptions::live()).unwrap();

    assert_eq!(report.updates, 0);
    assert_eq!(report.conflicts, 1);
    assert_eq!(
        report.conflict_list,
        vec![TitleConflict {
            member_id: seated,
            organization_id: org,
            current_title: Some(Title::YonetimKuruluAsil),
            desired_title: Title::Sayman,
            holder_id: holder,
        }]
    );
    assert_eq!(title_of(&conn, holder), Some(Title::Sayman));
    assert_eq!(title_of(&conn, seated), Some(Title::YonetimKuruluAsil));
}

#[test]
fn holder_vacating_title_in_same_pass_unblocks_new_holder() {
    let conn = setup();
    let org = seed_org(&conn);
    let term = add_term(&conn, org, BoardType::Executive, true);

    // Former president now sits as secretary; the new president is seated.
    let former = add_member(&conn, org, Some(Title::Baskan));
    let incoming = add_member(&conn, org, Some(Title::Uye));
    seat(&conn, former, &term, BoardRole::Secretary, MemberType::Regular);
    seat(&conn, incoming, &term, BoardRole::President, MemberType::Regular);

    let report = run_board_to_title_sync(&conn, &SyncOptions::live()).unwrap();

    assert_eq!(report.conflicts, 0);
    assert_eq!(report.updates, 2);
    assert_eq!(title_of(&conn, former), Some(Title::Sekreter));
    assert_eq!(title_of(&conn, incoming), Some(Title::Baskan));
}

#[test]
fn swapped_singleton_titles_are_left_for_manual_resolution() {
    let conn = setup();
    let org = seed_org(&conn);
    let term = add_term(&conn, org, BoardType::Executive, true);
    let a = add_member(&conn, org, Some(Title::Baskan));
    let b = add_member(&conn, org, Some(Title::Sekreter));
    seat(&conn, a, &term, BoardRole::Secretary, MemberType::Regular);
    seat(&conn, b, &term, BoardRole::President, MemberType::Regular);

    let report = run_board_to_title_sync(&conn, &SyncOptions::live()).unwrap();

    assert_eq!(report.updates, 0);
    assert_eq!(report.conflicts, 2);
    assert_eq!(title_of(&conn, a), Some(Title::Baskan));
    assert_eq!(title_of(&conn, b), Some(Title::Sekreter));
}

#[test]
fn second_pass_is_a_no_op() {
    let conn = setup();
    let org = seed_org(&conn);
    let term = add_term(&conn, org, BoardType::Executive, true);
    add_member(&conn, org, Some(Title::Sayman));
    for role in [BoardRole::President, BoardRole::Treasurer, BoardRole::Member] {
        let member = add_member(&conn, org, None);
        seat(&conn, member, &term, role, MemberType::Regular);
    }

    let first = run_board_to_title_sync(&conn, &SyncOptions::live()).unwrap();
    assert_eq!(first.updates, 2);
    assert_eq!(first.conflicts, 1);

    let second = run_board_to_title_sync(&conn, &SyncOptions::live()).unwrap();
    assert_eq!(second.updates, 0);
    assert_eq!(second.already_synced, 2);
    assert_eq!(second.conflicts, 1);
}

#[test]
fn dry_run_reports_live_outcome_without_writing() {
    let conn = setup();
    let org = seed_org(&conn);
    let term = add_term(&conn, org, BoardType::Executive, true);
    let former = add_member(&conn, org, Some(Title::Baskan));
    let incoming = add_member(&conn, org, None);
    let blocked = add_member(&conn, org, None);
    add_member(&conn, org, Some(Title::Sekreter));
    seat(&conn, former, &term, BoardRole::Member, MemberType::Regular);
    seat(&conn, incoming, &term, BoardRole::President, MemberType::Regular);
    seat(&conn, blocked, &term, BoardRole::Secretary, MemberType::Regular);

    let planned = run_board_to_title_sync(&conn, &SyncOptions::dry_run()).unwrap();
    assert!(planned.dry_run);
    assert_eq!(title_of(&conn, former), Some(Title::Baskan));
    assert_eq!(title_of(&conn, incoming), None);

    let applied = run_board_to_title_sync(&conn, &SyncOptions::live()).unwrap();
    assert!(!applied.dry_run);
    assert_eq!(planned.updates, applied.updates);
    assert_eq!(planned.changes, applied.changes);
    assert_eq!(planned.conflict_list, applied.conflict_list);
    assert_eq!(applied.updates, 2);
    assert_eq!(applied.conflicts, 1);
    assert_eq!(title_of(&conn, incoming), Some(Title::Baskan));
}

#[test]
fn inactive_term_memberships_are_skipped() {
    let conn = setup();
    let org = seed_org(&conn);
    let past = add_term(&conn, org, BoardType::Executive, false);
    let member = add_member(&conn, org, None);
    seat(&conn, member, &past, BoardRole::President, MemberType::Regular);

    let report = run_board_to_title_sync(&conn, &SyncOptions::live()).unwrap();

    assert_eq!(report.skipped_inactive_term, 1);
    assert_eq!(report.updates, 0);
    assert_eq!(title_of(&conn, member), None);
}

#[test]
fn member_on_two_boards_gets_one_title() {
    let conn = setup();
    let org = seed_org(&conn);
    let executive = add_term(&conn, org, BoardType::Executive, true);
    let audit = add_term(&conn, org, BoardType::Audit, true);
    let member = add_member(&conn, org, None);
    seat(&conn, member, &executive, BoardRole::Member, MemberType::Regular);
    seat(&conn, member, &audit, BoardRole::Supervisor, MemberType::Regular);

    let first = run_board_to_title_sync(&conn, &SyncOptions::live()).unwrap();
    assert_eq!(first.updates, 1);
    assert_eq!(first.shadowed, 1);
    assert_eq!(title_of(&conn, member), Some(Title::DenetimKuruluBaskani));

    let second = run_board_to_title_sync(&conn, &SyncOptions::live()).unwrap();
    assert_eq!(second.updates, 0);
    assert_eq!(second.already_synced, 1);
}

#[test]
fn singleton_titles_stay_unique_within_organization() {
    let conn = setup();
    let org = seed_org(&conn);
    let executive = add_term(&conn, org, BoardType::Executive, true);
    add_member(&conn, org, Some(Title::BaskanYardimcisi));
    let roles = [
        BoardRole::President,
        BoardRole::VicePresident,
        BoardRole::Secretary,
        BoardRole::Treasurer,
    ];
    for role in roles {
        let member = add_member(&conn, org, Some(Title::Uye));
        seat(&conn, member, &executive, role, MemberType::Regular);
    }

    run_board_to_title_sync(&conn, &SyncOptions::live()).unwrap();

    let members = SqliteMemberRepository::try_new(&conn).unwrap();
    for title in [
        Title::Baskan,
        Title::BaskanYardimcisi,
        Title::Sekreter,
        Title::Sayman,
    ] {
        assert_eq!(members.find_title_holders(org, title).unwrap().len(), 1);
    }
}

#[test]
fn organization_scope_limits_the_pass() {
    let conn = setup();
    let org_a = seed_org(&conn);
    let org_b = seed_org(&conn);
    let term_a = add_term(&conn, org_a, BoardType::Executive, true);
    let term_b = add_term(&conn, org_b, BoardType::Executive, true);
    let a = add_member(&conn, org_a, None);
    let b = add_member(&conn, org_b, None);
    seat(&conn, a, &term_a, BoardRole::President, MemberType::Regular);
    seat(&conn, b, &term_b, BoardRole::President, MemberType::Regular);

    let report =
        run_board_to_title_sync(&conn, &SyncOptions::live().for_organization(org_a)).unwrap();

    assert_eq!(report.updates, 1);
    assert_eq!(title_of(&conn, a), Some(Title::Baskan));
    assert_eq!(title_of(&conn, b), None);
}

#[test]
fn report_serializes_with_camel_case_keys() {
    let conn = setup();
    let report = run_board_to_title_sync(&conn, &SyncOptions::dry_run()).unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["dryRun"], serde_json::json!(true));
    assert_eq!(value["alreadySynced"], serde_json::json!(0));
    assert!(value["conflictList"].as_array().unwrap().is_empty());
}

#[test]
fn member_read_failure_is_reported_and_pass_continues() {
    let conn = setup();
    let org = seed_org(&conn);
    let term = add_term(&conn, org, BoardType::Executive, true);
    let broken = add_member(&conn, org, None);
    let healthy = add_member(&conn, org, None);
    seat(&conn, broken, &term, BoardRole::President, MemberType::Regular);
    seat(&conn, healthy, &term, BoardRole::Member, MemberType::Regular);

    let members = ScriptedMembers {
        unreadable: Some(broken),
        ..ScriptedMembers::new(&conn)
    };
    let sync = BoardToTitleSync::new(members, SqliteBoardRepository::try_new(&conn).unwrap());
    let report = sync.run(&SyncOptions::live()).unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].member_id, broken);
    assert!(report.errors[0].message.contains(&broken.to_string()));
    assert_eq!(report.updates, 1);
    assert_eq!(title_of(&conn, healthy), Some(Title::YonetimKuruluAsil));
    assert_eq!(title_of(&conn, broken), None);
}

#[test]
fn refused_claim_without_other_holder_is_an_item_failure() {
    let conn = setup();
    let org = seed_org(&conn);
    let term = add_term(&conn, org, BoardType::Executive, true);
    let president = add_member(&conn, org, None);
    seat(&conn, president, &term, BoardRole::President, MemberType::Regular);

    let members = ScriptedMembers {
        reject_claims: true,
        ..ScriptedMembers::new(&conn)
    };
    let sync = BoardToTitleSync::new(members, SqliteBoardRepository::try_new(&conn).unwrap());
    let report = sync.run(&SyncOptions::live()).unwrap();

    assert_eq!(report.conflicts, 0);
    assert!(report.conflict_list.is_empty());
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors[0].member_id, president);
    assert!(report.errors[0].message.contains("no other holder"));
    assert_eq!(title_of(&conn, president), None);
}
