//! Title ↔ office mapping tables.
//!
//! # Responsibility
//! - Define the bijection between `Title` values and
//!   (board type, role, member type) seats.
//! - Stay pure and total so sync passes can call it unconditionally.
//!
//! # Invariants
//! - Every singleton title appears exactly once in `OFFICE_TITLES`.
//! - Each (board type, member type) pair has exactly one generic title.
//! - `title_for(board_type_of(t), office_role(t).role, member_type_of(t)) == t`
//!   for every singleton title `t`.

use crate::model::title::{BoardRole, BoardType, MemberType, Title};

/// Singleton offices: title -> (board type, role).
const OFFICE_TITLES: &[(Title, BoardType, BoardRole)] = &[
    (Title::Baskan, BoardType::Executive, BoardRole::President),
    (
        Title::BaskanYardimcisi,
        BoardType::Executive,
        BoardRole::VicePresident,
    ),
    (Title::Sekreter, BoardType::Executive, BoardRole::Secretary),
    (Title::Sayman, BoardType::Executive, BoardRole::Treasurer),
    (
        Title::DenetimKuruluBaskani,
        BoardType::Audit,
        BoardRole::Supervisor,
    ),
];

/// Generic seats: title -> (board type, member type), role is always `Member`.
const GENERIC_TITLES: &[(Title, BoardType, MemberType)] = &[
    (
        Title::YonetimKuruluAsil,
        BoardType::Executive,
        MemberType::Regular,
    ),
    (
        Title::YonetimKuruluYedek,
        BoardType::Executive,
        MemberType::Alternate,
    ),
    (Title::DenetimKuruluAsil, BoardType::Audit, MemberType::Regular),
    (
        Title::DenetimKuruluYedek,
        BoardType::Audit,
        MemberType::Alternate,
    ),
];

/// Board office held by a singleton title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Office {
    pub board_type: BoardType,
    pub role: BoardRole,
}

/// Returns the singleton office for `title`, or `None` for generic/plain titles.
pub fn office_role(title: Title) -> Option<Office> {
    OFFICE_TITLES
        .iter()
        .find(|(candidate, _, _)| *candidate == title)
        .map(|&(_, board_type, role)| Office { board_type, role })
}

/// Returns whether `title` names a singleton office.
pub fn is_singleton_title(title: Title) -> bool {
    office_role(title).is_some()
}

/// Only the two generic alternate titles map to `Alternate`.
pub fn member_type_of(title: Title) -> MemberType {
    GENERIC_TITLES
        .iter()
        .find(|(candidate, _, _)| *candidate == title)
        .map_or(MemberType::Regular, |&(_, _, member_type)| member_type)
}

/// Returns the board a title belongs to, or `None` for non-board titles.
pub fn board_type_of(title: Title) -> Option<BoardType> {
    if let Some(office) = office_role(title) {
        return Some(office.board_type);
    }
    GENERIC_TITLES
        .iter()
        .find(|(candidate, _, _)| *candidate == title)
        .map(|&(_, board_type, _)| board_type)
}

/// Derives the denormalized title for one seat.
///
/// - `Alternate` always yields the board's generic alternate title.
/// - `Regular` + `Member` yields the board's generic regular title.
/// - `Regular` + singleton role yields that office's title.
/// - A role that does not exist on `board_type` falls back to the generic
///   title, so the function never fails.
pub fn title_for(board_type: BoardType, role: BoardRole, member_type: MemberType) -> Title {
    if member_type == MemberType::Regular && role.is_singleton() {
        if let Some(&(title, _, _)) = OFFICE_TITLES
            .iter()
            .find(|(_, candidate_board, candidate_role)| {
                *candidate_board == board_type && *candidate_role == role
            })
        {
            return title;
        }
    }
    generic_title(board_type, member_type)
}

fn generic_title(board_type: BoardType, member_type: MemberType) -> Title {
    match (board_type, member_type) {
        (BoardType::Executive, MemberType::Regular) => Title::YonetimKuruluAsil,
        (BoardType::Executive, MemberType::Alternate) => Title::YonetimKuruluYedek,
        (BoardType::Audit, MemberType::Regular) => Title::DenetimKuruluAsil,
        (BoardType::Audit, MemberType::Alternate) => Title::DenetimKuruluYedek,
    }
}
