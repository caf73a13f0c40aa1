//! Office vocabulary: board types, roles, seat kinds and member titles.
//!
//! # Invariants
//! - Persisted string values are stable; they are part of the SQLite schema
//!   CHECK constraints and must not be renamed.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Governance body kind. One board of each kind per organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardType {
    /// Executive board ("yönetim kurulu").
    Executive,
    /// Audit board ("denetim kurulu").
    Audit,
}

impl BoardType {
    pub const ALL: [BoardType; 2] = [BoardType::Executive, BoardType::Audit];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Executive => "EXECUTIVE",
            Self::Audit => "AUDIT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "EXECUTIVE" => Some(Self::Executive),
            "AUDIT" => Some(Self::Audit),
            _ => None,
        }
    }
}

impl Display for BoardType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role held by one membership row on a board term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardRole {
    President,
    VicePresident,
    Secretary,
    Treasurer,
    Supervisor,
    Member,
}

impl BoardRole {
    pub const ALL: [BoardRole; 6] = [
        BoardRole::President,
        BoardRole::VicePresident,
        BoardRole::Secretary,
        BoardRole::Treasurer,
        BoardRole::Supervisor,
        BoardRole::Member,
    ];

    /// Singleton roles may be held by at most one entry per term.
    pub fn is_singleton(self) -> bool {
        !matches!(self, Self::Member)
    }

    /// Returns whether this role exists on the given board type.
    pub fn is_allowed_for(self, board_type: BoardType) -> bool {
        match board_type {
            BoardType::Executive => matches!(
                self,
                Self::President
                    | Self::VicePresident
                    | Self::Secretary
                    | Self::Treasurer
                    | Self::Member
            ),
            BoardType::Audit => matches!(self, Self::Supervisor | Self::Member),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::President => "PRESIDENT",
            Self::VicePresident => "VICE_PRESIDENT",
            Self::Secretary => "SECRETARY",
            Self::Treasurer => "TREASURER",
            Self::Supervisor => "SUPERVISOR",
            Self::Member => "MEMBER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == value)
    }
}

impl Display for BoardRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seat kind on a board term: primary ("asil") or substitute ("yedek").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberType {
    Regular,
    Alternate,
}

impl MemberType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "REGULAR",
            Self::Alternate => "ALTERNATE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "REGULAR" => Some(Self::Regular),
            "ALTERNATE" => Some(Self::Alternate),
            _ => None,
        }
    }
}

impl Display for MemberType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Denormalized office title stored on `Member.title`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Title {
    /// President.
    Baskan,
    /// Vice president.
    BaskanYardimcisi,
    /// Secretary.
    Sekreter,
    /// Treasurer.
    Sayman,
    /// Executive board regular member.
    YonetimKuruluAsil,
    /// Executive board alternate member.
    YonetimKuruluYedek,
    /// Audit board supervisor.
    DenetimKuruluBaskani,
    /// Audit board regular member.
    DenetimKuruluAsil,
    /// Audit board alternate member.
    DenetimKuruluYedek,
    /// Plain association member, no board seat.
    Uye,
}

impl Title {
    pub const ALL: [Title; 10] = [
        Title::Baskan,
        Title::BaskanYardimcisi,
        Title::Sekreter,
        Title::Sayman,
        Title::YonetimKuruluAsil,
        Title::YonetimKuruluYedek,
        Title::DenetimKuruluBaskani,
        Title::DenetimKuruluAsil,
        Title::DenetimKuruluYedek,
        Title::Uye,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Baskan => "BASKAN",
            Self::BaskanYardimcisi => "BASKAN_YARDIMCISI",
            Self::Sekreter => "SEKRETER",
            Self::Sayman => "SAYMAN",
            Self::YonetimKuruluAsil => "YONETIM_KURULU_ASIL",
            Self::YonetimKuruluYedek => "YONETIM_KURULU_YEDEK",
            Self::DenetimKuruluBaskani => "DENETIM_KURULU_BASKANI",
            Self::DenetimKuruluAsil => "DENETIM_KURULU_ASIL",
            Self::DenetimKuruluYedek => "DENETIM_KURULU_YEDEK",
            Self::Uye => "UYE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|title| title.as_str() == value)
    }
}

impl Display for Title {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
