use sea_orm::entity::prelude::*;
use serde::{Serialize, Deserialize};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
    #[sea_orm(string_value = "national_admin")]
    NationalAdmin,
    #[sea_orm(string_value = "zone_admin")]
    ZoneAdmin,
    #[sea_orm(string_value = "referee")]
    Referee,
}

impl UserType {
    pub fn label(&self) -> &'static str {
        match self {
            UserType::SuperAdmin => "Super Admin",
            UserType::NationalAdmin => "National Admin",
            UserType::ZoneAdmin => "Zone Admin",
            UserType::Referee => "Referee",
        }
    }

    pub fn requires_zone(&self) -> bool {
        matches!(self, UserType::ZoneAdmin | UserType::Referee)
    }
}

/// Referee qualification. Levels other than `Archive` are ordered from
/// least to most qualified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum RefereeLevel {
    #[sea_orm(string_value = "aspirant")]
    Aspirant,
    #[sea_orm(string_value = "first_level")]
    FirstLevel,
    #[sea_orm(string_value = "regional")]
    Regional,
    #[sea_orm(string_value = "national")]
    National,
    #[sea_orm(string_value = "international")]
    International,
    #[sea_orm(string_value = "archive")]
    Archive,
}

impl RefereeLevel {
    fn rank(&self) -> Option<u8> {
        match self {
            RefereeLevel::Aspirant => Some(0),
            RefereeLevel::FirstLevel => Some(1),
            RefereeLevel::Regional => Some(2),
            RefereeLevel::National => Some(3),
            RefereeLevel::International => Some(4),
            RefereeLevel::Archive => None,
        }
    }

    /// Archived referees never satisfy a requirement, not even `Aspirant`.
    pub fn satisfies(&self, required: RefereeLevel) -> bool {
        match (self.rank(), required.rank()) {
            (Some(own), Some(required)) => own >= required,
            _ => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RefereeLevel::Aspirant => "Aspirante",
            RefereeLevel::FirstLevel => "Primo Livello",
            RefereeLevel::Regional => "Regionale",
            RefereeLevel::National => "Nazionale",
            RefereeLevel::International => "Internazionale",
            RefereeLevel::Archive => "Archivio",
        }
    }
}
