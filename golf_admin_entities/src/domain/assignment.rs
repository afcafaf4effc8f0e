use sea_orm::entity::prelude::*;
use serde::{Serialize, Deserialize};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentRole {
    #[sea_orm(string_value = "tournament_director")]
    TournamentDirector,
    #[sea_orm(string_value = "referee")]
    Referee,
    #[sea_orm(string_value = "observer")]
    Observer,
}

impl Default for AssignmentRole {
    fn default() -> Self {
        AssignmentRole::Referee
    }
}

impl AssignmentRole {
    /// Observers do not count towards the category's referee limits.
    pub fn counts_towards_limit(&self) -> bool {
        !matches!(self, AssignmentRole::Observer)
    }

    pub fn sort_key(&self) -> u8 {
        match self {
            AssignmentRole::TournamentDirector => 0,
            AssignmentRole::Referee => 1,
            AssignmentRole::Observer => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssignmentRole::TournamentDirector => "Direttore di Torneo",
            AssignmentRole::Referee => "Arbitro",
            AssignmentRole::Observer => "Osservatore",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequirements {
    pub assigned: u32,
    pub min: u32,
    pub max: u32,
    pub has_director: bool,
    pub director_required: bool,
    pub satisfied: bool,
}

impl AssignmentRequirements {
    pub fn evaluate(roles: &[AssignmentRole], settings: &super::category::CategorySettings) -> Self {
        let assigned = roles.iter().filter(|r| r.counts_towards_limit()).count() as u32;
        let has_director = roles.contains(&AssignmentRole::TournamentDirector);
        let satisfied = assigned >= settings.min_referees
            && assigned <= settings.max_referees
            && (has_director || !settings.requires_tournament_director);
        AssignmentRequirements {
            assigned,
            min: settings.min_referees,
            max: settings.max_referees,
            has_director,
            director_required: settings.requires_tournament_director,
            satisfied,
        }
    }
}
