use sea_orm::entity::prelude::*;
use serde::{Serialize, Deserialize};

use crate::domain::tournament::TournamentStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tournament")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub club_id: Uuid,
    pub zone_id: Uuid,
    pub category_id: Uuid,
    pub status: TournamentStatus,
    pub availability_deadline: Option<Date>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::club::Entity",
        from = "Column::ClubId",
        to = "super::club::Column::Uuid",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Club,
    #[sea_orm(
        belongs_to = "super::zone::Entity",
        from = "Column::ZoneId",
        to = "super::zone::Column::Uuid",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Zone,
    #[sea_orm(
        belongs_to = "super::tournament_category::Entity",
        from = "Column::CategoryId",
        to = "super::tournament_category::Column::Uuid",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    TournamentCategory,
    #[sea_orm(has_many = "super::assignment::Entity")]
    Assignment,
    #[sea_orm(has_many = "super::availability::Entity")]
    Availability,
    #[sea_orm(has_many = "super::tournament_notification::Entity")]
    TournamentNotification,
}

impl Related<super::club::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Club.def()
    }
}

impl Related<super::zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Zone.def()
    }
}

impl Related<super::tournament_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TournamentCategory.def()
    }
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::availability::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Availability.def()
    }
}

impl Related<super::tournament_notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TournamentNotification.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
