use sea_orm::entity::prelude::*;
use serde::{Serialize, Deserialize};

use crate::domain::notification::{DispatchStatus, EmailList};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tournament_notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,
    pub tournament_id: Uuid,
    pub status: DispatchStatus,
    pub referee_template_id: Option<Uuid>,
    pub club_template_id: Option<Uuid>,
    pub institutional_template_id: Option<Uuid>,
    pub send_to_club: bool,
    pub send_to_referees: bool,
    pub send_to_institutional: bool,
    #[sea_orm(column_type = "Json")]
    pub additional_emails: EmailList,
    pub total_recipients: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub sent_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tournament::Entity",
        from = "Column::TournamentId",
        to = "super::tournament::Column::Uuid",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Tournament,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notification,
}

impl Related<super::tournament::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tournament.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notification.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
