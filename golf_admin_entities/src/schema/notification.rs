use sea_orm::entity::prelude::*;
use serde::{Serialize, Deserialize};

use crate::domain::notification::{DeliveryStatus, RecipientType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,
    pub tournament_notification_id: Uuid,
    pub tournament_id: Uuid,
    pub recipient_type: RecipientType,
    pub recipient_name: String,
    pub recipient_email: String,
    pub user_id: Option<Uuid>,
    pub institutional_email_id: Option<Uuid>,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub status: DeliveryStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub attempts: i32,
    pub sent_at: Option<DateTime>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tournament_notification::Entity",
        from = "Column::TournamentNotificationId",
        to = "super::tournament_notification::Column::Uuid",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    TournamentNotification,
}

impl Related<super::tournament_notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TournamentNotification.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
