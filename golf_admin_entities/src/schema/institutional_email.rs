use sea_orm::entity::prelude::*;
use serde::{Serialize, Deserialize};

use crate::domain::institutional_email::{EmailCategory, NotificationTypeList};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "institutional_email")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub category: EmailCategory,
    pub zone_id: Option<Uuid>,
    pub receive_all_notifications: bool,
    #[sea_orm(column_type = "Json")]
    pub notification_types: NotificationTypeList,
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::zone::Entity",
        from = "Column::ZoneId",
        to = "super::zone::Column::Uuid",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Zone,
}

impl Related<super::zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Zone.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
