use sea_orm::entity::prelude::*;
use serde::{Serialize, Deserialize};

use crate::domain::letterhead::LetterheadContact;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "letterhead")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,
    pub title: String,
    pub zone_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub header_text: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub footer_text: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub contact: LetterheadContact,
    pub logo_path: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
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
        on_delete = "Cascade"
    )]
    Zone,
}

impl Related<super::zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Zone.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
