use sea_orm::entity::prelude::*;
use serde::{Serialize, Deserialize};

use crate::domain::letter_template::TemplateType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "letter_template")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,
    pub name: String,
    pub template_type: TemplateType,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub zone_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
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
    #[sea_orm(
        belongs_to = "super::tournament_category::Entity",
        from = "Column::CategoryId",
        to = "super::tournament_category::Column::Uuid",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    TournamentCategory,
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

impl ActiveModelBehavior for ActiveModel {}
