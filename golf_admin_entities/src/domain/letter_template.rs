use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Condition};
use serde::{Serialize, Deserialize};

use crate::schema::letter_template;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    #[sea_orm(string_value = "referee_assignment")]
    RefereeAssignment,
    #[sea_orm(string_value = "club_notification")]
    ClubNotification,
    #[sea_orm(string_value = "institutional_notification")]
    InstitutionalNotification,
    #[sea_orm(string_value = "convocation")]
    Convocation,
}

impl TemplateType {
    pub fn label(&self) -> &'static str {
        match self {
            TemplateType::RefereeAssignment => "Referee assignment",
            TemplateType::ClubNotification => "Club notification",
            TemplateType::InstitutionalNotification => "Institutional notification",
            TemplateType::Convocation => "Convocation",
        }
    }
}

/// The (type, zone, category) triple within which at most one template is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateScope {
    pub template_type: TemplateType,
    pub zone_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl TemplateScope {
    pub fn of(model: &letter_template::Model) -> Self {
        TemplateScope {
            template_type: model.template_type,
            zone_id: model.zone_id,
            category_id: model.category_id,
        }
    }

    pub fn condition(&self) -> Condition {
        let zone = match self.zone_id {
            Some(zone_id) => letter_template::Column::ZoneId.eq(zone_id),
            None => letter_template::Column::ZoneId.is_null(),
        };
        let category = match self.category_id {
            Some(category_id) => letter_template::Column::CategoryId.eq(category_id),
            None => letter_template::Column::CategoryId.is_null(),
        };
        Condition::all()
            .add(letter_template::Column::TemplateType.eq(self.template_type))
            .add(zone)
            .add(category)
    }
}

/// Tiers searched by `resolve_template`, most specific first.
fn resolution_tiers(zone_id: Uuid, category_id: Uuid) -> [(Option<Uuid>, Option<Uuid>); 4] {
    [
        (Some(zone_id), Some(category_id)),
        (Some(zone_id), None),
        (None, Some(category_id)),
        (None, None),
    ]
}

/// Finds the active template for a tournament's zone and category, falling
/// back to the global template of the type. Within a tier the default wins,
/// then the most recently updated one.
pub async fn resolve_template<C>(db: &C, template_type: TemplateType, zone_id: Uuid, category_id: Uuid) -> Result<Option<letter_template::Model>, DbErr> where C: ConnectionTrait {
    for (zone_id, category_id) in resolution_tiers(zone_id, category_id) {
        let scope = TemplateScope { template_type, zone_id, category_id };
        let found = letter_template::Entity::find()
            .filter(scope.condition())
            .filter(letter_template::Column::IsActive.eq(true))
            .order_by_desc(letter_template::Column::IsDefault)
            .order_by_desc(letter_template::Column::UpdatedAt)
            .one(db)
            .await?;
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}
