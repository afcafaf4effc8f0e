use sea_orm::entity::prelude::*;
use sea_orm::{FromJsonQueryResult, QueryOrder};
use serde::{Serialize, Deserialize};

use crate::schema::letterhead;
use super::template::{render, TemplateContext};


#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct LetterheadContact {
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

impl LetterheadContact {
    pub fn lines(&self) -> Vec<String> {
        [
            self.address.clone(),
            self.phone.as_ref().map(|p| format!("Tel. {}", p)),
            self.email.as_ref().map(|e| format!("Email: {}", e)),
            self.website.clone(),
        ].into_iter().flatten().collect()
    }
}

/// The zone's default letterhead, else the global default.
pub async fn resolve_letterhead<C>(db: &C, zone_id: Option<Uuid>) -> Result<Option<letterhead::Model>, DbErr> where C: ConnectionTrait {
    if let Some(zone_id) = zone_id {
        let zone_default = letterhead::Entity::find()
            .filter(letterhead::Column::ZoneId.eq(zone_id))
            .filter(letterhead::Column::IsActive.eq(true))
            .filter(letterhead::Column::IsDefault.eq(true))
            .order_by_desc(letterhead::Column::UpdatedAt)
            .one(db)
            .await?;
        if zone_default.is_some() {
            return Ok(zone_default);
        }
    }
    letterhead::Entity::find()
        .filter(letterhead::Column::ZoneId.is_null())
        .filter(letterhead::Column::IsActive.eq(true))
        .filter(letterhead::Column::IsDefault.eq(true))
        .order_by_desc(letterhead::Column::UpdatedAt)
        .one(db)
        .await
}

impl letterhead::Model {
    /// Wraps an already rendered body with this letterhead's header, footer
    /// and contact lines. Header and footer may use template variables.
    pub fn compose(&self, body: &str, context: &TemplateContext) -> String {
        let mut footer_parts = vec![];
        if let Some(footer) = self.footer_text.as_ref().filter(|f| !f.trim().is_empty()) {
            footer_parts.push(render(footer, context));
        }
        let contact = self.contact.lines();
        if !contact.is_empty() {
            footer_parts.push(contact.join(" | "));
        }

        let mut sections = vec![];
        if let Some(header) = self.header_text.as_ref().filter(|h| !h.trim().is_empty()) {
            sections.push(render(header, context));
        }
        sections.push(body.to_string());
        if !footer_parts.is_empty() {
            sections.push(footer_parts.join("\n"));
        }
        sections.join("\n\n")
    }
}
