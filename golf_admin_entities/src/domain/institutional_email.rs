use sea_orm::entity::prelude::*;
use sea_orm::{Condition, FromJsonQueryResult, QueryOrder};
use serde::{Serialize, Deserialize};

use crate::schema::institutional_email;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum EmailCategory {
    #[sea_orm(string_value = "federation")]
    Federation,
    #[sea_orm(string_value = "committee")]
    Committee,
    #[sea_orm(string_value = "zone")]
    Zone,
    #[sea_orm(string_value = "other")]
    Other,
}

impl EmailCategory {
    pub fn label(&self) -> &'static str {
        match self {
            EmailCategory::Federation => "Federazione",
            EmailCategory::Committee => "Comitato",
            EmailCategory::Zone => "Zona",
            EmailCategory::Other => "Altro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Assignment,
    AssignmentChange,
    Cancellation,
    AvailabilityReminder,
}

impl NotificationType {
    pub const ALL: [NotificationType; 4] = [
        NotificationType::Assignment,
        NotificationType::AssignmentChange,
        NotificationType::Cancellation,
        NotificationType::AvailabilityReminder,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            NotificationType::Assignment => "assignment",
            NotificationType::AssignmentChange => "assignment_change",
            NotificationType::Cancellation => "cancellation",
            NotificationType::AvailabilityReminder => "availability_reminder",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.key() == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct NotificationTypeList(pub Vec<NotificationType>);

impl institutional_email::Model {
    pub fn should_receive(&self, notification_type: NotificationType) -> bool {
        self.receive_all_notifications || self.notification_types.0.contains(&notification_type)
    }
}

/// Parses notification type keys, returning the unknown ones as the error.
pub fn parse_notification_types(keys: &[String]) -> Result<Vec<NotificationType>, Vec<String>> {
    let mut unknown = vec![];
    let mut parsed = vec![];
    for key in keys {
        match NotificationType::from_key(key) {
            Some(t) => {
                if !parsed.contains(&t) {
                    parsed.push(t);
                }
            },
            None => unknown.push(key.clone())
        }
    }
    if unknown.is_empty() {
        parsed.sort();
        Ok(parsed)
    }
    else {
        Err(unknown)
    }
}

/// Active institutional recipients for `notification_type` in a zone.
/// Addresses without a zone are federation-wide and always included.
pub async fn recipients_for<C>(db: &C, notification_type: NotificationType, zone_id: Uuid) -> Result<Vec<institutional_email::Model>, DbErr> where C: ConnectionTrait {
    let candidates = institutional_email::Entity::find()
        .filter(institutional_email::Column::IsActive.eq(true))
        .filter(
            Condition::any()
                .add(institutional_email::Column::ZoneId.is_null())
                .add(institutional_email::Column::ZoneId.eq(zone_id))
        )
        .order_by_asc(institutional_email::Column::Name)
        .all(db)
        .await?;

    Ok(candidates.into_iter().filter(|e| e.should_receive(notification_type)).collect())
}
