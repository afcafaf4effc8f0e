use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Serialize, Deserialize};

use crate::schema::tournament_category;
use super::user::RefereeLevel;
use super::validation::FieldErrors;


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "zones")]
pub enum ZoneVisibility {
    All,
    Only(Vec<Uuid>),
}

impl Default for ZoneVisibility {
    fn default() -> Self {
        ZoneVisibility::All
    }
}

/// Referee requirements and visibility rules of a tournament category.
/// Stored as a single JSON column; there are no mirrored physical columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct CategorySettings {
    pub required_referee_level: RefereeLevel,
    pub min_referees: u32,
    pub max_referees: u32,
    pub visibility_zones: ZoneVisibility,
    pub requires_tournament_director: bool,
}

impl Default for CategorySettings {
    fn default() -> Self {
        CategorySettings {
            required_referee_level: RefereeLevel::Aspirant,
            min_referees: 1,
            max_referees: 4,
            visibility_zones: ZoneVisibility::All,
            requires_tournament_director: false,
        }
    }
}

impl CategorySettings {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.min_referees < 1 {
            errors.add("settings.min_referees", "At least one referee is required");
        }
        if self.max_referees < self.min_referees {
            errors.add("settings.max_referees", "The maximum number of referees must not be lower than the minimum");
        }
        if self.required_referee_level == RefereeLevel::Archive {
            errors.add("settings.required_referee_level", "Archived referees can not be required");
        }
        if let ZoneVisibility::Only(zones) = &self.visibility_zones {
            if zones.is_empty() {
                errors.add("settings.visibility_zones", "Select at least one zone or make the category visible to all zones");
            }
        }
        errors
    }
}

impl tournament_category::Model {
    /// National categories are visible everywhere regardless of their zone list.
    pub fn is_visible_to_zone(&self, zone_id: Option<Uuid>) -> bool {
        if self.is_national {
            return true;
        }
        match (&self.settings.visibility_zones, zone_id) {
            (ZoneVisibility::All, _) => true,
            (ZoneVisibility::Only(zones), Some(zone_id)) => zones.contains(&zone_id),
            (ZoneVisibility::Only(_), None) => false,
        }
    }

    pub fn accepts_referee_level(&self, level: Option<RefereeLevel>) -> bool {
        level.map(|l| l.satisfies(self.settings.required_referee_level)).unwrap_or(false)
    }
}


#[cfg(test)]
mod test {
    use super::*;

    fn category(is_national: bool, visibility: ZoneVisibility) -> tournament_category::Model {
        tournament_category::Model {
            uuid: Uuid::from_u128(1),
            name: "Gara Zonale".into(),
            code: "GZ".into(),
            description: None,
            is_national,
            sort_order: 0,
            is_active: true,
            settings: CategorySettings {
                visibility_zones: visibility,
                required_referee_level: RefereeLevel::Regional,
                ..Default::default()
            },
            created_at: chrono::NaiveDateTime::default(),
            updated_at: chrono::NaiveDateTime::default(),
        }
    }

    #[test]
    fn test_national_category_is_visible_everywhere() {
        let c = category(true, ZoneVisibility::Only(vec![Uuid::from_u128(10)]));
        assert!(c.is_visible_to_zone(Some(Uuid::from_u128(11))));
    }

    #[test]
    fn test_restricted_category_is_only_visible_to_listed_zones() {
        let c = category(false, ZoneVisibility::Only(vec![Uuid::from_u128(10)]));
        assert!(c.is_visible_to_zone(Some(Uuid::from_u128(10))));
        assert!(!c.is_visible_to_zone(Some(Uuid::from_u128(11))));
        assert!(!c.is_visible_to_zone(None));
    }

    #[test]
    fn test_referee_level_requirement() {
        let c = category(false, ZoneVisibility::All);
        assert!(c.accepts_referee_level(Some(RefereeLevel::National)));
        assert!(!c.accepts_referee_level(Some(RefereeLevel::FirstLevel)));
        assert!(!c.accepts_referee_level(None));
    }

    #[test]
    fn test_settings_reject_inverted_bounds() {
        let settings = CategorySettings { min_referees: 3, max_referees: 2, ..Default::default() };
        let errors = settings.validate();
        assert!(errors.contains("settings.max_referees"));
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: CategorySettings = serde_json::from_str(r#"{"max_referees": 6}"#).unwrap();
        assert_eq!(settings.max_referees, 6);
        assert_eq!(settings.min_referees, 1);
        assert_eq!(settings.visibility_zones, ZoneVisibility::All);
    }

    #[test]
    fn test_visibility_zones_key() {
        let zone = Uuid::from_u128(7);
        let settings: CategorySettings = serde_json::from_value(serde_json::json!({
            "visibility_zones": {"mode": "only", "zones": [zone]},
        })).unwrap();
        assert_eq!(settings.visibility_zones, ZoneVisibility::Only(vec![zone]));
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["visibility_zones"]["mode"], "only");
    }
}
