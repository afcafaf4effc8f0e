use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Serialize, Deserialize};

use super::validation::FieldErrors;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl Default for TournamentStatus {
    fn default() -> Self {
        TournamentStatus::Draft
    }
}

impl TournamentStatus {
    pub fn accepts_availability(&self) -> bool {
        *self == TournamentStatus::Open
    }
}

pub fn validate_dates(start_date: NaiveDate, end_date: NaiveDate, availability_deadline: Option<NaiveDate>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if end_date < start_date {
        errors.add("end_date", "The end date must not be before the start date");
    }
    if let Some(deadline) = availability_deadline {
        if deadline > start_date {
            errors.add("availability_deadline", "The availability deadline must not be after the start date");
        }
    }
    errors
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// A single date for one-day events, `start - end` otherwise.
pub fn format_date_range(start_date: NaiveDate, end_date: NaiveDate) -> String {
    if start_date == end_date {
        format_date(start_date)
    }
    else {
        format!("{} - {}", format_date(start_date), format_date(end_date))
    }
}


#[cfg(test)]
mod test {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let errors = validate_dates(date(2024, 5, 10), date(2024, 5, 9), None);
        assert!(errors.contains("end_date"));
    }

    #[test]
    fn test_deadline_after_start_is_rejected() {
        let errors = validate_dates(date(2024, 5, 10), date(2024, 5, 12), Some(date(2024, 5, 11)));
        assert!(errors.contains("availability_deadline"));
        assert!(!errors.contains("end_date"));
    }

    #[test]
    fn test_date_range_formatting() {
        assert_eq!(format_date_range(date(2024, 5, 10), date(2024, 5, 10)), "10/05/2024");
        assert_eq!(format_date_range(date(2024, 5, 10), date(2024, 5, 12)), "10/05/2024 - 12/05/2024");
    }
}
