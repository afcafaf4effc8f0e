use std::collections::HashMap;

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Serialize, Deserialize};
use tracing::warn;


lazy_static! {
    // A `{{` without a closing `}}` matches the second branch.
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{(.*?)\}\}|\{\{").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateVariable {
    TournamentName,
    TournamentDates,
    TournamentStartDate,
    TournamentEndDate,
    ClubName,
    ClubEmail,
    ZoneName,
    CategoryName,
    RecipientName,
    RefereeName,
    RefereeLevel,
    Role,
    RefereesList,
    TournamentDirector,
    FederationName,
    CurrentDate,
}

impl TemplateVariable {
    pub const ALL: [TemplateVariable; 16] = [
        TemplateVariable::TournamentName,
        TemplateVariable::TournamentDates,
        TemplateVariable::TournamentStartDate,
        TemplateVariable::TournamentEndDate,
        TemplateVariable::ClubName,
        TemplateVariable::ClubEmail,
        TemplateVariable::ZoneName,
        TemplateVariable::CategoryName,
        TemplateVariable::RecipientName,
        TemplateVariable::RefereeName,
        TemplateVariable::RefereeLevel,
        TemplateVariable::Role,
        TemplateVariable::RefereesList,
        TemplateVariable::TournamentDirector,
        TemplateVariable::FederationName,
        TemplateVariable::CurrentDate,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            TemplateVariable::TournamentName => "tournament_name",
            TemplateVariable::TournamentDates => "tournament_dates",
            TemplateVariable::TournamentStartDate => "tournament_start_date",
            TemplateVariable::TournamentEndDate => "tournament_end_date",
            TemplateVariable::ClubName => "club_name",
            TemplateVariable::ClubEmail => "club_email",
            TemplateVariable::ZoneName => "zone_name",
            TemplateVariable::CategoryName => "category_name",
            TemplateVariable::RecipientName => "recipient_name",
            TemplateVariable::RefereeName => "referee_name",
            TemplateVariable::RefereeLevel => "referee_level",
            TemplateVariable::Role => "role",
            TemplateVariable::RefereesList => "referees_list",
            TemplateVariable::TournamentDirector => "tournament_director",
            TemplateVariable::FederationName => "federation_name",
            TemplateVariable::CurrentDate => "current_date",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TemplateVariable::TournamentName => "Name of the tournament",
            TemplateVariable::TournamentDates => "Tournament dates, a single day or a range",
            TemplateVariable::TournamentStartDate => "First day of the tournament",
            TemplateVariable::TournamentEndDate => "Last day of the tournament",
            TemplateVariable::ClubName => "Hosting club",
            TemplateVariable::ClubEmail => "Email address of the hosting club",
            TemplateVariable::ZoneName => "Zone of the tournament",
            TemplateVariable::CategoryName => "Tournament category",
            TemplateVariable::RecipientName => "Name of the person or office receiving the letter",
            TemplateVariable::RefereeName => "Name of the assigned referee (referee letters only)",
            TemplateVariable::RefereeLevel => "Level of the assigned referee (referee letters only)",
            TemplateVariable::Role => "Role of the assigned referee (referee letters only)",
            TemplateVariable::RefereesList => "All assigned referees with their roles, one per line",
            TemplateVariable::TournamentDirector => "Name of the tournament director, if assigned",
            TemplateVariable::FederationName => "Name of the federation",
            TemplateVariable::CurrentDate => "Date the letter is sent",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.key() == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    values: HashMap<TemplateVariable, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, variable: TemplateVariable, value: impl Into<String>) -> &mut Self {
        self.values.insert(variable, value.into());
        self
    }

    pub fn with(mut self, variable: TemplateVariable, value: impl Into<String>) -> Self {
        self.set(variable, value);
        self
    }

    pub fn get(&self, variable: TemplateVariable) -> Option<&str> {
        self.values.get(&variable).map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

fn placeholder_name<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.get(1).map(|name| name.as_str().trim())
}

/// Names of all placeholders in `text`, in order of appearance. An unclosed
/// `{{` is reported as itself.
pub fn placeholders(text: &str) -> Vec<String> {
    PLACEHOLDER.captures_iter(text)
        .map(|c| placeholder_name(&c).unwrap_or("{{").to_string())
        .collect()
}

pub fn unknown_variables(text: &str) -> Vec<String> {
    placeholders(text)
        .into_iter()
        .filter(|name| TemplateVariable::from_key(name).is_none())
        .unique()
        .collect()
}

/// Replaces every placeholder in one pass. Values are inserted verbatim
/// and are not scanned again. Unknown or malformed placeholders are dropped.
pub fn render(text: &str, context: &TemplateContext) -> String {
    PLACEHOLDER.replace_all(text, |caps: &Captures| {
        match placeholder_name(caps).and_then(TemplateVariable::from_key) {
            Some(variable) => context.get(variable).unwrap_or("").to_string(),
            None => {
                warn!(placeholder = &caps[0], "Dropping unknown template placeholder");
                String::new()
            }
        }
    }).into_owned()
}

pub fn render_message(subject: &str, body: &str, context: &TemplateContext) -> RenderedMessage {
    RenderedMessage {
        subject: render(subject, context),
        body: render(body, context),
    }
}
