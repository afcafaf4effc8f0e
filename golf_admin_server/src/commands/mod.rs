use std::collections::HashMap;
use std::path::Path;

use csv::ReaderBuilder;
use golf_admin_entities::domain::validation::{normalize_code, normalize_optional};
use golf_admin_entities::schema::{club, zone};
use sea_orm::prelude::*;
use sea_orm::{ActiveValue::Set, TransactionTrait};
use serde::Deserialize;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(clap::Subcommand)]
pub enum Command {
    /// Imports clubs from a CSV file with the columns
    /// `name,code,zone_code,email,phone,city`.
    ImportClubs {
        path: String
    },
}

#[derive(Debug, Deserialize)]
struct ClubRecord {
    name: String,
    code: String,
    zone_code: String,
    email: Option<String>,
    phone: Option<String>,
    city: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

impl Command {
    pub async fn run(&self, app_state: AppState) -> anyhow::Result<()> {
        match self {
            Command::ImportClubs { path } => {
                let summary = import_clubs(&app_state.db, Path::new(path)).await?;
                info!(imported = summary.imported, skipped = summary.skipped, "Imported clubs");
                Ok(())
            }
        }
    }
}

pub async fn import_clubs(db: &DatabaseConnection, path: &Path) -> anyhow::Result<ImportSummary> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;

    let zones: HashMap<String, Uuid> = zone::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|z| (z.code, z.uuid))
        .collect();

    let now = chrono::Utc::now().naive_utc();
    let mut summary = ImportSummary::default();
    let mut to_insert = vec![];
    for record in reader.deserialize() {
        let record: ClubRecord = record?;
        let zone_code = normalize_code(&record.zone_code);
        let Some(zone_id) = zones.get(&zone_code) else {
            warn!(club = %record.name, zone = %zone_code, "Skipping club with unknown zone");
            summary.skipped += 1;
            continue;
        };

        to_insert.push(club::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            name: Set(record.name.trim().to_string()),
            code: Set(normalize_code(&record.code)),
            zone_id: Set(*zone_id),
            email: Set(normalize_optional(record.email).map(|e| e.to_lowercase())),
            phone: Set(normalize_optional(record.phone)),
            address: Set(None),
            city: Set(normalize_optional(record.city)),
            contact_person: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        });
    }
    summary.imported = to_insert.len();

    if !to_insert.is_empty() {
        let transaction = db.begin().await?;
        club::Entity::insert_many(to_insert).exec(&transaction).await?;
        transaction.commit().await?;
    }

    Ok(summary)
}
