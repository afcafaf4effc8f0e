use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Json, Router, routing::{get, post}};
use golf_admin_entities::domain::validation::{normalize_code, normalize_optional};
use golf_admin_entities::queries;
use golf_admin_entities::schema::{club, zone};
use sea_orm::prelude::*;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, IntoActiveModel, Order, QueryOrder, Select, TransactionTrait};
use serde::{Serialize, Deserialize};
use tracing::info;
use validator::Validate;

use crate::actions::{self, ActiveColumns, BulkAction, BulkActionRequest, ToggleResponse};
use crate::config::Config;
use crate::export::{yes_no, CsvExport};
use crate::pagination::{fetch_page, ListParams, Paginated};
use crate::response::{validate_request, APIError, ActionResponse};
use crate::state::AppState;


#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ClubRequest {
    #[validate(length(min = 1, max = 255, message = "The name is required and must not exceed 255 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "The code is required and must not exceed 20 characters"))]
    pub code: String,
    pub zone_id: Uuid,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub contact_person: Option<String>,
    pub is_active: Option<bool>,
}

impl ClubRequest {
    fn normalized(self) -> Self {
        ClubRequest {
            name: self.name.trim().to_string(),
            code: normalize_code(&self.code),
            email: normalize_optional(self.email),
            phone: normalize_optional(self.phone),
            address: normalize_optional(self.address),
            city: normalize_optional(self.city),
            contact_person: normalize_optional(self.contact_person),
            ..self
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClubFilter {
    pub zone_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubResponse {
    #[serde(flatten)]
    pub club: club::Model,
    pub zone_name: Option<String>,
    pub tournaments_count: u64,
}

const COLUMNS: ActiveColumns<club::Entity> = ActiveColumns {
    id: club::Column::Uuid,
    is_active: club::Column::IsActive,
    updated_at: club::Column::UpdatedAt,
};

fn filtered(params: &ListParams, filter: &ClubFilter) -> Select<club::Entity> {
    let mut select = club::Entity::find();
    if let Some(condition) = params.search_condition(&[club::Column::Name, club::Column::Code, club::Column::City]) {
        select = select.filter(condition);
    }
    if let Some(zone_id) = filter.zone_id {
        select = select.filter(club::Column::ZoneId.eq(zone_id));
    }
    if let Some(is_active) = filter.is_active {
        select = select.filter(club::Column::IsActive.eq(is_active));
    }
    select
}

async fn to_responses(db: &DatabaseConnection, clubs: Vec<club::Model>) -> Result<Vec<ClubResponse>, DbErr> {
    let ids = clubs.iter().map(|c| c.uuid).collect::<Vec<_>>();
    let zone_ids = clubs.iter().map(|c| c.zone_id).collect::<Vec<_>>();
    let tournaments = queries::tournaments_by_club(db, &ids).await?;
    let zones: HashMap<Uuid, String> = zone::Entity::find()
        .filter(zone::Column::Uuid.is_in(zone_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|z| (z.uuid, z.name))
        .collect();

    Ok(clubs.into_iter().map(|club| ClubResponse {
        zone_name: zones.get(&club.zone_id).cloned(),
        tournaments_count: tournaments.get(&club.uuid).copied().unwrap_or(0),
        club,
    }).collect())
}

async fn list_clubs(
    State(db): State<DatabaseConnection>,
    State(config): State<Arc<Config>>,
    Query(params): Query<ListParams>,
    Query(filter): Query<ClubFilter>,
) -> Result<Json<Paginated<ClubResponse>>, APIError> {
    let select = params.apply_sort(
        filtered(&params, &filter),
        &[("name", club::Column::Name), ("code", club::Column::Code), ("city", club::Column::City), ("created_at", club::Column::CreatedAt)],
        &[(club::Column::Name, Order::Asc)],
    )?;
    let page = fetch_page(&db, select, &params, config.default_per_page).await?;
    let data = to_responses(&db, page.data).await?;
    Ok(Json(Paginated { data, meta: page.meta }))
}

async fn get_club(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ClubResponse>, APIError> {
    let club = club::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Club"))?;
    to_responses(&db, vec![club]).await?.pop().map(Json).ok_or_else(|| APIError::not_found("Club"))
}

async fn check_request(db: &DatabaseConnection, request: &ClubRequest, id: Option<Uuid>) -> Result<(), APIError> {
    let mut errors = validate_request(request);
    if !errors.contains("code") && queries::is_taken::<club::Entity, _, _>(db, club::Column::Code, request.code.clone(), club::Column::Uuid, id).await? {
        errors.add("code", "This code is already in use");
    }
    if zone::Entity::find_by_id(request.zone_id).one(db).await?.is_none() {
        errors.add("zone_id", "The selected zone does not exist");
    }
    errors.into_result()?;
    Ok(())
}

async fn create_club(State(db): State<DatabaseConnection>, Json(request): Json<ClubRequest>) -> Result<Json<ClubResponse>, APIError> {
    let request = request.normalized();
    check_request(&db, &request, None).await?;

    let now = chrono::Utc::now().naive_utc();
    let club = club::Model {
        uuid: Uuid::new_v4(),
        name: request.name,
        code: request.code,
        zone_id: request.zone_id,
        email: request.email,
        phone: request.phone,
        address: request.address,
        city: request.city,
        contact_person: request.contact_person,
        is_active: request.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    }.into_active_model().insert(&db).await?;
    info!(club = %club.uuid, code = %club.code, "Created club");

    to_responses(&db, vec![club]).await?.pop().map(Json).ok_or_else(|| APIError::not_found("Club"))
}

async fn update_club(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>, Json(request): Json<ClubRequest>) -> Result<Json<ClubResponse>, APIError> {
    let existing = club::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Club"))?;
    let request = request.normalized();
    check_request(&db, &request, Some(id)).await?;

    let mut club: club::ActiveModel = existing.into();
    club.name = ActiveValue::Set(request.name);
    club.code = ActiveValue::Set(request.code);
    club.zone_id = ActiveValue::Set(request.zone_id);
    club.email = ActiveValue::Set(request.email);
    club.phone = ActiveValue::Set(request.phone);
    club.address = ActiveValue::Set(request.address);
    club.city = ActiveValue::Set(request.city);
    club.contact_person = ActiveValue::Set(request.contact_person);
    if let Some(is_active) = request.is_active {
        club.is_active = ActiveValue::Set(is_active);
    }
    club.updated_at = ActiveValue::Set(chrono::Utc::now().naive_utc());
    let club = club.update(&db).await?;

    to_responses(&db, vec![club]).await?.pop().map(Json).ok_or_else(|| APIError::not_found("Club"))
}

async fn delete_club(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let club = club::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Club"))?;
    let tournaments = queries::tournaments_by_club(&db, &[id]).await?.get(&id).copied().unwrap_or(0);
    if tournaments > 0 {
        return Err(APIError::conflict(format!("Cannot delete club: it hosts {} tournaments", tournaments)));
    }
    club::Entity::delete_by_id(id).exec(&db).await?;
    info!(club = %id, "Deleted club");
    Ok(ActionResponse::ok(format!("Club {} deleted", club.name)))
}

async fn toggle_club(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ToggleResponse>, APIError> {
    Ok(Json(actions::toggle_active(&db, &COLUMNS, id, "Club").await?))
}

async fn bulk_clubs(State(db): State<DatabaseConnection>, Json(request): Json<BulkActionRequest>) -> Result<Json<ActionResponse>, APIError> {
    request.check()?;
    let transaction = db.begin().await?;
    let affected = match request.action {
        BulkAction::Delete => {
            let tournaments = queries::tournaments_by_club(&transaction, &request.ids).await?;
            let blocked = club::Entity::find()
                .filter(club::Column::Uuid.is_in(tournaments.keys().cloned()))
                .all(&transaction)
                .await?
                .into_iter()
                .map(|c| c.name)
                .collect::<Vec<_>>();
            actions::ensure_deletable("clubs", blocked)?;
            actions::delete_many::<club::Entity, _>(&transaction, club::Column::Uuid, &request.ids).await?
        },
        action => actions::set_active_many(&transaction, &COLUMNS, &request.ids, action == BulkAction::Activate).await?,
    };
    transaction.commit().await?;
    Ok(ActionResponse::ok(request.message(affected)))
}

async fn export_clubs(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListParams>,
    Query(filter): Query<ClubFilter>,
) -> Result<Response, APIError> {
    let clubs = filtered(&params, &filter).order_by_asc(club::Column::Name).all(&db).await?;
    let clubs = to_responses(&db, clubs).await?;

    let mut export = CsvExport::new("clubs", &["ID", "Name", "Code", "Zone", "City", "Email", "Phone", "Active"])?;
    for c in clubs {
        export.row([
            c.club.uuid.to_string(),
            c.club.name,
            c.club.code,
            c.zone_name.unwrap_or_default(),
            c.club.city.unwrap_or_default(),
            c.club.email.unwrap_or_default(),
            c.club.phone.unwrap_or_default(),
            yes_no(c.club.is_active).to_string(),
        ])?;
    }
    export.finish()
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/clubs", get(list_clubs).post(create_club))
        .route("/clubs/export", get(export_clubs))
        .route("/clubs/bulk", post(bulk_clubs))
        .route("/clubs/:id", get(get_club).put(update_club).delete(delete_club))
        .route("/clubs/:id/toggle-active", post(toggle_club))
}
