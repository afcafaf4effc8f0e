use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::{get, post}};
use chrono::NaiveDate;
use golf_admin_entities::domain::assignment::AssignmentRequirements;
use golf_admin_entities::domain::notification::DispatchStatus;
use golf_admin_entities::domain::tournament::{validate_dates, TournamentStatus};
use golf_admin_entities::domain::validation::normalize_optional;
use golf_admin_entities::schema::{availability, assignment, club, notification, tournament, tournament_category, tournament_notification, zone};
use sea_orm::prelude::*;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, IntoActiveModel, Order, PaginatorTrait, Select, TransactionTrait};
use serde::{Serialize, Deserialize};
use tracing::info;
use validator::Validate;

use crate::assignments::{self, AssignmentView};
use crate::config::Config;
use crate::pagination::{fetch_page, ListParams, Paginated};
use crate::response::{validate_request, APIError, ActionResponse};
use crate::state::AppState;


#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TournamentRequest {
    #[validate(length(min = 1, max = 255, message = "The name is required and must not exceed 255 characters"))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub club_id: Uuid,
    pub category_id: Uuid,
    pub status: Option<TournamentStatus>,
    pub availability_deadline: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TournamentFilter {
    pub zone_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub status: Option<TournamentStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusRequest {
    pub status: TournamentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentResponse {
    #[serde(flatten)]
    pub tournament: tournament::Model,
    pub club_name: Option<String>,
    pub zone_name: Option<String>,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentDetailResponse {
    #[serde(flatten)]
    pub tournament: TournamentResponse,
    pub assignments: Vec<AssignmentView>,
    pub availabilities_count: u64,
    pub requirements: AssignmentRequirements,
}

fn filtered(params: &ListParams, filter: &TournamentFilter) -> Select<tournament::Entity> {
    let mut select = tournament::Entity::find();
    if let Some(condition) = params.search_condition(&[tournament::Column::Name, tournament::Column::Notes]) {
        select = select.filter(condition);
    }
    if let Some(zone_id) = filter.zone_id {
        select = select.filter(tournament::Column::ZoneId.eq(zone_id));
    }
    if let Some(category_id) = filter.category_id {
        select = select.filter(tournament::Column::CategoryId.eq(category_id));
    }
    if let Some(status) = filter.status {
        select = select.filter(tournament::Column::Status.eq(status));
    }
    if let Some(from) = filter.from {
        select = select.filter(tournament::Column::EndDate.gte(from));
    }
    if let Some(to) = filter.to {
        select = select.filter(tournament::Column::StartDate.lte(to));
    }
    select
}

async fn to_responses(db: &DatabaseConnection, tournaments: Vec<tournament::Model>) -> Result<Vec<TournamentResponse>, DbErr> {
    let clubs: HashMap<Uuid, String> = club::Entity::find()
        .filter(club::Column::Uuid.is_in(tournaments.iter().map(|t| t.club_id).collect::<Vec<_>>()))
        .all(db).await?
        .into_iter().map(|c| (c.uuid, c.name)).collect();
    let zones: HashMap<Uuid, String> = zone::Entity::find()
        .filter(zone::Column::Uuid.is_in(tournaments.iter().map(|t| t.zone_id).collect::<Vec<_>>()))
        .all(db).await?
        .into_iter().map(|z| (z.uuid, z.name)).collect();
    let categories: HashMap<Uuid, String> = tournament_category::Entity::find()
        .filter(tournament_category::Column::Uuid.is_in(tournaments.iter().map(|t| t.category_id).collect::<Vec<_>>()))
        .all(db).await?
        .into_iter().map(|c| (c.uuid, c.name)).collect();

    Ok(tournaments.into_iter().map(|tournament| TournamentResponse {
        club_name: clubs.get(&tournament.club_id).cloned(),
        zone_name: zones.get(&tournament.zone_id).cloned(),
        category_name: categories.get(&tournament.category_id).cloned(),
        tournament,
    }).collect())
}

async fn detail(db: &DatabaseConnection, tournament: tournament::Model) -> Result<TournamentDetailResponse, APIError> {
    let category = tournament_category::Entity::find_by_id(tournament.category_id).one(db).await?.ok_or_else(|| APIError::not_found("Category"))?;
    let assignments = assignments::views_for_tournament(db, tournament.uuid).await?;
    let availabilities_count = availability::Entity::find()
        .filter(availability::Column::TournamentId.eq(tournament.uuid))
        .count(db)
        .await?;
    let roles = assignments.iter().map(|a| a.assignment.role).collect::<Vec<_>>();
    let response = to_responses(db, vec![tournament]).await?.pop().ok_or_else(|| APIError::not_found("Tournament"))?;

    Ok(TournamentDetailResponse {
        tournament: response,
        assignments,
        availabilities_count,
        requirements: AssignmentRequirements::evaluate(&roles, &category.settings),
    })
}

async fn list_tournaments(
    State(db): State<DatabaseConnection>,
    State(config): State<Arc<Config>>,
    Query(params): Query<ListParams>,
    Query(filter): Query<TournamentFilter>,
) -> Result<Json<Paginated<TournamentResponse>>, APIError> {
    let select = params.apply_sort(
        filtered(&params, &filter),
        &[("name", tournament::Column::Name), ("start_date", tournament::Column::StartDate), ("status", tournament::Column::Status), ("created_at", tournament::Column::CreatedAt)],
        &[(tournament::Column::StartDate, Order::Desc), (tournament::Column::Name, Order::Asc)],
    )?;
    let page = fetch_page(&db, select, &params, config.default_per_page).await?;
    let data = to_responses(&db, page.data).await?;
    Ok(Json(Paginated { data, meta: page.meta }))
}

async fn get_tournament(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<TournamentDetailResponse>, APIError> {
    let tournament = tournament::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Tournament"))?;
    Ok(Json(detail(&db, tournament).await?))
}

/// Validates the request and returns the zone of the hosting club.
async fn check_request(db: &DatabaseConnection, request: &TournamentRequest) -> Result<Uuid, APIError> {
    let mut errors = validate_request(request);
    errors.merge(validate_dates(request.start_date, request.end_date, request.availability_deadline));
    let club = club::Entity::find_by_id(request.club_id).one(db).await?;
    if club.is_none() {
        errors.add("club_id", "The selected club does not exist");
    }
    if tournament_category::Entity::find_by_id(request.category_id).one(db).await?.is_none() {
        errors.add("category_id", "The selected category does not exist");
    }
    errors.into_result()?;
    club.map(|c| c.zone_id).ok_or_else(|| APIError::invalid_field("club_id", "The selected club does not exist"))
}

async fn create_tournament(State(db): State<DatabaseConnection>, Json(request): Json<TournamentRequest>) -> Result<Json<TournamentDetailResponse>, APIError> {
    let zone_id = check_request(&db, &request).await?;

    let now = chrono::Utc::now().naive_utc();
    let tournament = tournament::Model {
        uuid: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        start_date: request.start_date,
        end_date: request.end_date,
        club_id: request.club_id,
        zone_id,
        category_id: request.category_id,
        status: request.status.unwrap_or_default(),
        availability_deadline: request.availability_deadline,
        notes: normalize_optional(request.notes),
        created_at: now,
        updated_at: now,
    }.into_active_model().insert(&db).await?;
    info!(tournament = %tournament.uuid, "Created tournament");

    Ok(Json(detail(&db, tournament).await?))
}

async fn update_tournament(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>, Json(request): Json<TournamentRequest>) -> Result<Json<TournamentDetailResponse>, APIError> {
    let existing = tournament::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Tournament"))?;
    let zone_id = check_request(&db, &request).await?;

    let mut tournament: tournament::ActiveModel = existing.into();
    tournament.name = ActiveValue::Set(request.name.trim().to_string());
    tournament.start_date = ActiveValue::Set(request.start_date);
    tournament.end_date = ActiveValue::Set(request.end_date);
    tournament.club_id = ActiveValue::Set(request.club_id);
    tournament.zone_id = ActiveValue::Set(zone_id);
    tournament.category_id = ActiveValue::Set(request.category_id);
    if let Some(status) = request.status {
        tournament.status = ActiveValue::Set(status);
    }
    tournament.availability_deadline = ActiveValue::Set(request.availability_deadline);
    tournament.notes = ActiveValue::Set(normalize_optional(request.notes));
    tournament.updated_at = ActiveValue::Set(chrono::Utc::now().naive_utc());
    let tournament = tournament.update(&db).await?;

    Ok(Json(detail(&db, tournament).await?))
}

async fn set_status(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>, Json(request): Json<SetStatusRequest>) -> Result<Json<ActionResponse>, APIError> {
    let existing = tournament::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Tournament"))?;
    let mut tournament: tournament::ActiveModel = existing.into();
    tournament.status = ActiveValue::Set(request.status);
    tournament.updated_at = ActiveValue::Set(chrono::Utc::now().naive_utc());
    tournament.update(&db).await?;
    info!(tournament = %id, status = ?request.status, "Changed tournament status");
    Ok(ActionResponse::ok("Tournament status updated"))
}

async fn delete_tournament(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let tournament = tournament::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Tournament"))?;
    let sent = tournament_notification::Entity::find()
        .filter(tournament_notification::Column::TournamentId.eq(id))
        .filter(tournament_notification::Column::Status.eq(DispatchStatus::Sent))
        .count(&db)
        .await?;
    if sent > 0 {
        return Err(APIError::conflict("Cannot delete tournament: notifications have already been sent"));
    }

    let transaction = db.begin().await?;
    notification::Entity::delete_many().filter(notification::Column::TournamentId.eq(id)).exec(&transaction).await?;
    tournament_notification::Entity::delete_many().filter(tournament_notification::Column::TournamentId.eq(id)).exec(&transaction).await?;
    availability::Entity::delete_many().filter(availability::Column::TournamentId.eq(id)).exec(&transaction).await?;
    assignment::Entity::delete_many().filter(assignment::Column::TournamentId.eq(id)).exec(&transaction).await?;
    tournament::Entity::delete_by_id(id).exec(&transaction).await?;
    transaction.commit().await?;

    info!(tournament = %id, "Deleted tournament");
    Ok(ActionResponse::ok(format!("Tournament {} deleted", tournament.name)))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/tournaments", get(list_tournaments).post(create_tournament))
        .route("/tournaments/:id", get(get_tournament).put(update_tournament).delete(delete_tournament))
        .route("/tournaments/:id/status", post(set_status))
}
