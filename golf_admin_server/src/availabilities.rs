use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::{Json, Router, routing::{get, delete}};
use golf_admin_entities::domain::validation::normalize_optional;
use golf_admin_entities::schema::{availability, tournament, tournament_category, user};
use sea_orm::prelude::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, QueryOrder};
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::response::{APIError, ActionResponse};
use crate::state::AppState;


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclareAvailabilityRequest {
    pub user_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityView {
    #[serde(flatten)]
    pub availability: availability::Model,
    pub referee_name: String,
    pub tournament_name: String,
}

async fn declare(State(db): State<DatabaseConnection>, Path(tournament_id): Path<Uuid>, Json(request): Json<DeclareAvailabilityRequest>) -> Result<Json<AvailabilityView>, APIError> {
    let tournament = tournament::Entity::find_by_id(tournament_id).one(&db).await?.ok_or_else(|| APIError::not_found("Tournament"))?;
    let referee = user::Entity::find_by_id(request.user_id).one(&db).await?
        .filter(|u| u.is_active_referee())
        .ok_or_else(|| APIError::invalid_field("user_id", "The selected user is not an active referee"))?;

    if !tournament.status.accepts_availability() {
        return Err(APIError::invalid_field("tournament_id", "The tournament is not open for availability"));
    }
    if let Some(deadline) = tournament.availability_deadline {
        if chrono::Utc::now().date_naive() > deadline {
            return Err(APIError::invalid_field("tournament_id", "The availability deadline has passed"));
        }
    }
    let category = tournament_category::Entity::find_by_id(tournament.category_id).one(&db).await?.ok_or_else(|| APIError::not_found("Category"))?;
    if !category.is_visible_to_zone(referee.zone_id) {
        return Err(APIError::invalid_field("tournament_id", "The tournament category is not available in the referee's zone"));
    }

    let duplicate = availability::Entity::find()
        .filter(availability::Column::TournamentId.eq(tournament_id))
        .filter(availability::Column::UserId.eq(referee.uuid))
        .one(&db)
        .await?;
    if duplicate.is_some() {
        return Err(APIError::conflict("Availability already declared for this tournament"));
    }

    let availability = availability::Model {
        uuid: Uuid::new_v4(),
        user_id: referee.uuid,
        tournament_id,
        notes: normalize_optional(request.notes),
        submitted_at: chrono::Utc::now().naive_utc(),
    }.into_active_model().insert(&db).await?;
    info!(tournament = %tournament_id, referee = %referee.uuid, "Declared availability");

    Ok(Json(AvailabilityView {
        availability,
        referee_name: referee.name,
        tournament_name: tournament.name,
    }))
}

async fn withdraw(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let result = availability::Entity::delete_by_id(id).exec(&db).await?;
    if result.rows_affected == 0 {
        return Err(APIError::not_found("Availability"));
    }
    info!(availability = %id, "Withdrew availability");
    Ok(ActionResponse::ok("Availability withdrawn"))
}

async fn views(db: &DatabaseConnection, availabilities: Vec<availability::Model>) -> Result<Vec<AvailabilityView>, DbErr> {
    let users: HashMap<Uuid, String> = user::Entity::find()
        .filter(user::Column::Uuid.is_in(availabilities.iter().map(|a| a.user_id).collect::<Vec<_>>()))
        .all(db).await?
        .into_iter().map(|u| (u.uuid, u.name)).collect();
    let tournaments: HashMap<Uuid, String> = tournament::Entity::find()
        .filter(tournament::Column::Uuid.is_in(availabilities.iter().map(|a| a.tournament_id).collect::<Vec<_>>()))
        .all(db).await?
        .into_iter().map(|t| (t.uuid, t.name)).collect();

    Ok(availabilities.into_iter().map(|availability| AvailabilityView {
        referee_name: users.get(&availability.user_id).cloned().unwrap_or_default(),
        tournament_name: tournaments.get(&availability.tournament_id).cloned().unwrap_or_default(),
        availability,
    }).collect())
}

async fn list_for_tournament(State(db): State<DatabaseConnection>, Path(tournament_id): Path<Uuid>) -> Result<Json<Vec<AvailabilityView>>, APIError> {
    tournament::Entity::find_by_id(tournament_id).one(&db).await?.ok_or_else(|| APIError::not_found("Tournament"))?;
    let availabilities = availability::Entity::find()
        .filter(availability::Column::TournamentId.eq(tournament_id))
        .order_by_asc(availability::Column::SubmittedAt)
        .all(&db)
        .await?;
    Ok(Json(views(&db, availabilities).await?))
}

async fn list_for_user(State(db): State<DatabaseConnection>, Path(user_id): Path<Uuid>) -> Result<Json<Vec<AvailabilityView>>, APIError> {
    user::Entity::find_by_id(user_id).one(&db).await?.ok_or_else(|| APIError::not_found("User"))?;
    let availabilities = availability::Entity::find()
        .filter(availability::Column::UserId.eq(user_id))
        .order_by_desc(availability::Column::SubmittedAt)
        .all(&db)
        .await?;
    Ok(Json(views(&db, availabilities).await?))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/tournaments/:id/availabilities", get(list_for_tournament).post(declare))
        .route("/users/:id/availabilities", get(list_for_user))
        .route("/availabilities/:id", delete(withdraw))
}
