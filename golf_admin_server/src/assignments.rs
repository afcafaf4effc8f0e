use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::{Json, Router, routing::{get, post, delete}};
use golf_admin_entities::domain::assignment::{AssignmentRequirements, AssignmentRole};
use golf_admin_entities::domain::validation::normalize_optional;
use golf_admin_entities::schema::{assignment, tournament, tournament_category, user};
use sea_orm::prelude::*;
use sea_orm::{ActiveModelTrait, ActiveValue, ConnectionTrait, DatabaseConnection, IntoActiveModel, QueryOrder};
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::response::{APIError, ActionResponse};
use crate::state::AppState;


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: AssignmentRole,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentView {
    #[serde(flatten)]
    pub assignment: assignment::Model,
    pub referee_name: String,
    pub referee_email: String,
    pub referee_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAssignmentView {
    #[serde(flatten)]
    pub assignment: assignment::Model,
    pub tournament_name: String,
    pub start_date: Date,
    pub end_date: Date,
}

/// Assignments of a tournament with their referees, directors first, then
/// referees, then observers, each group by name.
pub async fn load_for_tournament<C>(db: &C, tournament_id: Uuid) -> Result<Vec<(assignment::Model, user::Model)>, DbErr> where C: ConnectionTrait {
    let rows = assignment::Entity::find()
        .filter(assignment::Column::TournamentId.eq(tournament_id))
        .find_also_related(user::Entity)
        .all(db)
        .await?;
    let mut rows = rows.into_iter()
        .filter_map(|(a, u)| u.map(|u| (a, u)))
        .collect::<Vec<_>>();
    rows.sort_by(|(a1, u1), (a2, u2)| {
        a1.role.sort_key().cmp(&a2.role.sort_key()).then_with(|| u1.name.cmp(&u2.name))
    });
    Ok(rows)
}

pub async fn views_for_tournament<C>(db: &C, tournament_id: Uuid) -> Result<Vec<AssignmentView>, DbErr> where C: ConnectionTrait {
    Ok(load_for_tournament(db, tournament_id).await?.into_iter().map(|(assignment, user)| AssignmentView {
        assignment,
        referee_level: user.referee_level.map(|l| l.label().to_string()),
        referee_name: user.name,
        referee_email: user.email,
    }).collect())
}

pub async fn requirements_for<C>(db: &C, tournament: &tournament::Model) -> Result<AssignmentRequirements, APIError> where C: ConnectionTrait {
    let category = tournament_category::Entity::find_by_id(tournament.category_id).one(db).await?.ok_or_else(|| APIError::not_found("Category"))?;
    let roles = assignment::Entity::find()
        .filter(assignment::Column::TournamentId.eq(tournament.uuid))
        .all(db)
        .await?
        .into_iter()
        .map(|a| a.role)
        .collect::<Vec<_>>();
    Ok(AssignmentRequirements::evaluate(&roles, &category.settings))
}

async fn assign(State(db): State<DatabaseConnection>, Path(tournament_id): Path<Uuid>, Json(request): Json<AssignRequest>) -> Result<Json<AssignmentView>, APIError> {
    let tournament = tournament::Entity::find_by_id(tournament_id).one(&db).await?.ok_or_else(|| APIError::not_found("Tournament"))?;
    let category = tournament_category::Entity::find_by_id(tournament.category_id).one(&db).await?.ok_or_else(|| APIError::not_found("Category"))?;
    let referee = user::Entity::find_by_id(request.user_id).one(&db).await?
        .filter(|u| u.is_active_referee())
        .ok_or_else(|| APIError::invalid_field("user_id", "The selected user is not an active referee"))?;

    if !category.accepts_referee_level(referee.referee_level) {
        return Err(APIError::invalid_field(
            "user_id",
            format!("The referee level does not meet the category requirement ({})", category.settings.required_referee_level.label())
        ));
    }

    let existing = assignment::Entity::find()
        .filter(assignment::Column::TournamentId.eq(tournament_id))
        .all(&db)
        .await?;
    if existing.iter().any(|a| a.user_id == referee.uuid) {
        return Err(APIError::conflict(format!("{} is already assigned to this tournament", referee.name)));
    }
    if request.role.counts_towards_limit() {
        let counted = existing.iter().filter(|a| a.role.counts_towards_limit()).count() as u32;
        if counted >= category.settings.max_referees {
            return Err(APIError::conflict(format!("The tournament already has the maximum of {} referees", category.settings.max_referees)));
        }
    }

    let assignment = assignment::Model {
        uuid: Uuid::new_v4(),
        tournament_id,
        user_id: referee.uuid,
        role: request.role,
        is_confirmed: false,
        notes: normalize_optional(request.notes),
        assigned_at: chrono::Utc::now().naive_utc(),
    }.into_active_model().insert(&db).await?;
    info!(tournament = %tournament_id, referee = %referee.uuid, role = ?assignment.role, "Assigned referee");

    Ok(Json(AssignmentView {
        assignment,
        referee_level: referee.referee_level.map(|l| l.label().to_string()),
        referee_name: referee.name,
        referee_email: referee.email,
    }))
}

async fn unassign(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let result = assignment::Entity::delete_by_id(id).exec(&db).await?;
    if result.rows_affected == 0 {
        return Err(APIError::not_found("Assignment"));
    }
    info!(assignment = %id, "Removed assignment");
    Ok(ActionResponse::ok("Assignment removed"))
}

async fn confirm(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let existing = assignment::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Assignment"))?;
    let mut assignment: assignment::ActiveModel = existing.into();
    assignment.is_confirmed = ActiveValue::Set(true);
    assignment.update(&db).await?;
    Ok(ActionResponse::ok("Assignment confirmed"))
}

async fn list_for_tournament(State(db): State<DatabaseConnection>, Path(tournament_id): Path<Uuid>) -> Result<Json<Vec<AssignmentView>>, APIError> {
    tournament::Entity::find_by_id(tournament_id).one(&db).await?.ok_or_else(|| APIError::not_found("Tournament"))?;
    Ok(Json(views_for_tournament(&db, tournament_id).await?))
}

async fn list_for_user(State(db): State<DatabaseConnection>, Path(user_id): Path<Uuid>) -> Result<Json<Vec<UserAssignmentView>>, APIError> {
    user::Entity::find_by_id(user_id).one(&db).await?.ok_or_else(|| APIError::not_found("User"))?;
    let assignments = assignment::Entity::find()
        .filter(assignment::Column::UserId.eq(user_id))
        .order_by_desc(assignment::Column::AssignedAt)
        .all(&db)
        .await?;
    let tournaments: HashMap<Uuid, tournament::Model> = tournament::Entity::find()
        .filter(tournament::Column::Uuid.is_in(assignments.iter().map(|a| a.tournament_id).collect::<Vec<_>>()))
        .all(&db)
        .await?
        .into_iter()
        .map(|t| (t.uuid, t))
        .collect();

    let mut views = assignments.into_iter().filter_map(|assignment| {
        tournaments.get(&assignment.tournament_id).map(|t| UserAssignmentView {
            tournament_name: t.name.clone(),
            start_date: t.start_date,
            end_date: t.end_date,
            assignment,
        })
    }).collect::<Vec<_>>();
    views.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    Ok(Json(views))
}

async fn check_requirements(State(db): State<DatabaseConnection>, Path(tournament_id): Path<Uuid>) -> Result<Json<AssignmentRequirements>, APIError> {
    let tournament = tournament::Entity::find_by_id(tournament_id).one(&db).await?.ok_or_else(|| APIError::not_found("Tournament"))?;
    Ok(Json(requirements_for(&db, &tournament).await?))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/tournaments/:id/assignments", get(list_for_tournament).post(assign))
        .route("/tournaments/:id/requirements", get(check_requirements))
        .route("/users/:id/assignments", get(list_for_user))
        .route("/assignments/:id", delete(unassign))
        .route("/assignments/:id/confirm", post(confirm))
}
