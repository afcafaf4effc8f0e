use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Json, Router, routing::{get, post}};
use golf_admin_entities::domain::user::{RefereeLevel, UserType};
use golf_admin_entities::domain::validation::{normalize_code, normalize_optional};
use golf_admin_entities::queries;
use golf_admin_entities::schema::{user, zone};
use golf_admin_entities::FieldErrors;
use sea_orm::prelude::*;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, IntoActiveModel, Order, QueryOrder, Select, TransactionTrait};
use serde::{Serialize, Deserialize};
use tracing::info;
use validator::Validate;

use crate::actions::{self, enum_key, ActiveColumns, BulkAction, BulkActionRequest, ToggleResponse};
use crate::config::Config;
use crate::export::{yes_no, CsvExport};
use crate::pagination::{fetch_page, ListParams, Paginated};
use crate::response::{validate_request, APIError, ActionResponse};
use crate::state::AppState;


#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserRequest {
    #[validate(length(min = 1, max = 255, message = "The name is required and must not exceed 255 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub user_type: UserType,
    pub zone_id: Option<Uuid>,
    #[validate(length(max = 20, message = "The referee code must not exceed 20 characters"))]
    pub referee_code: Option<String>,
    pub referee_level: Option<RefereeLevel>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub photo_path: Option<String>,
    pub is_active: Option<bool>,
}

impl UserRequest {
    fn normalized(self) -> Self {
        let is_referee = self.user_type == UserType::Referee;
        UserRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            referee_code: if is_referee { normalize_optional(self.referee_code).map(|c| normalize_code(&c)) } else { None },
            referee_level: if is_referee { self.referee_level } else { None },
            phone: normalize_optional(self.phone),
            city: normalize_optional(self.city),
            photo_path: normalize_optional(self.photo_path),
            ..self
        }
    }

    fn role_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.user_type.requires_zone() && self.zone_id.is_none() {
            errors.add("zone_id", format!("A zone is required for {} users", self.user_type.label()));
        }
        if self.user_type == UserType::Referee && self.referee_level.is_none() {
            errors.add("referee_level", "A referee level is required for referees");
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilter {
    pub user_type: Option<UserType>,
    pub zone_id: Option<Uuid>,
    pub referee_level: Option<RefereeLevel>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: user::Model,
    pub zone_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatistics {
    pub total: u64,
    pub active: u64,
    pub by_type: BTreeMap<String, u64>,
    pub referees_by_level: BTreeMap<String, u64>,
}

const COLUMNS: ActiveColumns<user::Entity> = ActiveColumns {
    id: user::Column::Uuid,
    is_active: user::Column::IsActive,
    updated_at: user::Column::UpdatedAt,
};

fn filtered(params: &ListParams, filter: &UserFilter) -> Select<user::Entity> {
    let mut select = user::Entity::find();
    if let Some(condition) = params.search_condition(&[user::Column::Name, user::Column::Email, user::Column::RefereeCode]) {
        select = select.filter(condition);
    }
    if let Some(user_type) = filter.user_type {
        select = select.filter(user::Column::UserType.eq(user_type));
    }
    if let Some(zone_id) = filter.zone_id {
        select = select.filter(user::Column::ZoneId.eq(zone_id));
    }
    if let Some(level) = filter.referee_level {
        select = select.filter(user::Column::RefereeLevel.eq(level));
    }
    if let Some(is_active) = filter.is_active {
        select = select.filter(user::Column::IsActive.eq(is_active));
    }
    select
}

async fn to_responses(db: &DatabaseConnection, users: Vec<user::Model>) -> Result<Vec<UserResponse>, DbErr> {
    let zone_ids = users.iter().filter_map(|u| u.zone_id).collect::<Vec<_>>();
    let zones: HashMap<Uuid, String> = zone::Entity::find()
        .filter(zone::Column::Uuid.is_in(zone_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|z| (z.uuid, z.name))
        .collect();

    Ok(users.into_iter().map(|user| UserResponse {
        zone_name: user.zone_id.and_then(|z| zones.get(&z).cloned()),
        user,
    }).collect())
}

async fn list_users(
    State(db): State<DatabaseConnection>,
    State(config): State<Arc<Config>>,
    Query(params): Query<ListParams>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Paginated<UserResponse>>, APIError> {
    let select = params.apply_sort(
        filtered(&params, &filter),
        &[("name", user::Column::Name), ("email", user::Column::Email), ("user_type", user::Column::UserType), ("referee_level", user::Column::RefereeLevel), ("created_at", user::Column::CreatedAt)],
        &[(user::Column::Name, Order::Asc)],
    )?;
    let page = fetch_page(&db, select, &params, config.default_per_page).await?;
    let data = to_responses(&db, page.data).await?;
    Ok(Json(Paginated { data, meta: page.meta }))
}

async fn get_user(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<UserResponse>, APIError> {
    let user = user::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("User"))?;
    to_responses(&db, vec![user]).await?.pop().map(Json).ok_or_else(|| APIError::not_found("User"))
}

async fn check_request(db: &DatabaseConnection, request: &UserRequest, id: Option<Uuid>) -> Result<(), APIError> {
    let mut errors = validate_request(request);
    errors.merge(request.role_errors());
    if !errors.contains("email") && queries::is_taken::<user::Entity, _, _>(db, user::Column::Email, request.email.clone(), user::Column::Uuid, id).await? {
        errors.add("email", "This email address is already in use");
    }
    if let Some(code) = &request.referee_code {
        if queries::is_taken::<user::Entity, _, _>(db, user::Column::RefereeCode, code.clone(), user::Column::Uuid, id).await? {
            errors.add("referee_code", "This referee code is already in use");
        }
    }
    if let Some(zone_id) = request.zone_id {
        if zone::Entity::find_by_id(zone_id).one(db).await?.is_none() {
            errors.add("zone_id", "The selected zone does not exist");
        }
    }
    errors.into_result()?;
    Ok(())
}

async fn create_user(State(db): State<DatabaseConnection>, Json(request): Json<UserRequest>) -> Result<Json<UserResponse>, APIError> {
    let request = request.normalized();
    check_request(&db, &request, None).await?;

    let now = chrono::Utc::now().naive_utc();
    let user = user::Model {
        uuid: Uuid::new_v4(),
        name: request.name,
        email: request.email,
        user_type: request.user_type,
        zone_id: request.zone_id,
        referee_code: request.referee_code,
        referee_level: request.referee_level,
        phone: request.phone,
        city: request.city,
        photo_path: request.photo_path,
        is_active: request.is_active.unwrap_or(true),
        last_login_at: None,
        created_at: now,
        updated_at: now,
    }.into_active_model().insert(&db).await?;
    info!(user = %user.uuid, user_type = ?user.user_type, "Created user");

    to_responses(&db, vec![user]).await?.pop().map(Json).ok_or_else(|| APIError::not_found("User"))
}

async fn update_user(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>, Json(request): Json<UserRequest>) -> Result<Json<UserResponse>, APIError> {
    let existing = user::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("User"))?;
    let request = request.normalized();
    check_request(&db, &request, Some(id)).await?;

    let mut user: user::ActiveModel = existing.into();
    user.name = ActiveValue::Set(request.name);
    user.email = ActiveValue::Set(request.email);
    user.user_type = ActiveValue::Set(request.user_type);
    user.zone_id = ActiveValue::Set(request.zone_id);
    user.referee_code = ActiveValue::Set(request.referee_code);
    user.referee_level = ActiveValue::Set(request.referee_level);
    user.phone = ActiveValue::Set(request.phone);
    user.city = ActiveValue::Set(request.city);
    user.photo_path = ActiveValue::Set(request.photo_path);
    if let Some(is_active) = request.is_active {
        user.is_active = ActiveValue::Set(is_active);
    }
    user.updated_at = ActiveValue::Set(chrono::Utc::now().naive_utc());
    let user = user.update(&db).await?;

    to_responses(&db, vec![user]).await?.pop().map(Json).ok_or_else(|| APIError::not_found("User"))
}

async fn delete_user(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let user = user::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("User"))?;
    let dependents = queries::user_dependents(&db, &[id]).await?.remove(&id).unwrap_or_default();
    if dependents.any() {
        return Err(APIError::conflict(format!(
            "Cannot delete user: it has {} assignments and {} availabilities, deactivate it instead",
            dependents.assignments, dependents.availabilities
        )));
    }
    user::Entity::delete_by_id(id).exec(&db).await?;
    info!(user = %id, "Deleted user");
    Ok(ActionResponse::ok(format!("User {} deleted", user.name)))
}

async fn toggle_user(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ToggleResponse>, APIError> {
    Ok(Json(actions::toggle_active(&db, &COLUMNS, id, "User").await?))
}

async fn bulk_users(State(db): State<DatabaseConnection>, Json(request): Json<BulkActionRequest>) -> Result<Json<ActionResponse>, APIError> {
    request.check()?;
    let transaction = db.begin().await?;
    let affected = match request.action {
        BulkAction::Delete => {
            let dependents = queries::user_dependents(&transaction, &request.ids).await?;
            let users = user::Entity::find().filter(user::Column::Uuid.is_in(request.ids.clone())).all(&transaction).await?;
            let blocked = users.iter()
                .filter(|u| dependents.get(&u.uuid).map(|d| d.any()).unwrap_or(false))
                .map(|u| u.name.clone())
                .collect::<Vec<_>>();
            actions::ensure_deletable("users", blocked)?;
            actions::delete_many::<user::Entity, _>(&transaction, user::Column::Uuid, &request.ids).await?
        },
        action => actions::set_active_many(&transaction, &COLUMNS, &request.ids, action == BulkAction::Activate).await?,
    };
    transaction.commit().await?;
    Ok(ActionResponse::ok(request.message(affected)))
}

async fn export_users(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListParams>,
    Query(filter): Query<UserFilter>,
) -> Result<Response, APIError> {
    let users = filtered(&params, &filter).order_by_asc(user::Column::Name).all(&db).await?;
    let users = to_responses(&db, users).await?;

    let mut export = CsvExport::new("users", &["ID", "Name", "Email", "Type", "Zone", "Referee Code", "Level", "Active"])?;
    for u in users {
        export.row([
            u.user.uuid.to_string(),
            u.user.name,
            u.user.email,
            u.user.user_type.label().to_string(),
            u.zone_name.unwrap_or_default(),
            u.user.referee_code.unwrap_or_default(),
            u.user.referee_level.map(|l| l.label().to_string()).unwrap_or_default(),
            yes_no(u.user.is_active).to_string(),
        ])?;
    }
    export.finish()
}

async fn user_statistics(State(db): State<DatabaseConnection>) -> Result<Json<UserStatistics>, APIError> {
    let users = user::Entity::find().all(&db).await?;
    let mut by_type = BTreeMap::new();
    let mut referees_by_level = BTreeMap::new();
    for u in users.iter() {
        *by_type.entry(enum_key(&u.user_type)).or_insert(0) += 1;
        if let (UserType::Referee, Some(level)) = (u.user_type, u.referee_level) {
            *referees_by_level.entry(enum_key(&level)).or_insert(0) += 1;
        }
    }

    Ok(Json(UserStatistics {
        total: users.len() as u64,
        active: users.iter().filter(|u| u.is_active).count() as u64,
        by_type,
        referees_by_level,
    }))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/export", get(export_users))
        .route("/users/statistics", get(user_statistics))
        .route("/users/bulk", post(bulk_users))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/users/:id/toggle-active", post(toggle_user))
}
