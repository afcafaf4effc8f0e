use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::{get, post}};
use golf_admin_entities::domain::letterhead::{resolve_letterhead, LetterheadContact};
use golf_admin_entities::domain::template::unknown_variables;
use golf_admin_entities::domain::validation::normalize_optional;
use golf_admin_entities::schema::{letterhead, zone};
use itertools::Itertools;
use sea_orm::prelude::*;
use sea_orm::{ActiveModelTrait, ActiveValue, Condition, ConnectionTrait, DatabaseConnection, IntoActiveModel, Order, Select, TransactionTrait};
use sea_orm::sea_query::Expr;
use serde::{Serialize, Deserialize};
use tracing::info;
use validator::{Validate, ValidateEmail};

use crate::actions::{self, ActiveColumns, ToggleResponse};
use crate::config::Config;
use crate::pagination::{fetch_page, ListParams, Paginated};
use crate::response::{validate_request, APIError, ActionResponse};
use crate::state::AppState;


#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LetterheadRequest {
    #[validate(length(min = 1, max = 255, message = "The title is required and must not exceed 255 characters"))]
    pub title: String,
    pub zone_id: Option<Uuid>,
    pub header_text: Option<String>,
    pub footer_text: Option<String>,
    #[serde(default)]
    pub contact: LetterheadContact,
    pub logo_path: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_default: bool,
}

impl LetterheadRequest {
    fn normalized(self) -> Self {
        LetterheadRequest {
            title: self.title.trim().to_string(),
            header_text: normalize_optional(self.header_text),
            footer_text: normalize_optional(self.footer_text),
            contact: LetterheadContact {
                address: normalize_optional(self.contact.address),
                phone: normalize_optional(self.contact.phone),
                email: normalize_optional(self.contact.email),
                website: normalize_optional(self.contact.website),
            },
            logo_path: normalize_optional(self.logo_path),
            ..self
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LetterheadFilter {
    pub zone_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveQuery {
    pub zone_id: Option<Uuid>,
}

const COLUMNS: ActiveColumns<letterhead::Entity> = ActiveColumns {
    id: letterhead::Column::Uuid,
    is_active: letterhead::Column::IsActive,
    updated_at: letterhead::Column::UpdatedAt,
};

fn filtered(params: &ListParams, filter: &LetterheadFilter) -> Select<letterhead::Entity> {
    let mut select = letterhead::Entity::find();
    if let Some(condition) = params.search_condition(&[letterhead::Column::Title, letterhead::Column::HeaderText, letterhead::Column::FooterText]) {
        select = select.filter(condition);
    }
    if let Some(zone_id) = filter.zone_id {
        select = select.filter(letterhead::Column::ZoneId.eq(zone_id));
    }
    if let Some(is_active) = filter.is_active {
        select = select.filter(letterhead::Column::IsActive.eq(is_active));
    }
    select
}

async fn check_request(db: &DatabaseConnection, request: &LetterheadRequest) -> Result<(), APIError> {
    let mut errors = validate_request(request);
    for (field, text) in [("header_text", &request.header_text), ("footer_text", &request.footer_text)] {
        let unknown = text.as_deref().map(unknown_variables).unwrap_or_default();
        if !unknown.is_empty() {
            errors.add(field, format!("Unknown variables: {}", unknown.iter().join(", ")));
        }
    }
    if let Some(email) = &request.contact.email {
        if !email.validate_email() {
            errors.add("contact.email", "The contact email is not valid");
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

/// Clears `is_default` on the other letterheads of the same zone. A null
/// zone is the global scope.
async fn clear_other_defaults<C>(db: &C, zone_id: Option<Uuid>, keep: Uuid) -> Result<u64, DbErr> where C: ConnectionTrait {
    let scope = match zone_id {
        Some(zone_id) => letterhead::Column::ZoneId.eq(zone_id),
        None => letterhead::Column::ZoneId.is_null(),
    };
    let result = letterhead::Entity::update_many()
        .col_expr(letterhead::Column::IsDefault, Expr::value(false))
        .filter(Condition::all().add(scope).add(letterhead::Column::Uuid.ne(keep)))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

async fn list_letterheads(
    State(db): State<DatabaseConnection>,
    State(config): State<Arc<Config>>,
    Query(params): Query<ListParams>,
    Query(filter): Query<LetterheadFilter>,
) -> Result<Json<Paginated<letterhead::Model>>, APIError> {
    let select = params.apply_sort(
        filtered(&params, &filter),
        &[("title", letterhead::Column::Title), ("updated_at", letterhead::Column::UpdatedAt), ("created_at", letterhead::Column::CreatedAt)],
        &[(letterhead::Column::Title, Order::Asc)],
    )?;
    Ok(Json(fetch_page(&db, select, &params, config.default_per_page).await?))
}

async fn get_letterhead(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<letterhead::Model>, APIError> {
    letterhead::Entity::find_by_id(id).one(&db).await?.map(Json).ok_or_else(|| APIError::not_found("Letterhead"))
}

async fn create_letterhead(State(db): State<DatabaseConnection>, Json(request): Json<LetterheadRequest>) -> Result<Json<letterhead::Model>, APIError> {
    let request = request.normalized();
    check_request(&db, &request).await?;

    let now = chrono::Utc::now().naive_utc();
    let transaction = db.begin().await?;
    let letterhead = letterhead::Model {
        uuid: Uuid::new_v4(),
        title: request.title,
        zone_id: request.zone_id,
        header_text: request.header_text,
        footer_text: request.footer_text,
        contact: request.contact,
        logo_path: request.logo_path,
        is_active: request.is_active.unwrap_or(true),
        is_default: request.is_default,
        created_at: now,
        updated_at: now,
    }.into_active_model().insert(&transaction).await?;
    if letterhead.is_default {
        clear_other_defaults(&transaction, letterhead.zone_id, letterhead.uuid).await?;
    }
    transaction.commit().await?;
    info!(letterhead = %letterhead.uuid, "Created letterhead");

    Ok(Json(letterhead))
}

async fn update_letterhead(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>, Json(request): Json<LetterheadRequest>) -> Result<Json<letterhead::Model>, APIError> {
    let existing = letterhead::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Letterhead"))?;
    let request = request.normalized();
    check_request(&db, &request).await?;

    let transaction = db.begin().await?;
    let mut letterhead: letterhead::ActiveModel = existing.into();
    letterhead.title = ActiveValue::Set(request.title);
    letterhead.zone_id = ActiveValue::Set(request.zone_id);
    letterhead.header_text = ActiveValue::Set(request.header_text);
    letterhead.footer_text = ActiveValue::Set(request.footer_text);
    letterhead.contact = ActiveValue::Set(request.contact);
    letterhead.logo_path = ActiveValue::Set(request.logo_path);
    if let Some(is_active) = request.is_active {
        letterhead.is_active = ActiveValue::Set(is_active);
    }
    letterhead.is_default = ActiveValue::Set(request.is_default);
    letterhead.updated_at = ActiveValue::Set(chrono::Utc::now().naive_utc());
    let letterhead = letterhead.update(&transaction).await?;
    if letterhead.is_default {
        clear_other_defaults(&transaction, letterhead.zone_id, letterhead.uuid).await?;
    }
    transaction.commit().await?;

    Ok(Json(letterhead))
}

async fn delete_letterhead(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let letterhead = letterhead::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Letterhead"))?;
    letterhead::Entity::delete_by_id(id).exec(&db).await?;
    info!(letterhead = %id, "Deleted letterhead");
    Ok(ActionResponse::ok(format!("Letterhead {} deleted", letterhead.title)))
}

async fn toggle_letterhead(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ToggleResponse>, APIError> {
    Ok(Json(actions::toggle_active(&db, &COLUMNS, id, "Letterhead").await?))
}

async fn set_default(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let letterhead = letterhead::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Letterhead"))?;
    let title = letterhead.title.clone();
    let zone_id = letterhead.zone_id;

    let transaction = db.begin().await?;
    clear_other_defaults(&transaction, zone_id, id).await?;
    let mut letterhead: letterhead::ActiveModel = letterhead.into();
    letterhead.is_default = ActiveValue::Set(true);
    letterhead.updated_at = ActiveValue::Set(chrono::Utc::now().naive_utc());
    letterhead.update(&transaction).await?;
    transaction.commit().await?;

    info!(letterhead = %id, zone = ?zone_id, "Set default letterhead");
    Ok(ActionResponse::ok(format!("Letterhead {} is now the default", title)))
}

async fn duplicate_letterhead(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<letterhead::Model>, APIError> {
    let original = letterhead::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Letterhead"))?;
    let now = chrono::Utc::now().naive_utc();
    let copy = letterhead::Model {
        uuid: Uuid::new_v4(),
        title: format!("{} (copia)", original.title),
        is_default: false,
        created_at: now,
        updated_at: now,
        ..original
    }.into_active_model().insert(&db).await?;
    info!(letterhead = %copy.uuid, source = %id, "Duplicated letterhead");
    Ok(Json(copy))
}

async fn resolve(State(db): State<DatabaseConnection>, Query(query): Query<ResolveQuery>) -> Result<Json<letterhead::Model>, APIError> {
    resolve_letterhead(&db, query.zone_id).await?.map(Json).ok_or_else(|| APIError::not_found("Letterhead"))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/letterheads", get(list_letterheads).post(create_letterhead))
        .route("/letterheads/resolve", get(resolve))
        .route("/letterheads/:id", get(get_letterhead).put(update_letterhead).delete(delete_letterhead))
        .route("/letterheads/:id/toggle-active", post(toggle_letterhead))
        .route("/letterheads/:id/set-default", post(set_default))
        .route("/letterheads/:id/duplicate", post(duplicate_letterhead))
}
