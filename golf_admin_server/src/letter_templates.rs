use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::{get, post}};
use golf_admin_entities::domain::letter_template::{resolve_template, TemplateScope, TemplateType};
use golf_admin_entities::domain::letterhead::resolve_letterhead;
use golf_admin_entities::domain::template::{unknown_variables, RenderedMessage, TemplateVariable};
use golf_admin_entities::schema::{letter_template, tournament_category, zone};
use itertools::Itertools;
use sea_orm::prelude::*;
use sea_orm::{ActiveModelTrait, ActiveValue, ConnectionTrait, DatabaseConnection, IntoActiveModel, Order, Select, TransactionTrait};
use sea_orm::sea_query::Expr;
use serde::{Serialize, Deserialize};
use tracing::info;
use validator::Validate;

use crate::actions::{self, ActiveColumns, ToggleResponse};
use crate::config::Config;
use crate::dispatch::{self, sample_context, TournamentLetterData};
use crate::pagination::{fetch_page, ListParams, Paginated};
use crate::response::{validate_request, APIError, ActionResponse};
use crate::state::AppState;


#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TemplateRequest {
    #[validate(length(min = 1, max = 255, message = "The name is required and must not exceed 255 characters"))]
    pub name: String,
    pub template_type: TemplateType,
    #[validate(length(min = 1, max = 255, message = "The subject is required and must not exceed 255 characters"))]
    pub subject: String,
    #[validate(length(min = 1, message = "The body is required"))]
    pub body: String,
    pub zone_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateFilter {
    pub template_type: Option<TemplateType>,
    pub zone_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateResponse {
    #[serde(flatten)]
    pub template: letter_template::Model,
    pub zone_name: Option<String>,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub tournament_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    pub placeholder: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveQuery {
    pub template_type: TemplateType,
    pub zone_id: Uuid,
    pub category_id: Uuid,
}

const COLUMNS: ActiveColumns<letter_template::Entity> = ActiveColumns {
    id: letter_template::Column::Uuid,
    is_active: letter_template::Column::IsActive,
    updated_at: letter_template::Column::UpdatedAt,
};

fn filtered(params: &ListParams, filter: &TemplateFilter) -> Select<letter_template::Entity> {
    let mut select = letter_template::Entity::find();
    if let Some(condition) = params.search_condition(&[letter_template::Column::Name, letter_template::Column::Subject]) {
        select = select.filter(condition);
    }
    if let Some(template_type) = filter.template_type {
        select = select.filter(letter_template::Column::TemplateType.eq(template_type));
    }
    if let Some(zone_id) = filter.zone_id {
        select = select.filter(letter_template::Column::ZoneId.eq(zone_id));
    }
    if let Some(category_id) = filter.category_id {
        select = select.filter(letter_template::Column::CategoryId.eq(category_id));
    }
    if let Some(is_active) = filter.is_active {
        select = select.filter(letter_template::Column::IsActive.eq(is_active));
    }
    select
}

async fn to_responses(db: &DatabaseConnection, templates: Vec<letter_template::Model>) -> Result<Vec<TemplateResponse>, DbErr> {
    let zones: HashMap<Uuid, String> = zone::Entity::find()
        .filter(zone::Column::Uuid.is_in(templates.iter().filter_map(|t| t.zone_id).unique().collect::<Vec<_>>()))
        .all(db).await?
        .into_iter().map(|z| (z.uuid, z.name)).collect();
    let categories: HashMap<Uuid, String> = tournament_category::Entity::find()
        .filter(tournament_category::Column::Uuid.is_in(templates.iter().filter_map(|t| t.category_id).unique().collect::<Vec<_>>()))
        .all(db).await?
        .into_iter().map(|c| (c.uuid, c.name)).collect();

    Ok(templates.into_iter().map(|template| TemplateResponse {
        zone_name: template.zone_id.and_then(|id| zones.get(&id).cloned()),
        category_name: template.category_id.and_then(|id| categories.get(&id).cloned()),
        template,
    }).collect())
}

async fn single(db: &DatabaseConnection, template: letter_template::Model) -> Result<Json<TemplateResponse>, APIError> {
    to_responses(db, vec![template]).await?.pop().map(Json).ok_or_else(|| APIError::not_found("Template"))
}

async fn check_request(db: &DatabaseConnection, request: &TemplateRequest) -> Result<(), APIError> {
    let mut errors = validate_request(request);
    for (field, text) in [("subject", &request.subject), ("body", &request.body)] {
        let unknown = unknown_variables(text);
        if !unknown.is_empty() {
            errors.add(field, format!("Unknown variables: {}", unknown.iter().join(", ")));
        }
    }
    if let Some(zone_id) = request.zone_id {
        if zone::Entity::find_by_id(zone_id).one(db).await?.is_none() {
            errors.add("zone_id", "The selected zone does not exist");
        }
    }
    if let Some(category_id) = request.category_id {
        if tournament_category::Entity::find_by_id(category_id).one(db).await?.is_none() {
            errors.add("category_id", "The selected category does not exist");
        }
    }
    errors.into_result()?;
    Ok(())
}

/// Clears `is_default` on every other template sharing the scope.
async fn clear_other_defaults<C>(db: &C, scope: TemplateScope, keep: Uuid) -> Result<u64, DbErr> where C: ConnectionTrait {
    let result = letter_template::Entity::update_many()
        .col_expr(letter_template::Column::IsDefault, Expr::value(false))
        .filter(scope.condition())
        .filter(letter_template::Column::Uuid.ne(keep))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

async fn list_templates(
    State(db): State<DatabaseConnection>,
    State(config): State<Arc<Config>>,
    Query(params): Query<ListParams>,
    Query(filter): Query<TemplateFilter>,
) -> Result<Json<Paginated<TemplateResponse>>, APIError> {
    let select = params.apply_sort(
        filtered(&params, &filter),
        &[("name", letter_template::Column::Name), ("template_type", letter_template::Column::TemplateType), ("updated_at", letter_template::Column::UpdatedAt), ("created_at", letter_template::Column::CreatedAt)],
        &[(letter_template::Column::TemplateType, Order::Asc), (letter_template::Column::Name, Order::Asc)],
    )?;
    let page = fetch_page(&db, select, &params, config.default_per_page).await?;
    let data = to_responses(&db, page.data).await?;
    Ok(Json(Paginated { data, meta: page.meta }))
}

async fn get_template(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<TemplateResponse>, APIError> {
    let template = letter_template::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Template"))?;
    single(&db, template).await
}

async fn create_template(State(db): State<DatabaseConnection>, Json(request): Json<TemplateRequest>) -> Result<Json<TemplateResponse>, APIError> {
    check_request(&db, &request).await?;

    let now = chrono::Utc::now().naive_utc();
    let transaction = db.begin().await?;
    let template = letter_template::Model {
        uuid: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        template_type: request.template_type,
        subject: request.subject,
        body: request.body,
        zone_id: request.zone_id,
        category_id: request.category_id,
        is_active: request.is_active.unwrap_or(true),
        is_default: request.is_default,
        created_at: now,
        updated_at: now,
    }.into_active_model().insert(&transaction).await?;
    if template.is_default {
        clear_other_defaults(&transaction, TemplateScope::of(&template), template.uuid).await?;
    }
    transaction.commit().await?;
    info!(template = %template.uuid, template_type = ?template.template_type, "Created letter template");

    single(&db, template).await
}

async fn update_template(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>, Json(request): Json<TemplateRequest>) -> Result<Json<TemplateResponse>, APIError> {
    let existing = letter_template::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Template"))?;
    check_request(&db, &request).await?;

    let transaction = db.begin().await?;
    let mut template: letter_template::ActiveModel = existing.into();
    template.name = ActiveValue::Set(request.name.trim().to_string());
    template.template_type = ActiveValue::Set(request.template_type);
    template.subject = ActiveValue::Set(request.subject);
    template.body = ActiveValue::Set(request.body);
    template.zone_id = ActiveValue::Set(request.zone_id);
    template.category_id = ActiveValue::Set(request.category_id);
    if let Some(is_active) = request.is_active {
        template.is_active = ActiveValue::Set(is_active);
    }
    template.is_default = ActiveValue::Set(request.is_default);
    template.updated_at = ActiveValue::Set(chrono::Utc::now().naive_utc());
    let template = template.update(&transaction).await?;
    if template.is_default {
        clear_other_defaults(&transaction, TemplateScope::of(&template), template.uuid).await?;
    }
    transaction.commit().await?;

    single(&db, template).await
}

async fn delete_template(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let template = letter_template::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Template"))?;
    letter_template::Entity::delete_by_id(id).exec(&db).await?;
    info!(template = %id, "Deleted letter template");
    Ok(ActionResponse::ok(format!("Template {} deleted", template.name)))
}

async fn toggle_template(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ToggleResponse>, APIError> {
    Ok(Json(actions::toggle_active(&db, &COLUMNS, id, "Template").await?))
}

async fn set_default(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let template = letter_template::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Template"))?;
    let scope = TemplateScope::of(&template);
    let name = template.name.clone();

    let transaction = db.begin().await?;
    let cleared = clear_other_defaults(&transaction, scope, id).await?;
    let mut template: letter_template::ActiveModel = template.into();
    template.is_default = ActiveValue::Set(true);
    template.updated_at = ActiveValue::Set(chrono::Utc::now().naive_utc());
    template.update(&transaction).await?;
    transaction.commit().await?;

    info!(template = %id, cleared, "Set default letter template");
    Ok(ActionResponse::ok(format!("Template {} is now the default", name)))
}

async fn duplicate_template(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<TemplateResponse>, APIError> {
    let original = letter_template::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Template"))?;
    let now = chrono::Utc::now().naive_utc();
    let copy = letter_template::Model {
        uuid: Uuid::new_v4(),
        name: format!("{} (copia)", original.name),
        is_default: false,
        created_at: now,
        updated_at: now,
        ..original
    }.into_active_model().insert(&db).await?;
    info!(template = %copy.uuid, source = %id, "Duplicated letter template");
    single(&db, copy).await
}

async fn preview_template(
    State(db): State<DatabaseConnection>,
    State(config): State<Arc<Config>>,
    Path(id): Path<Uuid>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<RenderedMessage>, APIError> {
    let template = letter_template::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Template"))?;
    let (context, zone_id) = match request.tournament_id {
        Some(tournament_id) => {
            let data = TournamentLetterData::load(&db, tournament_id, &config.federation_name).await?;
            (data.context, Some(data.zone.uuid))
        },
        None => (sample_context(&config.federation_name), template.zone_id),
    };
    let letterhead = resolve_letterhead(&db, zone_id).await?;
    Ok(Json(dispatch::compose(&template, letterhead.as_ref(), &context)))
}

async fn list_variables() -> Json<Vec<VariableInfo>> {
    Json(TemplateVariable::ALL.iter().map(|v| VariableInfo {
        name: v.key().to_string(),
        placeholder: format!("{{{{{}}}}}", v.key()),
        description: v.description().to_string(),
    }).collect())
}

async fn resolve(State(db): State<DatabaseConnection>, Query(query): Query<ResolveQuery>) -> Result<Json<TemplateResponse>, APIError> {
    let template = resolve_template(&db, query.template_type, query.zone_id, query.category_id).await?
        .ok_or_else(|| APIError::not_found("Template"))?;
    single(&db, template).await
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/letter-templates", get(list_templates).post(create_template))
        .route("/letter-templates/variables", get(list_variables))
        .route("/letter-templates/resolve", get(resolve))
        .route("/letter-templates/:id", get(get_template).put(update_template).delete(delete_template))
        .route("/letter-templates/:id/toggle-active", post(toggle_template))
        .route("/letter-templates/:id/set-default", post(set_default))
        .route("/letter-templates/:id/duplicate", post(duplicate_template))
        .route("/letter-templates/:id/preview", post(preview_template))
}
