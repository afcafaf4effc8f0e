use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Json, Router, routing::{get, post}};
use golf_admin_entities::domain::category::{CategorySettings, ZoneVisibility};
use golf_admin_entities::domain::validation::{normalize_code, normalize_optional};
use golf_admin_entities::queries;
use golf_admin_entities::schema::{tournament_category, zone};
use sea_orm::prelude::*;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, IntoActiveModel, Order, PaginatorTrait, QueryOrder, Select, TransactionTrait};
use sea_orm::sea_query::Expr;
use serde::{Serialize, Deserialize};
use tracing::info;
use validator::Validate;

use crate::actions::{self, ActiveColumns, BulkAction, BulkActionRequest, ReorderItem, ToggleResponse};
use crate::config::Config;
use crate::export::{yes_no, CsvExport};
use crate::pagination::{fetch_page, ListParams, Paginated};
use crate::response::{validate_request, APIError, ActionResponse};
use crate::state::AppState;


#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 255, message = "The name is required and must not exceed 255 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "The code is required and must not exceed 20 characters"))]
    pub code: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_national: bool,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub settings: CategorySettings,
}

impl CategoryRequest {
    fn normalized(self) -> Self {
        CategoryRequest {
            name: self.name.trim().to_string(),
            code: normalize_code(&self.code),
            description: normalize_optional(self.description),
            ..self
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub is_national: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    #[serde(flatten)]
    pub category: tournament_category::Model,
    pub tournaments_count: u64,
}

const COLUMNS: ActiveColumns<tournament_category::Entity> = ActiveColumns {
    id: tournament_category::Column::Uuid,
    is_active: tournament_category::Column::IsActive,
    updated_at: tournament_category::Column::UpdatedAt,
};

fn filtered(params: &ListParams, filter: &CategoryFilter) -> Select<tournament_category::Entity> {
    let mut select = tournament_category::Entity::find();
    if let Some(condition) = params.search_condition(&[tournament_category::Column::Name, tournament_category::Column::Code, tournament_category::Column::Description]) {
        select = select.filter(condition);
    }
    if let Some(is_national) = filter.is_national {
        select = select.filter(tournament_category::Column::IsNational.eq(is_national));
    }
    if let Some(is_active) = filter.is_active {
        select = select.filter(tournament_category::Column::IsActive.eq(is_active));
    }
    select
}

async fn with_counts(db: &DatabaseConnection, categories: Vec<tournament_category::Model>) -> Result<Vec<CategoryResponse>, DbErr> {
    let ids = categories.iter().map(|c| c.uuid).collect::<Vec<_>>();
    let tournaments = queries::tournaments_by_category(db, &ids).await?;
    Ok(categories.into_iter().map(|category| CategoryResponse {
        tournaments_count: tournaments.get(&category.uuid).copied().unwrap_or(0),
        category,
    }).collect())
}

fn single(mut responses: Vec<CategoryResponse>) -> Result<Json<CategoryResponse>, APIError> {
    responses.pop().map(Json).ok_or_else(|| APIError::not_found("Category"))
}

async fn list_categories(
    State(db): State<DatabaseConnection>,
    State(config): State<Arc<Config>>,
    Query(params): Query<ListParams>,
    Query(filter): Query<CategoryFilter>,
) -> Result<Json<Paginated<CategoryResponse>>, APIError> {
    let select = params.apply_sort(
        filtered(&params, &filter),
        &[("name", tournament_category::Column::Name), ("code", tournament_category::Column::Code), ("sort_order", tournament_category::Column::SortOrder), ("created_at", tournament_category::Column::CreatedAt)],
        &[(tournament_category::Column::SortOrder, Order::Asc), (tournament_category::Column::Name, Order::Asc)],
    )?;
    let page = fetch_page(&db, select, &params, config.default_per_page).await?;
    let data = with_counts(&db, page.data).await?;
    Ok(Json(Paginated { data, meta: page.meta }))
}

async fn get_category(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<CategoryResponse>, APIError> {
    let category = tournament_category::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Category"))?;
    single(with_counts(&db, vec![category]).await?)
}

async fn check_request(db: &DatabaseConnection, request: &CategoryRequest, id: Option<Uuid>) -> Result<(), APIError> {
    let mut errors = validate_request(request);
    errors.merge(request.settings.validate());
    if !errors.contains("code") && queries::is_taken::<tournament_category::Entity, _, _>(db, tournament_category::Column::Code, request.code.clone(), tournament_category::Column::Uuid, id).await? {
        errors.add("code", "This code is already in use");
    }
    if let ZoneVisibility::Only(zones) = &request.settings.visibility_zones {
        let known = zone::Entity::find().filter(zone::Column::Uuid.is_in(zones.clone())).count(db).await?;
        if known != zones.len() as u64 {
            errors.add("settings.visibility_zones", "One of the selected zones does not exist");
        }
    }
    errors.into_result()?;
    Ok(())
}

async fn create_category(State(db): State<DatabaseConnection>, Json(request): Json<CategoryRequest>) -> Result<Json<CategoryResponse>, APIError> {
    let request = request.normalized();
    check_request(&db, &request, None).await?;

    let now = chrono::Utc::now().naive_utc();
    let category = tournament_category::Model {
        uuid: Uuid::new_v4(),
        name: request.name,
        code: request.code,
        description: request.description,
        is_national: request.is_national,
        sort_order: request.sort_order.unwrap_or(0),
        is_active: request.is_active.unwrap_or(true),
        settings: request.settings,
        created_at: now,
        updated_at: now,
    }.into_active_model().insert(&db).await?;
    info!(category = %category.uuid, code = %category.code, "Created tournament category");

    single(with_counts(&db, vec![category]).await?)
}

async fn update_category(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>, Json(request): Json<CategoryRequest>) -> Result<Json<CategoryResponse>, APIError> {
    let existing = tournament_category::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Category"))?;
    let request = request.normalized();
    check_request(&db, &request, Some(id)).await?;

    let mut category: tournament_category::ActiveModel = existing.into();
    category.name = ActiveValue::Set(request.name);
    category.code = ActiveValue::Set(request.code);
    category.description = ActiveValue::Set(request.description);
    category.is_national = ActiveValue::Set(request.is_national);
    category.settings = ActiveValue::Set(request.settings);
    if let Some(sort_order) = request.sort_order {
        category.sort_order = ActiveValue::Set(sort_order);
    }
    if let Some(is_active) = request.is_active {
        category.is_active = ActiveValue::Set(is_active);
    }
    category.updated_at = ActiveValue::Set(chrono::Utc::now().naive_utc());
    let category = category.update(&db).await?;

    single(with_counts(&db, vec![category]).await?)
}

async fn delete_category(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let category = tournament_category::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Category"))?;
    let tournaments = queries::tournaments_by_category(&db, &[id]).await?.get(&id).copied().unwrap_or(0);
    if tournaments > 0 {
        return Err(APIError::conflict(format!("Cannot delete category: it is used by {} tournaments", tournaments)));
    }
    tournament_category::Entity::delete_by_id(id).exec(&db).await?;
    info!(category = %id, "Deleted tournament category");
    Ok(ActionResponse::ok(format!("Category {} deleted", category.name)))
}

async fn toggle_category(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ToggleResponse>, APIError> {
    Ok(Json(actions::toggle_active(&db, &COLUMNS, id, "Category").await?))
}

async fn reorder_categories(State(db): State<DatabaseConnection>, Json(items): Json<Vec<ReorderItem>>) -> Result<Json<ActionResponse>, APIError> {
    if items.is_empty() {
        return Err(APIError::invalid_field("items", "Nothing to reorder"));
    }
    let transaction = db.begin().await?;
    let now = chrono::Utc::now().naive_utc();
    for item in items.iter() {
        let result = tournament_category::Entity::update_many()
            .col_expr(tournament_category::Column::SortOrder, Expr::value(item.sort_order))
            .col_expr(tournament_category::Column::UpdatedAt, Expr::value(now))
            .filter(tournament_category::Column::Uuid.eq(item.id))
            .exec(&transaction)
            .await?;
        if result.rows_affected == 0 {
            return Err(APIError::not_found(&format!("Category {}", item.id)));
        }
    }
    transaction.commit().await?;
    Ok(ActionResponse::ok(format!("{} categories reordered", items.len())))
}

const MAX_CODE_LENGTH: usize = 20;

/// `CODE_COPY` for the first copy, `CODE_COPY<n>` after that. The original
/// code is shortened so the result stays within `MAX_CODE_LENGTH`.
fn copy_code(code: &str, attempt: u32) -> String {
    let suffix = if attempt <= 1 { "_COPY".to_string() } else { format!("_COPY{}", attempt) };
    let keep = MAX_CODE_LENGTH.saturating_sub(suffix.chars().count());
    format!("{}{}", code.chars().take(keep).collect::<String>(), suffix)
}

async fn duplicate_category(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<CategoryResponse>, APIError> {
    let original = tournament_category::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Category"))?;

    let mut attempt = 1;
    let mut code = copy_code(&original.code, attempt);
    while queries::is_taken::<tournament_category::Entity, _, _>(&db, tournament_category::Column::Code, code.clone(), tournament_category::Column::Uuid, None).await? {
        attempt += 1;
        code = copy_code(&original.code, attempt);
    }

    let now = chrono::Utc::now().naive_utc();
    let copy = tournament_category::Model {
        uuid: Uuid::new_v4(),
        name: format!("{} (copia)", original.name),
        code,
        is_active: false,
        created_at: now,
        updated_at: now,
        ..original
    }.into_active_model().insert(&db).await?;
    info!(category = %copy.uuid, source = %id, "Duplicated tournament category");

    single(with_counts(&db, vec![copy]).await?)
}

async fn bulk_categories(State(db): State<DatabaseConnection>, Json(request): Json<BulkActionRequest>) -> Result<Json<ActionResponse>, APIError> {
    request.check()?;
    let transaction = db.begin().await?;
    let affected = match request.action {
        BulkAction::Delete => {
            let tournaments = queries::tournaments_by_category(&transaction, &request.ids).await?;
            let blocked = tournament_category::Entity::find()
                .filter(tournament_category::Column::Uuid.is_in(tournaments.keys().cloned()))
                .all(&transaction)
                .await?
                .into_iter()
                .map(|c| c.name)
                .collect::<Vec<_>>();
            actions::ensure_deletable("categories", blocked)?;
            actions::delete_many::<tournament_category::Entity, _>(&transaction, tournament_category::Column::Uuid, &request.ids).await?
        },
        action => actions::set_active_many(&transaction, &COLUMNS, &request.ids, action == BulkAction::Activate).await?,
    };
    transaction.commit().await?;
    Ok(ActionResponse::ok(request.message(affected)))
}

async fn export_categories(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListParams>,
    Query(filter): Query<CategoryFilter>,
) -> Result<Response, APIError> {
    let categories = filtered(&params, &filter)
        .order_by_asc(tournament_category::Column::SortOrder)
        .order_by_asc(tournament_category::Column::Name)
        .all(&db)
        .await?;
    let categories = with_counts(&db, categories).await?;

    let mut export = CsvExport::new("tournament_categories", &["ID", "Name", "Code", "National", "Required Level", "Min Referees", "Max Referees", "Active", "Tournaments"])?;
    for c in categories {
        let settings = &c.category.settings;
        export.row([
            c.category.uuid.to_string(),
            c.category.name.clone(),
            c.category.code.clone(),
            yes_no(c.category.is_national).to_string(),
            settings.required_referee_level.label().to_string(),
            settings.min_referees.to_string(),
            settings.max_referees.to_string(),
            yes_no(c.category.is_active).to_string(),
            c.tournaments_count.to_string(),
        ])?;
    }
    export.finish()
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/export", get(export_categories))
        .route("/categories/bulk", post(bulk_categories))
        .route("/categories/reorder", post(reorder_categories))
        .route("/categories/:id", get(get_category).put(update_category).delete(delete_category))
        .route("/categories/:id/toggle-active", post(toggle_category))
        .route("/categories/:id/duplicate", post(duplicate_category))
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_copy_code_fits_code_length() {
        assert_eq!(copy_code("GZ", 1), "GZ_COPY");
        assert_eq!(copy_code("GZ", 3), "GZ_COPY3");
        assert_eq!(copy_code("ABCDEFGHIJKLMNOPQRST", 1), "ABCDEFGHIJKLMNO_COPY");
        assert_eq!(copy_code("ABCDEFGHIJKLMNOPQRST", 12).chars().count(), MAX_CODE_LENGTH);
    }
}
