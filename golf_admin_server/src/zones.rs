use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Json, Router, routing::{get, post}};
use golf_admin_entities::domain::tournament::format_date;
use golf_admin_entities::domain::validation::{normalize_code, normalize_optional};
use golf_admin_entities::queries::{self, ZoneDependents};
use golf_admin_entities::schema::zone;
use sea_orm::prelude::*;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, IntoActiveModel, Order, PaginatorTrait, QueryOrder, Select, TransactionTrait};
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
pub struct ZoneRequest {
    #[validate(length(min = 1, max = 255, message = "The name is required and must not exceed 255 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "The code is required and must not exceed 20 characters"))]
    pub code: String,
    pub description: Option<String>,
    pub region: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

impl ZoneRequest {
    fn normalized(self) -> Self {
        ZoneRequest {
            name: self.name.trim().to_string(),
            code: normalize_code(&self.code),
            description: normalize_optional(self.description),
            region: normalize_optional(self.region),
            email: normalize_optional(self.email),
            ..self
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneFilter {
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneResponse {
    #[serde(flatten)]
    pub zone: zone::Model,
    pub users_count: u64,
    pub clubs_count: u64,
    pub tournaments_count: u64,
}

impl ZoneResponse {
    fn new(zone: zone::Model, dependents: ZoneDependents) -> Self {
        ZoneResponse {
            zone,
            users_count: dependents.users,
            clubs_count: dependents.clubs,
            tournaments_count: dependents.tournaments,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneStatistics {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub with_users: u64,
    pub without_users: u64,
}

const COLUMNS: ActiveColumns<zone::Entity> = ActiveColumns {
    id: zone::Column::Uuid,
    is_active: zone::Column::IsActive,
    updated_at: zone::Column::UpdatedAt,
};

fn filtered(params: &ListParams, filter: &ZoneFilter) -> Select<zone::Entity> {
    let mut select = zone::Entity::find();
    if let Some(condition) = params.search_condition(&[zone::Column::Name, zone::Column::Code, zone::Column::Region]) {
        select = select.filter(condition);
    }
    if let Some(is_active) = filter.is_active {
        select = select.filter(zone::Column::IsActive.eq(is_active));
    }
    select
}

async fn with_counts(db: &DatabaseConnection, zones: Vec<zone::Model>) -> Result<Vec<ZoneResponse>, DbErr> {
    let ids = zones.iter().map(|z| z.uuid).collect::<Vec<_>>();
    let mut dependents = queries::zone_dependents(db, &ids).await?;
    Ok(zones.into_iter().map(|z| {
        let deps = dependents.remove(&z.uuid).unwrap_or_default();
        ZoneResponse::new(z, deps)
    }).collect())
}

async fn list_zones(
    State(db): State<DatabaseConnection>,
    State(config): State<Arc<Config>>,
    Query(params): Query<ListParams>,
    Query(filter): Query<ZoneFilter>,
) -> Result<Json<Paginated<ZoneResponse>>, APIError> {
    let select = params.apply_sort(
        filtered(&params, &filter),
        &[("name", zone::Column::Name), ("code", zone::Column::Code), ("sort_order", zone::Column::SortOrder), ("created_at", zone::Column::CreatedAt)],
        &[(zone::Column::SortOrder, Order::Asc), (zone::Column::Name, Order::Asc)],
    )?;
    let page = fetch_page(&db, select, &params, config.default_per_page).await?;
    let data = with_counts(&db, page.data).await?;
    Ok(Json(Paginated { data, meta: page.meta }))
}

async fn get_zone(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ZoneResponse>, APIError> {
    let zone = zone::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Zone"))?;
    let mut response = with_counts(&db, vec![zone]).await?;
    response.pop().map(Json).ok_or_else(|| APIError::not_found("Zone"))
}

async fn check_request(db: &DatabaseConnection, request: &ZoneRequest, id: Option<Uuid>) -> Result<(), APIError> {
    let mut errors = validate_request(request);
    if !errors.contains("code") && queries::is_taken::<zone::Entity, _, _>(db, zone::Column::Code, request.code.clone(), zone::Column::Uuid, id).await? {
        errors.add("code", "This code is already in use");
    }
    errors.into_result()?;
    Ok(())
}

async fn create_zone(State(db): State<DatabaseConnection>, Json(request): Json<ZoneRequest>) -> Result<Json<ZoneResponse>, APIError> {
    let request = request.normalized();
    check_request(&db, &request, None).await?;

    let now = chrono::Utc::now().naive_utc();
    let zone = zone::Model {
        uuid: Uuid::new_v4(),
        name: request.name,
        code: request.code,
        description: request.description,
        region: request.region,
        email: request.email,
        is_active: request.is_active.unwrap_or(true),
        sort_order: request.sort_order.unwrap_or(0),
        created_at: now,
        updated_at: now,
    }.into_active_model().insert(&db).await?;
    info!(zone = %zone.uuid, code = %zone.code, "Created zone");

    Ok(Json(ZoneResponse::new(zone, ZoneDependents::default())))
}

async fn update_zone(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>, Json(request): Json<ZoneRequest>) -> Result<Json<ZoneResponse>, APIError> {
    let existing = zone::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Zone"))?;
    let request = request.normalized();
    check_request(&db, &request, Some(id)).await?;

    let mut zone: zone::ActiveModel = existing.into();
    zone.name = ActiveValue::Set(request.name);
    zone.code = ActiveValue::Set(request.code);
    zone.description = ActiveValue::Set(request.description);
    zone.region = ActiveValue::Set(request.region);
    zone.email = ActiveValue::Set(request.email);
    if let Some(is_active) = request.is_active {
        zone.is_active = ActiveValue::Set(is_active);
    }
    if let Some(sort_order) = request.sort_order {
        zone.sort_order = ActiveValue::Set(sort_order);
    }
    zone.updated_at = ActiveValue::Set(chrono::Utc::now().naive_utc());
    let zone = zone.update(&db).await?;

    let mut response = with_counts(&db, vec![zone]).await?;
    response.pop().map(Json).ok_or_else(|| APIError::not_found("Zone"))
}

async fn delete_zone(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let zone = zone::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Zone"))?;
    let dependents = queries::zone_dependents(&db, &[id]).await?.remove(&id).unwrap_or_default();
    if dependents.any() {
        return Err(APIError::conflict(format!("Cannot delete zone: it has {}", dependents.describe())));
    }
    zone::Entity::delete_by_id(id).exec(&db).await?;
    info!(zone = %id, "Deleted zone");
    Ok(ActionResponse::ok(format!("Zone {} deleted", zone.name)))
}

async fn toggle_zone(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ToggleResponse>, APIError> {
    Ok(Json(actions::toggle_active(&db, &COLUMNS, id, "Zone").await?))
}

async fn bulk_zones(State(db): State<DatabaseConnection>, Json(request): Json<BulkActionRequest>) -> Result<Json<ActionResponse>, APIError> {
    request.check()?;
    let transaction = db.begin().await?;
    let affected = match request.action {
        BulkAction::Delete => {
            let dependents = queries::zone_dependents(&transaction, &request.ids).await?;
            let zones = zone::Entity::find().filter(zone::Column::Uuid.is_in(request.ids.clone())).all(&transaction).await?;
            let blocked = zones.iter()
                .filter(|z| dependents.get(&z.uuid).map(|d| d.any()).unwrap_or(false))
                .map(|z| z.name.clone())
                .collect::<Vec<_>>();
            actions::ensure_deletable("zones", blocked)?;
            actions::delete_many::<zone::Entity, _>(&transaction, zone::Column::Uuid, &request.ids).await?
        },
        action => actions::set_active_many(&transaction, &COLUMNS, &request.ids, action == BulkAction::Activate).await?,
    };
    transaction.commit().await?;
    Ok(ActionResponse::ok(request.message(affected)))
}

async fn export_zones(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListParams>,
    Query(filter): Query<ZoneFilter>,
) -> Result<Response, APIError> {
    let zones = filtered(&params, &filter)
        .order_by_asc(zone::Column::SortOrder)
        .order_by_asc(zone::Column::Name)
        .all(&db)
        .await?;
    let zones = with_counts(&db, zones).await?;

    let mut export = CsvExport::new("zones", &["ID", "Name", "Code", "Region", "Email", "Active", "Users", "Clubs", "Tournaments", "Created At"])?;
    for z in zones {
        export.row([
            z.zone.uuid.to_string(),
            z.zone.name,
            z.zone.code,
            z.zone.region.unwrap_or_default(),
            z.zone.email.unwrap_or_default(),
            yes_no(z.zone.is_active).to_string(),
            z.users_count.to_string(),
            z.clubs_count.to_string(),
            z.tournaments_count.to_string(),
            format_date(z.zone.created_at.date()),
        ])?;
    }
    export.finish()
}

async fn zone_statistics(State(db): State<DatabaseConnection>) -> Result<Json<ZoneStatistics>, APIError> {
    let zones = zone::Entity::find().all(&db).await?;
    let total = zones.len() as u64;
    let active = zone::Entity::find().filter(zone::Column::IsActive.eq(true)).count(&db).await?;
    let ids = zones.iter().map(|z| z.uuid).collect::<Vec<_>>();
    let users: HashMap<Uuid, u64> = queries::count_grouped::<golf_admin_entities::schema::user::Entity, _>(
        &db, golf_admin_entities::schema::user::Column::ZoneId, &ids
    ).await?;
    let with_users = ids.iter().filter(|id| users.get(id).copied().unwrap_or(0) > 0).count() as u64;

    Ok(Json(ZoneStatistics {
        total,
        active,
        inactive: total - active,
        with_users,
        without_users: total - with_users,
    }))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/zones", get(list_zones).post(create_zone))
        .route("/zones/export", get(export_zones))
        .route("/zones/statistics", get(zone_statistics))
        .route("/zones/bulk", post(bulk_zones))
        .route("/zones/:id", get(get_zone).put(update_zone).delete(delete_zone))
        .route("/zones/:id/toggle-active", post(toggle_zone))
}
