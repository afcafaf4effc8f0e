use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::{get, post}};
use golf_admin_entities::domain::notification::{DeliveryStatus, DispatchStatus};
use golf_admin_entities::schema::{notification, tournament, tournament_notification};
use sea_orm::prelude::*;
use sea_orm::{DatabaseConnection, Order, QueryOrder, QuerySelect, Select, TransactionTrait};
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::actions::enum_key;
use crate::config::Config;
use crate::dispatch::{self, DispatchDetail, PrepareRequest};
use crate::mail::Mailer;
use crate::pagination::{fetch_page, ListParams, Paginated};
use crate::response::{APIError, ActionResponse};
use crate::state::AppState;


#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationFilter {
    pub status: Option<DispatchStatus>,
    pub tournament_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSummary {
    #[serde(flatten)]
    pub dispatch: tournament_notification::Model,
    pub tournament_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationStatistics {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub sent_messages: u64,
    pub failed_messages: u64,
    pub by_recipient_type: BTreeMap<String, u64>,
}

async fn filtered(db: &DatabaseConnection, filter: &NotificationFilter) -> Result<Select<tournament_notification::Entity>, DbErr> {
    let mut select = tournament_notification::Entity::find();
    if let Some(status) = filter.status {
        select = select.filter(tournament_notification::Column::Status.eq(status));
    }
    if let Some(tournament_id) = filter.tournament_id {
        select = select.filter(tournament_notification::Column::TournamentId.eq(tournament_id));
    }
    if let Some(zone_id) = filter.zone_id {
        let tournaments: Vec<Uuid> = tournament::Entity::find()
            .select_only()
            .column(tournament::Column::Uuid)
            .filter(tournament::Column::ZoneId.eq(zone_id))
            .into_tuple()
            .all(db)
            .await?;
        select = select.filter(tournament_notification::Column::TournamentId.is_in(tournaments));
    }
    Ok(select)
}

async fn summaries(db: &DatabaseConnection, dispatches: Vec<tournament_notification::Model>) -> Result<Vec<DispatchSummary>, DbErr> {
    let names: HashMap<Uuid, String> = tournament::Entity::find()
        .filter(tournament::Column::Uuid.is_in(dispatches.iter().map(|d| d.tournament_id).collect::<Vec<_>>()))
        .all(db).await?
        .into_iter().map(|t| (t.uuid, t.name)).collect();
    Ok(dispatches.into_iter().map(|dispatch| DispatchSummary {
        tournament_name: names.get(&dispatch.tournament_id).cloned(),
        dispatch,
    }).collect())
}

async fn list_notifications(
    State(db): State<DatabaseConnection>,
    State(config): State<Arc<Config>>,
    Query(params): Query<ListParams>,
    Query(filter): Query<NotificationFilter>,
) -> Result<Json<Paginated<DispatchSummary>>, APIError> {
    let select = params.apply_sort(
        filtered(&db, &filter).await?,
        &[("created_at", tournament_notification::Column::CreatedAt), ("sent_at", tournament_notification::Column::SentAt), ("status", tournament_notification::Column::Status)],
        &[(tournament_notification::Column::CreatedAt, Order::Desc)],
    )?;
    let page = fetch_page(&db, select, &params, config.default_per_page).await?;
    let data = summaries(&db, page.data).await?;
    Ok(Json(Paginated { data, meta: page.meta }))
}

async fn tournament_notifications(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<Vec<DispatchSummary>>, APIError> {
    tournament::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Tournament"))?;
    let dispatches = tournament_notification::Entity::find()
        .filter(tournament_notification::Column::TournamentId.eq(id))
        .order_by_desc(tournament_notification::Column::CreatedAt)
        .all(&db)
        .await?;
    Ok(Json(summaries(&db, dispatches).await?))
}

async fn get_notification(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<DispatchDetail>, APIError> {
    let dispatch = tournament_notification::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Notification"))?;
    Ok(Json(dispatch::load_detail(&db, dispatch).await?))
}

async fn prepare_notification(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>, Json(request): Json<PrepareRequest>) -> Result<Json<DispatchDetail>, APIError> {
    let dispatch = dispatch::prepare(&db, id, request).await?;
    Ok(Json(dispatch::load_detail(&db, dispatch).await?))
}

async fn send_notification(
    State(db): State<DatabaseConnection>,
    State(mailer): State<Arc<dyn Mailer>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DispatchDetail>, APIError> {
    Ok(Json(dispatch::send(&db, mailer.as_ref(), id, &config.federation_name).await?))
}

async fn resend_failed(
    State(db): State<DatabaseConnection>,
    State(mailer): State<Arc<dyn Mailer>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DispatchDetail>, APIError> {
    Ok(Json(dispatch::resend_failed(&db, mailer.as_ref(), id).await?))
}

async fn delete_notification(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    tournament_notification::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Notification"))?;
    let transaction = db.begin().await?;
    notification::Entity::delete_many()
        .filter(notification::Column::TournamentNotificationId.eq(id))
        .exec(&transaction)
        .await?;
    tournament_notification::Entity::delete_by_id(id).exec(&transaction).await?;
    transaction.commit().await?;
    info!(dispatch = %id, "Deleted tournament notification");
    Ok(ActionResponse::ok("Notification deleted"))
}

async fn notification_statistics(State(db): State<DatabaseConnection>) -> Result<Json<NotificationStatistics>, APIError> {
    let dispatches = tournament_notification::Entity::find().all(&db).await?;
    let messages = notification::Entity::find().all(&db).await?;

    let mut stats = NotificationStatistics {
        total: dispatches.len() as u64,
        ..Default::default()
    };
    for d in dispatches.iter() {
        *stats.by_status.entry(enum_key(&d.status)).or_insert(0) += 1;
    }
    for m in messages.iter() {
        match m.status {
            DeliveryStatus::Sent => stats.sent_messages += 1,
            DeliveryStatus::Failed => stats.failed_messages += 1,
            DeliveryStatus::Pending => {},
        }
        *stats.by_recipient_type.entry(enum_key(&m.recipient_type)).or_insert(0) += 1;
    }
    Ok(Json(stats))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/statistics", get(notification_statistics))
        .route("/notifications/:id", get(get_notification).delete(delete_notification))
        .route("/notifications/:id/send", post(send_notification))
        .route("/notifications/:id/resend-failed", post(resend_failed))
        .route("/tournaments/:id/notifications", get(tournament_notifications).post(prepare_notification))
}
