use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Json, Router, routing::{get, post}};
use golf_admin_entities::domain::institutional_email::{parse_notification_types, EmailCategory, NotificationType, NotificationTypeList};
use golf_admin_entities::domain::validation::normalize_optional;
use golf_admin_entities::queries;
use golf_admin_entities::schema::{institutional_email, zone};
use golf_admin_entities::FieldErrors;
use itertools::Itertools;
use sea_orm::prelude::*;
use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{ActiveModelTrait, ActiveValue, Condition, DatabaseConnection, IntoActiveModel, Order, QueryOrder, Select, TransactionTrait};
use serde::{Serialize, Deserialize};
use tracing::info;
use validator::Validate;

use crate::actions::{self, ActiveColumns, BulkAction, BulkActionRequest, ToggleResponse};
use crate::config::Config;
use crate::export::{yes_no, CsvExport};
use crate::pagination::{fetch_page, ListParams, Paginated};
use crate::response::{validate_request, APIError, ActionResponse};
use crate::state::AppState;


#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InstitutionalEmailRequest {
    #[validate(length(min = 1, max = 255, message = "The name is required and must not exceed 255 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub description: Option<String>,
    pub category: EmailCategory,
    pub zone_id: Option<Uuid>,
    #[serde(default)]
    pub receive_all_notifications: bool,
    #[serde(default)]
    pub notification_types: Vec<String>,
    pub is_active: Option<bool>,
}

impl InstitutionalEmailRequest {
    fn normalized(self) -> Self {
        InstitutionalEmailRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            description: normalize_optional(self.description),
            ..self
        }
    }

    /// The notification types to store. Empty when every type is received.
    fn notification_types(&self) -> Result<Vec<NotificationType>, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.receive_all_notifications {
            return Ok(vec![]);
        }
        match parse_notification_types(&self.notification_types) {
            Ok(types) if types.is_empty() => {
                errors.add("notification_types", "Select at least one notification type or enable all notifications");
                Err(errors)
            },
            Ok(types) => Ok(types),
            Err(unknown) => {
                errors.add("notification_types", format!("Unknown notification types: {}", unknown.join(", ")));
                Err(errors)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstitutionalEmailFilter {
    pub category: Option<EmailCategory>,
    pub zone_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub notification_type: Option<NotificationType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionalEmailResponse {
    #[serde(flatten)]
    pub email: institutional_email::Model,
    pub zone_name: Option<String>,
}

const COLUMNS: ActiveColumns<institutional_email::Entity> = ActiveColumns {
    id: institutional_email::Column::Uuid,
    is_active: institutional_email::Column::IsActive,
    updated_at: institutional_email::Column::UpdatedAt,
};

fn filtered(params: &ListParams, filter: &InstitutionalEmailFilter) -> Select<institutional_email::Entity> {
    let mut select = institutional_email::Entity::find();
    if let Some(condition) = params.search_condition(&[institutional_email::Column::Name, institutional_email::Column::Email, institutional_email::Column::Description]) {
        select = select.filter(condition);
    }
    if let Some(category) = filter.category {
        select = select.filter(institutional_email::Column::Category.eq(category));
    }
    if let Some(zone_id) = filter.zone_id {
        select = select.filter(institutional_email::Column::ZoneId.eq(zone_id));
    }
    if let Some(is_active) = filter.is_active {
        select = select.filter(institutional_email::Column::IsActive.eq(is_active));
    }
    if let Some(notification_type) = filter.notification_type {
        // The list is stored as a JSON array of quoted keys.
        let pattern = format!("%\"{}\"%", notification_type.key());
        select = select.filter(
            Condition::any()
                .add(institutional_email::Column::ReceiveAllNotifications.eq(true))
                .add(Expr::expr(Expr::col(institutional_email::Column::NotificationTypes).cast_as(Alias::new("text"))).like(pattern))
        );
    }
    select
}

async fn to_responses(db: &DatabaseConnection, emails: Vec<institutional_email::Model>) -> Result<Vec<InstitutionalEmailResponse>, DbErr> {
    let zones: HashMap<Uuid, String> = zone::Entity::find()
        .filter(zone::Column::Uuid.is_in(emails.iter().filter_map(|e| e.zone_id).collect::<Vec<_>>()))
        .all(db).await?
        .into_iter().map(|z| (z.uuid, z.name)).collect();
    Ok(emails.into_iter().map(|email| InstitutionalEmailResponse {
        zone_name: email.zone_id.and_then(|z| zones.get(&z).cloned()),
        email,
    }).collect())
}

fn single(mut responses: Vec<InstitutionalEmailResponse>) -> Result<Json<InstitutionalEmailResponse>, APIError> {
    responses.pop().map(Json).ok_or_else(|| APIError::not_found("Institutional email"))
}

async fn list_emails(
    State(db): State<DatabaseConnection>,
    State(config): State<Arc<Config>>,
    Query(params): Query<ListParams>,
    Query(filter): Query<InstitutionalEmailFilter>,
) -> Result<Json<Paginated<InstitutionalEmailResponse>>, APIError> {
    let select = params.apply_sort(
        filtered(&params, &filter),
        &[("name", institutional_email::Column::Name), ("email", institutional_email::Column::Email), ("category", institutional_email::Column::Category), ("created_at", institutional_email::Column::CreatedAt)],
        &[(institutional_email::Column::Category, Order::Asc), (institutional_email::Column::Name, Order::Asc)],
    )?;
    let page = fetch_page(&db, select, &params, config.default_per_page).await?;
    let data = to_responses(&db, page.data).await?;
    Ok(Json(Paginated { data, meta: page.meta }))
}

async fn get_email(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<InstitutionalEmailResponse>, APIError> {
    let email = institutional_email::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Institutional email"))?;
    single(to_responses(&db, vec![email]).await?)
}

async fn check_request(db: &DatabaseConnection, request: &InstitutionalEmailRequest, id: Option<Uuid>) -> Result<Vec<NotificationType>, APIError> {
    let mut errors = validate_request(request);
    let types = match request.notification_types() {
        Ok(types) => types,
        Err(type_errors) => {
            errors.merge(type_errors);
            vec![]
        }
    };
    if !errors.contains("email") && queries::is_taken::<institutional_email::Entity, _, _>(db, institutional_email::Column::Email, request.email.clone(), institutional_email::Column::Uuid, id).await? {
        errors.add("email", "This email address is already in use");
    }
    if let Some(zone_id) = request.zone_id {
        if zone::Entity::find_by_id(zone_id).one(db).await?.is_none() {
            errors.add("zone_id", "The selected zone does not exist");
        }
    }
    errors.into_result()?;
    Ok(types)
}

async fn create_email(State(db): State<DatabaseConnection>, Json(request): Json<InstitutionalEmailRequest>) -> Result<Json<InstitutionalEmailResponse>, APIError> {
    let request = request.normalized();
    let types = check_request(&db, &request, None).await?;

    let now = chrono::Utc::now().naive_utc();
    let email = institutional_email::Model {
        uuid: Uuid::new_v4(),
        name: request.name,
        email: request.email,
        description: request.description,
        category: request.category,
        zone_id: request.zone_id,
        receive_all_notifications: request.receive_all_notifications,
        notification_types: NotificationTypeList(types),
        is_active: request.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    }.into_active_model().insert(&db).await?;
    info!(institutional_email = %email.uuid, "Created institutional email");

    single(to_responses(&db, vec![email]).await?)
}

async fn update_email(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>, Json(request): Json<InstitutionalEmailRequest>) -> Result<Json<InstitutionalEmailResponse>, APIError> {
    let existing = institutional_email::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Institutional email"))?;
    let request = request.normalized();
    let types = check_request(&db, &request, Some(id)).await?;

    let mut email: institutional_email::ActiveModel = existing.into();
    email.name = ActiveValue::Set(request.name);
    email.email = ActiveValue::Set(request.email);
    email.description = ActiveValue::Set(request.description);
    email.category = ActiveValue::Set(request.category);
    email.zone_id = ActiveValue::Set(request.zone_id);
    email.receive_all_notifications = ActiveValue::Set(request.receive_all_notifications);
    email.notification_types = ActiveValue::Set(NotificationTypeList(types));
    if let Some(is_active) = request.is_active {
        email.is_active = ActiveValue::Set(is_active);
    }
    email.updated_at = ActiveValue::Set(chrono::Utc::now().naive_utc());
    let email = email.update(&db).await?;

    single(to_responses(&db, vec![email]).await?)
}

async fn delete_email(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ActionResponse>, APIError> {
    let email = institutional_email::Entity::find_by_id(id).one(&db).await?.ok_or_else(|| APIError::not_found("Institutional email"))?;
    institutional_email::Entity::delete_by_id(id).exec(&db).await?;
    info!(institutional_email = %id, "Deleted institutional email");
    Ok(ActionResponse::ok(format!("Institutional email {} deleted", email.name)))
}

async fn toggle_email(State(db): State<DatabaseConnection>, Path(id): Path<Uuid>) -> Result<Json<ToggleResponse>, APIError> {
    Ok(Json(actions::toggle_active(&db, &COLUMNS, id, "Institutional email").await?))
}

async fn bulk_emails(State(db): State<DatabaseConnection>, Json(request): Json<BulkActionRequest>) -> Result<Json<ActionResponse>, APIError> {
    request.check()?;
    let transaction = db.begin().await?;
    let affected = match request.action {
        BulkAction::Delete => actions::delete_many::<institutional_email::Entity, _>(&transaction, institutional_email::Column::Uuid, &request.ids).await?,
        action => actions::set_active_many(&transaction, &COLUMNS, &request.ids, action == BulkAction::Activate).await?,
    };
    transaction.commit().await?;
    Ok(ActionResponse::ok(request.message(affected)))
}

async fn export_emails(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListParams>,
    Query(filter): Query<InstitutionalEmailFilter>,
) -> Result<Response, APIError> {
    let emails = filtered(&params, &filter)
        .order_by_asc(institutional_email::Column::Category)
        .order_by_asc(institutional_email::Column::Name)
        .all(&db)
        .await?;
    let emails = to_responses(&db, emails).await?;

    let mut export = CsvExport::new("institutional_emails", &["ID", "Name", "Email", "Category", "Zone", "All Notifications", "Notification Types", "Active"])?;
    for e in emails {
        export.row([
            e.email.uuid.to_string(),
            e.email.name.clone(),
            e.email.email.clone(),
            e.email.category.label().to_string(),
            e.zone_name.clone().unwrap_or_default(),
            yes_no(e.email.receive_all_notifications).to_string(),
            e.email.notification_types.0.iter().map(|t| t.key()).join(";"),
            yes_no(e.email.is_active).to_string(),
        ])?;
    }
    export.finish()
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/institutional-emails", get(list_emails).post(create_email))
        .route("/institutional-emails/export", get(export_emails))
        .route("/institutional-emails/bulk", post(bulk_emails))
        .route("/institutional-emails/:id", get(get_email).put(update_email).delete(delete_email))
        .route("/institutional-emails/:id/toggle-active", post(toggle_email))
}
