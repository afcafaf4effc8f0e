use chrono::NaiveDate;
use golf_admin_entities::domain::assignment::AssignmentRole;
use golf_admin_entities::domain::institutional_email::{recipients_for, NotificationType};
use golf_admin_entities::domain::letter_template::{resolve_template, TemplateType};
use golf_admin_entities::domain::letterhead::resolve_letterhead;
use golf_admin_entities::domain::notification::{DeliveryStatus, DispatchStatus, EmailList, RecipientType};
use golf_admin_entities::domain::template::{render_message, RenderedMessage, TemplateContext, TemplateVariable};
use golf_admin_entities::domain::tournament::{format_date, format_date_range, TournamentStatus};
use golf_admin_entities::schema::{club, letter_template, letterhead, notification, tournament, tournament_category, tournament_notification, user, zone};
use sea_orm::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ActiveValue, ConnectionTrait, DatabaseConnection, IntoActiveModel, QueryOrder, TransactionTrait};
use serde::{Serialize, Deserialize};
use tracing::{info, warn};
use validator::ValidateEmail;

use crate::assignments;
use crate::mail::{Mailer, OutgoingMessage};
use crate::response::APIError;

const MISSING_EMAIL: &str = "missing email address";

/// Everything a tournament letter can refer to.
pub struct TournamentLetterData {
    pub tournament: tournament::Model,
    pub club: club::Model,
    pub zone: zone::Model,
    pub category: tournament_category::Model,
    pub assignments: Vec<(golf_admin_entities::schema::assignment::Model, user::Model)>,
    pub context: TemplateContext,
}

impl TournamentLetterData {
    pub async fn load<C>(db: &C, tournament_id: Uuid, federation_name: &str) -> Result<Self, APIError> where C: ConnectionTrait {
        let tournament = tournament::Entity::find_by_id(tournament_id).one(db).await?.ok_or_else(|| APIError::not_found("Tournament"))?;
        let club = club::Entity::find_by_id(tournament.club_id).one(db).await?.ok_or_else(|| APIError::not_found("Club"))?;
        let zone = zone::Entity::find_by_id(tournament.zone_id).one(db).await?.ok_or_else(|| APIError::not_found("Zone"))?;
        let category = tournament_category::Entity::find_by_id(tournament.category_id).one(db).await?.ok_or_else(|| APIError::not_found("Category"))?;
        let assignments = assignments::load_for_tournament(db, tournament_id).await?;

        let referees_list = assignments.iter()
            .map(|(a, u)| format!("- {} ({})", u.name, a.role.label()))
            .collect::<Vec<_>>()
            .join("\n");
        let director = assignments.iter()
            .find(|(a, _)| a.role == AssignmentRole::TournamentDirector)
            .map(|(_, u)| u.name.clone())
            .unwrap_or_default();

        let mut context = TemplateContext::new();
        context
            .set(TemplateVariable::TournamentName, tournament.name.clone())
            .set(TemplateVariable::TournamentDates, format_date_range(tournament.start_date, tournament.end_date))
            .set(TemplateVariable::TournamentStartDate, format_date(tournament.start_date))
            .set(TemplateVariable::TournamentEndDate, format_date(tournament.end_date))
            .set(TemplateVariable::ClubName, club.name.clone())
            .set(TemplateVariable::ClubEmail, club.email.clone().unwrap_or_default())
            .set(TemplateVariable::ZoneName, zone.name.clone())
            .set(TemplateVariable::CategoryName, category.name.clone())
            .set(TemplateVariable::RefereesList, referees_list)
            .set(TemplateVariable::TournamentDirector, director)
            .set(TemplateVariable::FederationName, federation_name)
            .set(TemplateVariable::CurrentDate, format_date(chrono::Utc::now().date_naive()));

        Ok(TournamentLetterData { tournament, club, zone, category, assignments, context })
    }
}

/// Placeholder values for previewing a template without a tournament.
pub fn sample_context(federation_name: &str) -> TemplateContext {
    let start = NaiveDate::from_ymd_opt(2030, 6, 10).unwrap_or_default();
    let end = NaiveDate::from_ymd_opt(2030, 6, 12).unwrap_or_default();
    TemplateContext::new()
        .with(TemplateVariable::TournamentName, "Trofeo di Esempio")
        .with(TemplateVariable::TournamentDates, format_date_range(start, end))
        .with(TemplateVariable::TournamentStartDate, format_date(start))
        .with(TemplateVariable::TournamentEndDate, format_date(end))
        .with(TemplateVariable::ClubName, "Golf Club Esempio")
        .with(TemplateVariable::ClubEmail, "segreteria@golfclub.example")
        .with(TemplateVariable::ZoneName, "Zona 1")
        .with(TemplateVariable::CategoryName, "Gara Zonale")
        .with(TemplateVariable::RecipientName, "Mario Rossi")
        .with(TemplateVariable::RefereeName, "Mario Rossi")
        .with(TemplateVariable::RefereeLevel, "Regionale")
        .with(TemplateVariable::Role, AssignmentRole::Referee.label())
        .with(TemplateVariable::RefereesList, "- Mario Rossi (Arbitro)\n- Luca Bianchi (Direttore di Torneo)")
        .with(TemplateVariable::TournamentDirector, "Luca Bianchi")
        .with(TemplateVariable::FederationName, federation_name)
        .with(TemplateVariable::CurrentDate, format_date(chrono::Utc::now().date_naive()))
}

/// Renders a template and wraps it in the letterhead, if any.
pub fn compose(template: &letter_template::Model, letterhead: Option<&letterhead::Model>, context: &TemplateContext) -> RenderedMessage {
    let rendered = render_message(&template.subject, &template.body, context);
    match letterhead {
        Some(letterhead) => RenderedMessage {
            subject: rendered.subject,
            body: letterhead.compose(&rendered.body, context),
        },
        None => rendered,
    }
}

fn referee_context(base: &TemplateContext, role: AssignmentRole, referee: &user::Model) -> TemplateContext {
    base.clone()
        .with(TemplateVariable::RefereeName, referee.name.clone())
        .with(TemplateVariable::RecipientName, referee.name.clone())
        .with(TemplateVariable::RefereeLevel, referee.referee_level.map(|l| l.label()).unwrap_or_default())
        .with(TemplateVariable::Role, role.label())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareRequest {
    #[serde(default = "default_true")]
    pub send_to_club: bool,
    #[serde(default = "default_true")]
    pub send_to_referees: bool,
    #[serde(default = "default_true")]
    pub send_to_institutional: bool,
    pub referee_template_id: Option<Uuid>,
    pub club_template_id: Option<Uuid>,
    pub institutional_template_id: Option<Uuid>,
    #[serde(default)]
    pub additional_emails: Vec<String>,
}

impl Default for PrepareRequest {
    fn default() -> Self {
        PrepareRequest {
            send_to_club: true,
            send_to_referees: true,
            send_to_institutional: true,
            referee_template_id: None,
            club_template_id: None,
            institutional_template_id: None,
            additional_emails: vec![],
        }
    }
}

fn default_true() -> bool {
    true
}

async fn check_override<C>(db: &C, id: Option<Uuid>, expected: TemplateType, field: &str) -> Result<(), APIError> where C: ConnectionTrait {
    if let Some(id) = id {
        let template = letter_template::Entity::find_by_id(id).one(db).await?;
        match template {
            Some(t) if t.template_type == expected => {},
            Some(_) => return Err(APIError::invalid_field(field, format!("The template is not a {} template", expected.label()))),
            None => return Err(APIError::invalid_field(field, "The selected template does not exist")),
        }
    }
    Ok(())
}

pub async fn prepare(db: &DatabaseConnection, tournament_id: Uuid, request: PrepareRequest) -> Result<tournament_notification::Model, APIError> {
    tournament::Entity::find_by_id(tournament_id).one(db).await?.ok_or_else(|| APIError::not_found("Tournament"))?;
    if assignments::load_for_tournament(db, tournament_id).await?.is_empty() {
        return Err(APIError::invalid_field("tournament_id", "The tournament has no assigned referees"));
    }

    let additional_emails = request.additional_emails.iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect::<Vec<_>>();
    if let Some(invalid) = additional_emails.iter().find(|e| !e.validate_email()) {
        return Err(APIError::invalid_field("additional_emails", format!("Invalid email address: {}", invalid)));
    }
    check_override(db, request.referee_template_id, TemplateType::RefereeAssignment, "referee_template_id").await?;
    check_override(db, request.club_template_id, TemplateType::ClubNotification, "club_template_id").await?;
    check_override(db, request.institutional_template_id, TemplateType::InstitutionalNotification, "institutional_template_id").await?;

    let now = chrono::Utc::now().naive_utc();
    let dispatch = tournament_notification::Model {
        uuid: Uuid::new_v4(),
        tournament_id,
        status: DispatchStatus::Draft,
        referee_template_id: request.referee_template_id,
        club_template_id: request.club_template_id,
        institutional_template_id: request.institutional_template_id,
        send_to_club: request.send_to_club,
        send_to_referees: request.send_to_referees,
        send_to_institutional: request.send_to_institutional,
        additional_emails: EmailList(additional_emails),
        total_recipients: 0,
        sent_count: 0,
        failed_count: 0,
        sent_at: None,
        created_at: now,
        updated_at: now,
    }.into_active_model().insert(db).await?;
    info!(dispatch = %dispatch.uuid, tournament = %tournament_id, "Prepared tournament notification");
    Ok(dispatch)
}

/// One message addressed to one recipient, before delivery.
struct PlannedMessage {
    recipient_type: RecipientType,
    recipient_name: String,
    recipient_email: Option<String>,
    user_id: Option<Uuid>,
    institutional_email_id: Option<Uuid>,
    message: RenderedMessage,
}

async fn pick_template<C>(db: &C, explicit: Option<Uuid>, template_type: TemplateType, data: &TournamentLetterData) -> Result<letter_template::Model, APIError> where C: ConnectionTrait {
    let template = match explicit {
        Some(id) => letter_template::Entity::find_by_id(id).one(db).await?,
        None => resolve_template(db, template_type, data.zone.uuid, data.category.uuid).await?,
    };
    template.ok_or_else(|| APIError::invalid_field("template", format!("No {} template available for this tournament", template_type.label())))
}

async fn plan_messages<C>(db: &C, dispatch: &tournament_notification::Model, data: &TournamentLetterData) -> Result<Vec<PlannedMessage>, APIError> where C: ConnectionTrait {
    let club_template = if dispatch.send_to_club { Some(pick_template(db, dispatch.club_template_id, TemplateType::ClubNotification, data).await?) } else { None };
    let referee_template = if dispatch.send_to_referees { Some(pick_template(db, dispatch.referee_template_id, TemplateType::RefereeAssignment, data).await?) } else { None };
    let needs_institutional_template = dispatch.send_to_institutional || !dispatch.additional_emails.0.is_empty();
    let institutional_template = if needs_institutional_template {
        Some(pick_template(db, dispatch.institutional_template_id, TemplateType::InstitutionalNotification, data).await?)
    } else {
        None
    };
    let letterhead = resolve_letterhead(db, Some(data.zone.uuid)).await?;
    let letterhead = letterhead.as_ref();

    let mut planned = vec![];
    if let Some(template) = &club_template {
        let context = data.context.clone().with(TemplateVariable::RecipientName, data.club.name.clone());
        planned.push(PlannedMessage {
            recipient_type: RecipientType::Club,
            recipient_name: data.club.name.clone(),
            recipient_email: data.club.email.clone(),
            user_id: None,
            institutional_email_id: None,
            message: compose(template, letterhead, &context),
        });
    }
    if let Some(template) = &referee_template {
        for (assignment, referee) in data.assignments.iter() {
            let context = referee_context(&data.context, assignment.role, referee);
            planned.push(PlannedMessage {
                recipient_type: RecipientType::Referee,
                recipient_name: referee.name.clone(),
                recipient_email: Some(referee.email.clone()),
                user_id: Some(referee.uuid),
                institutional_email_id: None,
                message: compose(template, letterhead, &context),
            });
        }
    }
    if let Some(template) = &institutional_template {
        if dispatch.send_to_institutional {
            for recipient in recipients_for(db, NotificationType::Assignment, data.zone.uuid).await? {
                let context = data.context.clone().with(TemplateVariable::RecipientName, recipient.name.clone());
                planned.push(PlannedMessage {
                    recipient_type: RecipientType::Institutional,
                    recipient_name: recipient.name.clone(),
                    recipient_email: Some(recipient.email.clone()),
                    user_id: None,
                    institutional_email_id: Some(recipient.uuid),
                    message: compose(template, letterhead, &context),
                });
            }
        }
        for email in dispatch.additional_emails.0.iter() {
            let context = data.context.clone().with(TemplateVariable::RecipientName, email.clone());
            planned.push(PlannedMessage {
                recipient_type: RecipientType::Additional,
                recipient_name: email.clone(),
                recipient_email: Some(email.clone()),
                user_id: None,
                institutional_email_id: None,
                message: compose(template, letterhead, &context),
            });
        }
    }
    Ok(planned)
}

/// Delivers one message, returning the error text on failure.
async fn deliver(mailer: &dyn Mailer, to: &str, to_name: &str, message: &RenderedMessage) -> Result<(), String> {
    if to.trim().is_empty() {
        return Err(MISSING_EMAIL.to_string());
    }
    let outgoing = OutgoingMessage {
        to: to.to_string(),
        to_name: to_name.to_string(),
        subject: message.subject.clone(),
        body: message.body.clone(),
    };
    mailer.send(&outgoing).await.map_err(|e| {
        warn!(recipient = %to, error = %e, "Failed to send notification");
        e.to_string()
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchDetail {
    #[serde(flatten)]
    pub dispatch: tournament_notification::Model,
    pub notifications: Vec<notification::Model>,
}

pub async fn load_detail<C>(db: &C, dispatch: tournament_notification::Model) -> Result<DispatchDetail, DbErr> where C: ConnectionTrait {
    let notifications = notification::Entity::find()
        .filter(notification::Column::TournamentNotificationId.eq(dispatch.uuid))
        .order_by_asc(notification::Column::CreatedAt)
        .order_by_asc(notification::Column::RecipientType)
        .order_by_asc(notification::Column::RecipientName)
        .all(db)
        .await?;
    Ok(DispatchDetail { dispatch, notifications })
}

/// Moves the dispatch out of `draft`. Only one caller can win the update.
async fn claim_draft<C>(db: &C, id: Uuid, now: chrono::NaiveDateTime) -> Result<(), APIError> where C: ConnectionTrait {
    let result = tournament_notification::Entity::update_many()
        .col_expr(tournament_notification::Column::Status, Expr::value(DispatchStatus::Sent))
        .col_expr(tournament_notification::Column::SentAt, Expr::value(now))
        .col_expr(tournament_notification::Column::UpdatedAt, Expr::value(now))
        .filter(tournament_notification::Column::Uuid.eq(id))
        .filter(tournament_notification::Column::Status.eq(DispatchStatus::Draft))
        .exec(db)
        .await?;
    if result.rows_affected != 1 {
        return Err(APIError::conflict("Only draft notifications can be sent"));
    }
    Ok(())
}

pub async fn send(db: &DatabaseConnection, mailer: &dyn Mailer, id: Uuid, federation_name: &str) -> Result<DispatchDetail, APIError> {
    let dispatch = tournament_notification::Entity::find_by_id(id).one(db).await?.ok_or_else(|| APIError::not_found("Notification"))?;
    if dispatch.status != DispatchStatus::Draft {
        return Err(APIError::conflict("Only draft notifications can be sent"));
    }
    let data = TournamentLetterData::load(db, dispatch.tournament_id, federation_name).await?;
    let planned = plan_messages(db, &dispatch, &data).await?;

    let now = chrono::Utc::now().naive_utc();
    claim_draft(db, id, now).await?;

    let mut rows = vec![];
    for planned in planned {
        let email = planned.recipient_email.unwrap_or_default();
        let result = deliver(mailer, &email, &planned.recipient_name, &planned.message).await;
        let attempted = !email.trim().is_empty();
        rows.push(notification::Model {
            uuid: Uuid::new_v4(),
            tournament_notification_id: dispatch.uuid,
            tournament_id: dispatch.tournament_id,
            recipient_type: planned.recipient_type,
            recipient_name: planned.recipient_name,
            recipient_email: email,
            user_id: planned.user_id,
            institutional_email_id: planned.institutional_email_id,
            subject: planned.message.subject,
            body: planned.message.body,
            status: if result.is_ok() { DeliveryStatus::Sent } else { DeliveryStatus::Failed },
            error_message: result.err(),
            attempts: if attempted { 1 } else { 0 },
            sent_at: Some(now),
            created_at: now,
        });
    }

    let total = rows.len() as i32;
    let sent_count = rows.iter().filter(|r| r.status == DeliveryStatus::Sent).count() as i32;

    let transaction = db.begin().await?;
    if !rows.is_empty() {
        notification::Entity::insert_many(rows.into_iter().map(|r| r.into_active_model())).exec(&transaction).await?;
    }
    let mut active: tournament_notification::ActiveModel = dispatch.into();
    active.total_recipients = ActiveValue::Set(total);
    active.sent_count = ActiveValue::Set(sent_count);
    active.failed_count = ActiveValue::Set(total - sent_count);
    active.sent_at = ActiveValue::Set(Some(now));
    active.status = ActiveValue::Set(DispatchStatus::from_counts(sent_count));
    active.updated_at = ActiveValue::Set(now);
    let dispatch = active.update(&transaction).await?;

    let mut tournament: tournament::ActiveModel = data.tournament.into();
    tournament.status = ActiveValue::Set(TournamentStatus::Assigned);
    tournament.updated_at = ActiveValue::Set(now);
    tournament.update(&transaction).await?;

    let detail = load_detail(&transaction, dispatch).await?;
    transaction.commit().await?;

    info!(dispatch = %id, total, sent = sent_count, "Sent tournament notification");
    Ok(detail)
}

pub async fn resend_failed(db: &DatabaseConnection, mailer: &dyn Mailer, id: Uuid) -> Result<DispatchDetail, APIError> {
    let dispatch = tournament_notification::Entity::find_by_id(id).one(db).await?.ok_or_else(|| APIError::not_found("Notification"))?;
    if dispatch.status == DispatchStatus::Draft {
        return Err(APIError::conflict("The notification has not been sent yet"));
    }

    let failed = notification::Entity::find()
        .filter(notification::Column::TournamentNotificationId.eq(id))
        .filter(notification::Column::Status.eq(DeliveryStatus::Failed))
        .all(db)
        .await?;

    let now = chrono::Utc::now().naive_utc();
    let mut updated = vec![];
    for row in failed {
        let message = RenderedMessage { subject: row.subject.clone(), body: row.body.clone() };
        let result = deliver(mailer, &row.recipient_email, &row.recipient_name, &message).await;
        let attempts = row.attempts + 1;
        let mut active: notification::ActiveModel = row.into();
        active.attempts = ActiveValue::Set(attempts);
        active.sent_at = ActiveValue::Set(Some(now));
        match result {
            Ok(()) => {
                active.status = ActiveValue::Set(DeliveryStatus::Sent);
                active.error_message = ActiveValue::Set(None);
            },
            Err(e) => {
                active.error_message = ActiveValue::Set(Some(e));
            }
        }
        updated.push(active);
    }

    let transaction = db.begin().await?;
    for active in updated {
        active.update(&transaction).await?;
    }
    let children = notification::Entity::find()
        .filter(notification::Column::TournamentNotificationId.eq(id))
        .all(&transaction)
        .await?;
    let total = children.len() as i32;
    let sent_count = children.iter().filter(|c| c.status == DeliveryStatus::Sent).count() as i32;

    let mut active: tournament_notification::ActiveModel = dispatch.into();
    active.total_recipients = ActiveValue::Set(total);
    active.sent_count = ActiveValue::Set(sent_count);
    active.failed_count = ActiveValue::Set(total - sent_count);
    active.status = ActiveValue::Set(DispatchStatus::from_counts(sent_count));
    active.updated_at = ActiveValue::Set(now);
    let dispatch = active.update(&transaction).await?;

    let detail = load_detail(&transaction, dispatch).await?;
    transaction.commit().await?;

    info!(dispatch = %id, total, sent = sent_count, "Retried failed notifications");
    Ok(detail)
}
