use hyper::StatusCode;
use sea_orm::{prelude::*, sea_query::Expr, ConnectionTrait, ModelTrait, Value};
use serde::{Serialize, Deserialize};

use crate::response::APIError;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Activate,
    Deactivate,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkActionRequest {
    pub action: BulkAction,
    pub ids: Vec<Uuid>,
}

impl BulkActionRequest {
    pub fn check(&self) -> Result<(), APIError> {
        if self.ids.is_empty() {
            return Err(APIError::invalid_field("ids", "Select at least one record"));
        }
        Ok(())
    }

    pub fn message(&self, affected: u64) -> String {
        match self.action {
            BulkAction::Activate => format!("{} records activated", affected),
            BulkAction::Deactivate => format!("{} records deactivated", affected),
            BulkAction::Delete => format!("{} records deleted", affected),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub message: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderItem {
    pub id: Uuid,
    pub sort_order: i32,
}

/// Columns used by the generic activate/deactivate/delete helpers.
pub struct ActiveColumns<E: EntityTrait> {
    pub id: E::Column,
    pub is_active: E::Column,
    pub updated_at: E::Column,
}

pub async fn set_active_many<E, C>(db: &C, columns: &ActiveColumns<E>, ids: &[Uuid], is_active: bool) -> Result<u64, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let result = E::update_many()
        .col_expr(columns.is_active, Expr::value(is_active))
        .col_expr(columns.updated_at, Expr::value(chrono::Utc::now().naive_utc()))
        .filter(columns.id.is_in(ids.iter().cloned()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete_many<E, C>(db: &C, id_column: E::Column, ids: &[Uuid]) -> Result<u64, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let result = E::delete_many()
        .filter(id_column.is_in(ids.iter().cloned()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Flips `is_active` of one record and returns the new value.
pub async fn toggle_active<E, C>(db: &C, columns: &ActiveColumns<E>, id: Uuid, what: &str) -> Result<ToggleResponse, APIError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let model = E::find().filter(columns.id.eq(id)).one(db).await?.ok_or_else(|| APIError::not_found(what))?;
    let current = match model.get(columns.is_active) {
        Value::Bool(Some(v)) => v,
        _ => return Err(APIError::from((StatusCode::INTERNAL_SERVER_ERROR, format!("{} has no active flag", what)))),
    };
    set_active_many(db, columns, &[id], !current).await?;
    Ok(ToggleResponse {
        success: true,
        message: format!("{} {}", what, if current { "deactivated" } else { "activated" }),
        is_active: !current,
    })
}

/// Fails with 409 naming the records that can not be deleted.
pub fn ensure_deletable(what: &str, blocked: Vec<String>) -> Result<(), APIError> {
    if blocked.is_empty() {
        Ok(())
    }
    else {
        Err(APIError::conflict(format!("Cannot delete {}: {} still in use", what, blocked.join(", "))))
    }
}

/// The serialized name of a unit enum variant, used as a statistics key.
pub fn enum_key<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(key)) => key,
        _ => String::new(),
    }
}
