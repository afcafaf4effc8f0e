use std::collections::HashMap;

use sea_orm::{prelude::*, ConnectionTrait, PaginatorTrait, QuerySelect, sea_query::Expr};
use serde::{Serialize, Deserialize};

use crate::schema;


/// Counts the rows of `E` grouped by `column`, restricted to `keys`.
/// Keys without rows are absent from the map.
pub async fn count_grouped<E, C>(db: &C, column: E::Column, keys: &[Uuid]) -> Result<HashMap<Uuid, u64>, DbErr> where E: EntityTrait, C: ConnectionTrait {
    if keys.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Option<Uuid>, i64)> = E::find()
        .select_only()
        .column(column)
        .column_as(Expr::col(column).count(), "num")
        .filter(column.is_in(keys.iter().cloned()))
        .group_by(column)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows.into_iter().filter_map(|(key, num)| key.map(|key| (key, num as u64))).collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDependents {
    pub users: u64,
    pub clubs: u64,
    pub tournaments: u64,
}

impl ZoneDependents {
    pub fn any(&self) -> bool {
        self.users > 0 || self.clubs > 0 || self.tournaments > 0
    }

    pub fn describe(&self) -> String {
        format!("{} users, {} clubs, {} tournaments", self.users, self.clubs, self.tournaments)
    }
}

pub async fn zone_dependents<C>(db: &C, zone_ids: &[Uuid]) -> Result<HashMap<Uuid, ZoneDependents>, DbErr> where C: ConnectionTrait {
    let users = count_grouped::<schema::user::Entity, _>(db, schema::user::Column::ZoneId, zone_ids).await?;
    let clubs = count_grouped::<schema::club::Entity, _>(db, schema::club::Column::ZoneId, zone_ids).await?;
    let tournaments = count_grouped::<schema::tournament::Entity, _>(db, schema::tournament::Column::ZoneId, zone_ids).await?;

    Ok(zone_ids.iter().map(|id| {
        (*id, ZoneDependents {
            users: users.get(id).copied().unwrap_or(0),
            clubs: clubs.get(id).copied().unwrap_or(0),
            tournaments: tournaments.get(id).copied().unwrap_or(0),
        })
    }).collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDependents {
    pub assignments: u64,
    pub availabilities: u64,
}

impl UserDependents {
    pub fn any(&self) -> bool {
        self.assignments > 0 || self.availabilities > 0
    }
}

pub async fn user_dependents<C>(db: &C, user_ids: &[Uuid]) -> Result<HashMap<Uuid, UserDependents>, DbErr> where C: ConnectionTrait {
    let assignments = count_grouped::<schema::assignment::Entity, _>(db, schema::assignment::Column::UserId, user_ids).await?;
    let availabilities = count_grouped::<schema::availability::Entity, _>(db, schema::availability::Column::UserId, user_ids).await?;

    Ok(user_ids.iter().map(|id| {
        (*id, UserDependents {
            assignments: assignments.get(id).copied().unwrap_or(0),
            availabilities: availabilities.get(id).copied().unwrap_or(0),
        })
    }).collect())
}

pub async fn tournaments_by_club<C>(db: &C, club_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, DbErr> where C: ConnectionTrait {
    count_grouped::<schema::tournament::Entity, _>(db, schema::tournament::Column::ClubId, club_ids).await
}

pub async fn tournaments_by_category<C>(db: &C, category_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, DbErr> where C: ConnectionTrait {
    count_grouped::<schema::tournament::Entity, _>(db, schema::tournament::Column::CategoryId, category_ids).await
}

/// Whether another row of `E` already uses `value` in `column`.
pub async fn is_taken<E, C, V>(db: &C, column: E::Column, value: V, id_column: E::Column, exclude: Option<Uuid>) -> Result<bool, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
    V: Into<sea_orm::Value>,
{
    let mut query = E::find().filter(column.eq(value));
    if let Some(id) = exclude {
        query = query.filter(id_column.ne(id));
    }
    Ok(query.count(db).await? > 0)
}
