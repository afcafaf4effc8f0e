use hyper::StatusCode;
use sea_orm::{prelude::*, sea_query::{Expr, Func, LikeExpr}, Condition, ConnectionTrait, Order, PaginatorTrait, QueryOrder, Select};
use serde::{Serialize, Deserialize};

use crate::response::APIError;

pub const MAX_PER_PAGE: u64 = 100;
pub const MIN_PER_PAGE: u64 = 1;
/// Keeps `(page - 1) * per_page` inside the range of an SQL `OFFSET`.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PER_PAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Order {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// Query parameters shared by every listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
}

impl ListParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn per_page(&self, default_per_page: u64) -> u64 {
        self.per_page.unwrap_or(default_per_page).clamp(MIN_PER_PAGE, MAX_PER_PAGE)
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    /// Case-insensitive substring match of the search term on any of `columns`.
    pub fn search_condition<C: ColumnTrait>(&self, columns: &[C]) -> Option<Condition> {
        let term = self.search_term()?;
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        let mut condition = Condition::any();
        for column in columns {
            condition = condition.add(
                Expr::expr(Func::lower(Expr::col((column.entity_name(), *column))))
                    .like(LikeExpr::new(pattern.clone()).escape('\\'))
            );
        }
        Some(condition)
    }

    /// Orders by the requested column when it is in `allowed`, else by `default`.
    pub fn apply_sort<E: EntityTrait>(&self, mut select: Select<E>, allowed: &[(&str, E::Column)], default: &[(E::Column, Order)]) -> Result<Select<E>, APIError> {
        match &self.sort {
            Some(sort) => {
                let column = allowed.iter()
                    .find(|(name, _)| *name == sort.as_str())
                    .map(|(_, column)| *column)
                    .ok_or_else(|| APIError::from((StatusCode::BAD_REQUEST, format!("Can not sort by {}", sort))))?;
                let order: Order = self.direction.unwrap_or(SortDirection::Asc).into();
                select = select.order_by(column, order);
            },
            None => {
                for (column, order) in default {
                    select = select.order_by(*column, order.clone());
                }
            }
        }
        Ok(select)
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if total == 0 {
            1
        } else {
            (total + per_page - 1) / per_page
        };

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

pub async fn fetch_page<E, C>(db: &C, select: Select<E>, params: &ListParams, default_per_page: u64) -> Result<Paginated<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let page = params.page();
    let per_page = params.per_page(default_per_page);
    let paginator = select.paginate(db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator.fetch_page(page - 1).await?;

    Ok(Paginated {
        data,
        meta: PaginationMeta::new(page, per_page, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_are_clamped() {
        let params = ListParams { page: Some(0), per_page: Some(500), ..Default::default() };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(20), MAX_PER_PAGE);

        let params = ListParams { page: Some(u64::MAX), ..Default::default() };
        assert_eq!(params.page(), MAX_PAGE);

        let params = ListParams { per_page: Some(0), ..Default::default() };
        assert_eq!(params.per_page(20), MIN_PER_PAGE);
        assert_eq!(ListParams::default().per_page(20), 20);
    }

    #[test]
    fn test_like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("milano"), "milano");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let params = ListParams { search: Some("   ".into()), ..Default::default() };
        assert_eq!(params.search_term(), None);
    }

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(1, 20, 100);
        assert_eq!(meta.total_pages, 5);
        assert!(meta.has_next);
        assert!(!meta.has_prev);

        let meta = PaginationMeta::new(5, 20, 100);
        assert!(!meta.has_next);
        assert!(meta.has_prev);

        let meta = PaginationMeta::new(1, 20, 0);
        assert_eq!(meta.total_pages, 1);
        assert!(!meta.has_next);

        let meta = PaginationMeta::new(1, 20, 95);
        assert_eq!(meta.total_pages, 5);
    }
}
