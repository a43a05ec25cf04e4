use rust_decimal::Decimal;
use serde::Deserialize;
use time::OffsetDateTime;

use super::input::{parse_datetime, parse_decimal, DayEdge};
use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw list query string; everything arrives as text and is validated in `ListFilter::parse`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Date,
    Title,
    Amount,
    Category,
    CreatedAt,
}

impl SortField {
    fn parse(raw: &str, date_field: &str) -> Option<Self> {
        match raw {
            f if f == date_field => Some(Self::Date),
            "title" => Some(Self::Title),
            "amount" => Some(Self::Amount),
            "category" => Some(Self::Category),
            "createdAt" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    /// Column to order by. Only ever one of these fixed names reaches SQL.
    pub fn column(self, date_column: &'static str) -> &'static str {
        match self {
            Self::Date => date_column,
            Self::Title => "title",
            Self::Amount => "amount",
            Self::Category => "category",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Validated filters, sort and page window for a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListFilter {
    pub category: Option<String>,
    pub start: Option<OffsetDateTime>,
    pub end: Option<OffsetDateTime>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub sort: SortField,
    pub order: SortOrder,
    pub page: i64,
    pub limit: i64,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

fn date_param(raw: Option<String>, name: &str, edge: DayEdge) -> AppResult<Option<OffsetDateTime>> {
    non_empty(raw)
        .map(|s| {
            parse_datetime(&s, edge).ok_or_else(|| AppError::validation(format!("Invalid {name}")))
        })
        .transpose()
}

fn amount_param(raw: Option<String>, name: &str) -> AppResult<Option<Decimal>> {
    non_empty(raw)
        .map(|s| parse_decimal(&s).ok_or_else(|| AppError::validation(format!("Invalid {name}"))))
        .transpose()
}

/// Positive integer or the default; zero, negatives and junk fall back too.
fn positive_or(raw: Option<String>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(default)
}

impl ListFilter {
    pub fn parse(q: ListQuery, date_field: &str) -> AppResult<Self> {
        let sort = match non_empty(q.sort_by) {
            None => SortField::Date,
            Some(s) => SortField::parse(&s, date_field)
                .ok_or_else(|| AppError::validation(format!("Invalid sortBy: {s}")))?,
        };
        let order = match q.sort_order.as_deref().map(str::trim) {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };

        Ok(Self {
            category: non_empty(q.category),
            start: date_param(q.start_date, "startDate", DayEdge::Start)?,
            end: date_param(q.end_date, "endDate", DayEdge::End)?,
            min_amount: amount_param(q.min_amount, "minAmount")?,
            max_amount: amount_param(q.max_amount, "maxAmount")?,
            sort,
            order,
            page: positive_or(q.page, DEFAULT_PAGE),
            limit: positive_or(q.limit, DEFAULT_LIMIT).min(MAX_LIMIT),
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}
