use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Map, Value};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
};

use crate::error::{AppError, AppResult};

/// Parses a decimal from a JSON-ish string: plain (`12.50`) or scientific (`1e3`).
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Decimal places kept for a stored amount, matching `NUMERIC(14, 2)`.
pub const AMOUNT_SCALE: u32 = 2;

/// Largest amount the `NUMERIC(14, 2)` columns hold.
fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, AMOUNT_SCALE)
}

/// Accepts a JSON number or a numeric string, rejecting negatives and values
/// the store cannot hold. Extra decimals are rounded the way the column does.
pub fn coerce_amount(value: &Value) -> AppResult<Decimal> {
    let parsed = match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    };
    let Some(d) = parsed else {
        return Err(AppError::validation("amount must be a number"));
    };
    if d.is_sign_negative() && !d.is_zero() {
        return Err(AppError::validation("amount must not be negative"));
    }
    let d = d.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if d > max_amount() {
        return Err(AppError::validation("amount is too large"));
    }
    Ok(d)
}

/// Which end of a day a bare `YYYY-MM-DD` stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayEdge {
    Start,
    End,
}

/// RFC 3339 timestamp normalised to UTC, or a bare date taken as UTC
/// midnight (or the last microsecond of that day for `DayEdge::End`).
/// Instants that fall outside the representable range in UTC are `None`.
pub fn parse_datetime(raw: &str, edge: DayEdge) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return OffsetDateTime::from_unix_timestamp_nanos(ts.unix_timestamp_nanos()).ok();
    }
    let date = Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()?;
    let at = match edge {
        DayEdge::Start => date.midnight(),
        // store resolution is microseconds
        DayEdge::End => date.with_hms_micro(23, 59, 59, 999_999).ok()?,
    };
    Some(at.assume_utc())
}

fn date_value(value: &Value, field: &str) -> AppResult<Option<OffsetDateTime>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_datetime(s, DayEdge::Start)
            .map(Some)
            .ok_or_else(|| AppError::validation(format!("{field} must be a date"))),
        _ => Err(AppError::validation(format!("{field} must be a date"))),
    }
}

/// What an update does to the category column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryChange {
    #[default]
    Keep,
    Clear,
    Set(String),
}

impl CategoryChange {
    fn from_value(value: Option<&Value>) -> AppResult<Self> {
        match value {
            None => Ok(Self::Keep),
            Some(Value::Null) => Ok(Self::Clear),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(Self::Clear),
            Some(Value::String(s)) => Ok(Self::Set(s.trim().to_owned())),
            Some(_) => Err(AppError::validation("category must be a string")),
        }
    }
}

/// Validated body of a create request.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub title: String,
    pub amount: Decimal,
    pub category: Option<String>,
    /// `None` means "now".
    pub date: Option<OffsetDateTime>,
}

/// Validated body of an update request; `None` fields stay untouched.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub category: CategoryChange,
    pub date: Option<OffsetDateTime>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.amount.is_none()
            && self.category == CategoryChange::Keep
            && self.date.is_none()
    }
}

fn as_object(body: &Value) -> AppResult<&Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| AppError::validation("Body must be a JSON object"))
}

fn title_value(value: &Value) -> AppResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(AppError::validation("title must be a string")),
    }
}

impl NewEntry {
    /// `date_field` is the kind's JSON name for its date (`incurredAt` / `receivedAt`).
    pub fn from_body(body: &Value, date_field: &str) -> AppResult<Self> {
        let obj = as_object(body)?;

        let title = match obj.get("title") {
            Some(v) => title_value(v)?,
            None => None,
        };
        let amount = obj.get("amount").filter(|v| !v.is_null());
        let (Some(title), Some(amount)) = (title, amount) else {
            return Err(AppError::validation("Title and amount are required"));
        };
        let amount = coerce_amount(amount)?;

        let category = match CategoryChange::from_value(obj.get("category"))? {
            CategoryChange::Set(c) => Some(c),
            CategoryChange::Keep | CategoryChange::Clear => None,
        };

        let date = match obj.get(date_field) {
            Some(v) => date_value(v, date_field)?,
            None => None,
        };

        Ok(Self {
            title,
            amount,
            category,
            date,
        })
    }
}

impl EntryPatch {
    pub fn from_body(body: &Value, date_field: &str) -> AppResult<Self> {
        let obj = as_object(body)?;

        let title = match obj.get("title") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                title_value(v)?.ok_or_else(|| AppError::validation("title must not be empty"))?,
            ),
        };

        let amount = match obj.get("amount") {
            None | Some(Value::Null) => None,
            Some(v) => Some(coerce_amount(v)?),
        };

        let category = CategoryChange::from_value(obj.get("category"))?;

        let date = match obj.get(date_field) {
            Some(v) => date_value(v, date_field)?,
            None => None,
        };

        Ok(Self {
            title,
            amount,
            category,
            date,
        })
    }
}
