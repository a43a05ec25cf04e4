use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// Bucket label for records stored without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A kind of ledger record. Expense and income share every operation and
/// differ only in their table and the name of their date field.
pub trait LedgerEntry:
    for<'r> FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + 'static
{
    const TABLE: &'static str;
    /// Column holding the record's date.
    const DATE_COLUMN: &'static str;
    /// Name of that date in JSON bodies and in `sortBy`.
    const DATE_FIELD: &'static str;
    /// Human label used in messages ("Expense not found").
    const LABEL: &'static str;
    const COLUMNS: &'static str;
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub incurred_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl LedgerEntry for Expense {
    const TABLE: &'static str = "expenses";
    const DATE_COLUMN: &'static str = "incurred_at";
    const DATE_FIELD: &'static str = "incurredAt";
    const LABEL: &'static str = "Expense";
    const COLUMNS: &'static str = "id, user_id, title, amount, category, incurred_at, created_at";
}

impl LedgerEntry for Income {
    const TABLE: &'static str = "incomes";
    const DATE_COLUMN: &'static str = "received_at";
    const DATE_FIELD: &'static str = "receivedAt";
    const LABEL: &'static str = "Income";
    const COLUMNS: &'static str = "id, user_id, title, amount, category, received_at, created_at";
}
