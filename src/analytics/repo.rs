use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ledger::LedgerEntry;

/// The three columns aggregation needs from either ledger table.
#[derive(Debug, Clone, FromRow)]
pub struct LedgerPoint {
    pub amount: Decimal,
    pub category: Option<String>,
    pub occurred_at: OffsetDateTime,
}

/// Every record the user owns of kind `E`, unbounded by date.
pub async fn points<E: LedgerEntry>(db: &PgPool, user_id: Uuid) -> Result<Vec<LedgerPoint>, sqlx::Error> {
    let sql = format!(
        "SELECT amount, category, {} AS occurred_at FROM {} WHERE user_id = $1",
        E::DATE_COLUMN,
        E::TABLE
    );
    sqlx::query_as::<_, LedgerPoint>(&sql)
        .bind(user_id)
        .fetch_all(db)
        .await
}
