use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::input::{CategoryChange, EntryPatch, NewEntry};
use super::query::ListFilter;
use super::records::{LedgerEntry, UNCATEGORIZED};

/// Appends the owner scope and the optional filters. Every listing query
/// starts from `user_id = $1`, so other users' rows are never candidates.
fn push_scope<E: LedgerEntry>(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, f: &ListFilter) {
    qb.push(" WHERE user_id = ").push_bind(user_id);

    if let Some(category) = &f.category {
        qb.push(" AND (category = ").push_bind(category.clone());
        if category == UNCATEGORIZED {
            qb.push(" OR category IS NULL");
        }
        qb.push(")");
    }
    if let Some(start) = f.start {
        qb.push(format!(" AND {} >= ", E::DATE_COLUMN)).push_bind(start);
    }
    if let Some(end) = f.end {
        qb.push(format!(" AND {} <= ", E::DATE_COLUMN)).push_bind(end);
    }
    if let Some(min) = f.min_amount {
        qb.push(" AND amount >= ").push_bind(min);
    }
    if let Some(max) = f.max_amount {
        qb.push(" AND amount <= ").push_bind(max);
    }
}

/// One page of the caller's records plus the total matching count.
pub async fn list<E: LedgerEntry>(
    db: &PgPool,
    user_id: Uuid,
    f: &ListFilter,
) -> Result<(Vec<E>, i64), sqlx::Error> {
    let mut rows_q = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM {}", E::COLUMNS, E::TABLE));
    push_scope::<E>(&mut rows_q, user_id, f);
    let dir = f.order.sql();
    // id breaks ties so consecutive pages never overlap
    rows_q.push(format!(
        " ORDER BY {} {dir}, id {dir}",
        f.sort.column(E::DATE_COLUMN)
    ));
    rows_q.push(" LIMIT ").push_bind(f.limit);
    rows_q.push(" OFFSET ").push_bind(f.offset());

    let mut count_q = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", E::TABLE));
    push_scope::<E>(&mut count_q, user_id, f);

    let (rows, total) = tokio::try_join!(
        rows_q.build_query_as::<E>().fetch_all(db),
        count_q.build_query_scalar::<i64>().fetch_one(db),
    )?;
    Ok((rows, total))
}

pub async fn create<E: LedgerEntry>(
    db: &PgPool,
    user_id: Uuid,
    entry: NewEntry,
) -> Result<E, sqlx::Error> {
    let date = entry.date.unwrap_or_else(OffsetDateTime::now_utc);
    let sql = format!(
        "INSERT INTO {} (user_id, title, amount, category, {}) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        E::TABLE,
        E::DATE_COLUMN,
        E::COLUMNS
    );
    sqlx::query_as::<_, E>(&sql)
        .bind(user_id)
        .bind(entry.title)
        .bind(entry.amount)
        .bind(entry.category)
        .bind(date)
        .fetch_one(db)
        .await
}

pub async fn find_owned<E: LedgerEntry>(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<E>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = $1 AND user_id = $2",
        E::COLUMNS,
        E::TABLE
    );
    sqlx::query_as::<_, E>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

/// Applies only the supplied fields. `None` when the record is missing or
/// belongs to someone else; the two are not told apart.
pub async fn update<E: LedgerEntry>(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    patch: EntryPatch,
) -> Result<Option<E>, sqlx::Error> {
    if patch.is_empty() {
        return find_owned::<E>(db, user_id, id).await;
    }

    let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", E::TABLE));
    {
        let mut set = qb.separated(", ");
        if let Some(title) = patch.title {
            set.push("title = ").push_bind_unseparated(title);
        }
        if let Some(amount) = patch.amount {
            set.push("amount = ").push_bind_unseparated(amount);
        }
        match patch.category {
            CategoryChange::Keep => {}
            CategoryChange::Clear => {
                set.push("category = NULL");
            }
            CategoryChange::Set(c) => {
                set.push("category = ").push_bind_unseparated(c);
            }
        }
        if let Some(date) = patch.date {
            set.push(format!("{} = ", E::DATE_COLUMN))
                .push_bind_unseparated(date);
        }
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" AND user_id = ").push_bind(user_id);
    qb.push(format!(" RETURNING {}", E::COLUMNS));

    qb.build_query_as::<E>().fetch_optional(db).await
}

/// `true` when an owned record was removed.
pub async fn delete<E: LedgerEntry>(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE id = $1 AND user_id = $2", E::TABLE);
    let res = sqlx::query(&sql).bind(id).bind(user_id).execute(db).await?;
    Ok(res.rows_affected() == 1)
}
