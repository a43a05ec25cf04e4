use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{DeletedResponse, ListResponse, PageInfo},
    input::{EntryPatch, NewEntry},
    query::{ListFilter, ListQuery},
    records::{Expense, Income, LedgerEntry},
    repo,
};
use crate::{
    auth::AuthUser,
    error::{path_not_found, AppError, AppResult},
    state::AppState,
};

/// CRUD routes for one ledger kind, mounted at `base`.
pub fn entry_routes<E: LedgerEntry>(base: &str) -> Router<AppState> {
    Router::new()
        .route(base, get(list_entries::<E>).post(create_entry::<E>))
        .route(
            &format!("{base}/:id"),
            put(update_entry::<E>).delete(delete_entry::<E>),
        )
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(entry_routes::<Expense>("/expenses"))
        .merge(entry_routes::<Income>("/incomes"))
}

fn not_found<E: LedgerEntry>() -> AppError {
    AppError::not_found(format!("{} not found", E::LABEL))
}

#[instrument(skip(state, query), fields(kind = E::LABEL))]
pub async fn list_entries<E: LedgerEntry>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<ListResponse<E>>> {
    let Query(query) = query?;
    let filter = ListFilter::parse(query, E::DATE_FIELD)?;
    let (data, total) = repo::list::<E>(&state.db, user_id, &filter).await?;
    Ok(Json(ListResponse {
        data,
        pagination: PageInfo::new(total, filter.page, filter.limit),
    }))
}

#[instrument(skip(state, body), fields(kind = E::LABEL))]
pub async fn create_entry<E: LedgerEntry>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<E>)> {
    let Json(body) = body?;
    let entry = NewEntry::from_body(&body, E::DATE_FIELD)?;
    let created = repo::create::<E>(&state.db, user_id, entry).await?;
    info!(%user_id, "{} created", E::LABEL);
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, body), fields(kind = E::LABEL))]
pub async fn update_entry<E: LedgerEntry>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<E>> {
    let Path(id) = id.map_err(path_not_found(E::LABEL))?;
    let Json(body) = body?;
    let patch = EntryPatch::from_body(&body, E::DATE_FIELD)?;
    let updated = repo::update::<E>(&state.db, user_id, id, patch)
        .await?
        .ok_or_else(not_found::<E>)?;
    Ok(Json(updated))
}

#[instrument(skip(state), fields(kind = E::LABEL))]
pub async fn delete_entry<E: LedgerEntry>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<DeletedResponse>> {
    let Path(id) = id.map_err(path_not_found(E::LABEL))?;
    if !repo::delete::<E>(&state.db, user_id, id).await? {
        return Err(not_found::<E>());
    }
    info!(%user_id, %id, "{} deleted", E::LABEL);
    Ok(Json(DeletedResponse {
        message: format!("{} deleted", E::LABEL),
    }))
}
