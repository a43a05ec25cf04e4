use axum::{extract::State, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::instrument;

use super::{dto::AnalyticsResponse, repo, services::summarize};
use crate::{
    auth::AuthUser,
    error::AppResult,
    ledger::{Expense, Income},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/analytics/summary", get(summary))
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<AnalyticsResponse>> {
    let (expenses, incomes) = tokio::try_join!(
        repo::points::<Expense>(&state.db, user_id),
        repo::points::<Income>(&state.db, user_id),
    )?;
    Ok(Json(summarize(&expenses, &incomes, OffsetDateTime::now_utc())?))
}
