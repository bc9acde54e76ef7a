//! Revenue statistics for the calling store.
//!
//! Only successful orders count. Periods and years are taken in the
//! marketplace's local time.

use axum::extract::State;
use chrono::Datelike;
use serde::Deserialize;
use tracing::instrument;

use crate::db::stats::{FoodRevenue, RevenueBucket};
use crate::db::{RevenuePeriod, StatsRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Query};
use crate::middleware::RequireAuth;
use crate::permissions;
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevenueQuery {
    pub period: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

/// Resolve `period` and `year`; yearly buckets span every year.
fn revenue_params(query: &RevenueQuery, current_year: i32) -> Result<(RevenuePeriod, Option<i32>)> {
    let period = match query.period.as_deref() {
        None | Some("") => RevenuePeriod::Month,
        Some(value) => RevenuePeriod::parse(value).ok_or_else(|| {
            AppError::BadRequest(format!(
                "unknown period `{value}`, expected month, quarter or year"
            ))
        })?,
    };
    let year = match period {
        RevenuePeriod::Year => None,
        RevenuePeriod::Month | RevenuePeriod::Quarter => {
            Some(query.year.unwrap_or(current_year))
        }
    };
    Ok((period, year))
}

/// `GET /api/stats/revenue`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn revenue(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<Vec<RevenueBucket>>> {
    permissions::require_verified_store(&user)?;
    let (period, year) = revenue_params(&query, state.local_now().year())?;

    let buckets = StatsRepository::new(state.pool())
        .revenue(user.id, period, year, state.utc_offset_minutes())
        .await?;
    Ok(Json(buckets))
}

/// `GET /api/stats/foods`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn foods(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<FoodRevenue>>> {
    permissions::require_verified_store(&user)?;
    let year = query.year.unwrap_or_else(|| state.local_now().year());

    let rows = StatsRepository::new(state.pool())
        .revenue_by_food(user.id, Some(year), state.utc_offset_minutes())
        .await?;
    Ok(Json(rows))
}
