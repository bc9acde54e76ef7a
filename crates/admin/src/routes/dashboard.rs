//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use foodloc_api::db::{FoodRepository, OrderRepository, StatsRepository, UserRepository};
use foodloc_core::OrderStatus;
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, render};
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireStaff, take_flash};
use crate::state::AppState;

/// Stores listed as awaiting verification.
const PENDING_STORES_SHOWN: i64 = 10;

#[derive(Debug, Clone)]
pub struct StatusCount {
    pub status: &'static str,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct PendingStore {
    pub id: String,
    pub username: String,
    pub store_name: String,
    pub joined: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub users: i64,
    pub stores: i64,
    pub unverified_stores: i64,
    pub foods: i64,
    pub orders: Vec<StatusCount>,
    pub revenue: String,
    pub pending_stores: Vec<PendingStore>,
}

/// Every status with its count, zero when absent.
fn status_counts(rows: &[(OrderStatus, i64)]) -> Vec<StatusCount> {
    OrderStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: status.as_str(),
            count: rows
                .iter()
                .find(|(s, _)| s == status)
                .map_or(0, |(_, count)| *count),
        })
        .collect()
}

/// `GET /`
#[instrument(skip_all, fields(staff_id = %staff.id))]
pub async fn index(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>> {
    let pool = state.pool();
    let users = UserRepository::new(pool);
    let (user_count, store_count, unverified) = users.counts().await?;
    let pending = users.list_unverified_stores(PENDING_STORES_SHOWN).await?;
    let foods = FoodRepository::new(pool).count_all().await?;
    let orders = OrderRepository::new(pool).count_by_status().await?;
    let revenue = StatsRepository::new(pool).total_revenue().await?;

    let template = DashboardTemplate {
        layout: Layout::new(&staff, "/", take_flash(&session).await),
        users: user_count,
        stores: store_count,
        unverified_stores: unverified,
        foods,
        orders: status_counts(&orders),
        revenue: revenue.round_dp(0).to_string(),
        pending_stores: pending
            .into_iter()
            .map(|u| PendingStore {
                id: u.id.to_string(),
                store_name: u.display_name().to_string(),
                username: u.username,
                joined: u.date_joined.format("%Y-%m-%d").to_string(),
            })
            .collect(),
    };
    Ok(render(&template))
}
