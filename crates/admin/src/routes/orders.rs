//! Order overview.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use foodloc_api::db::{OrderRepository, OrderScope};
use foodloc_api::models::order::Order;
use foodloc_core::OrderStatus;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, Pager, page_window, render, split_look_ahead};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireStaff, take_flash};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderParams {
    pub status: Option<String>,
    pub page: Option<u32>,
}

impl OrderParams {
    /// Parsed status filter; blank means all.
    fn status(&self) -> Result<Option<OrderStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::BadRequest(format!("unknown status '{raw}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub created: String,
    pub buyer: String,
    pub store: String,
    pub receiver: String,
    pub amount: String,
    pub delivery_fee: String,
    pub status: &'static str,
    pub paid: bool,
}

impl From<Order> for OrderRow {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            created: order.created_date.format("%Y-%m-%d %H:%M").to_string(),
            buyer: order.user_id.to_string(),
            store: order.store_id.to_string(),
            receiver: order.receiver_name,
            amount: order.amount.to_string(),
            delivery_fee: order.delivery_fee.to_string(),
            status: order.order_status.as_str(),
            paid: order.payment_status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub statuses: Vec<StatusOption>,
    pub orders: Vec<OrderRow>,
    pub pager: Pager,
}

/// `GET /orders?status=&page=`. Newest first.
#[instrument(skip_all, fields(staff_id = %staff.id))]
pub async fn index(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<OrderParams>,
) -> Result<Html<String>> {
    let status = params.status()?;
    let selected = status.map_or("", |s| s.as_str());
    let page = params.page.unwrap_or(1).max(1);
    let (limit, offset) = page_window(page);

    let mut orders = OrderRepository::new(state.pool())
        .list(OrderScope::All, status, limit, offset)
        .await?;
    let has_next = split_look_ahead(&mut orders);

    let template = OrdersTemplate {
        layout: Layout::new(&staff, "/orders", take_flash(&session).await),
        statuses: OrderStatus::ALL
            .iter()
            .map(|s| StatusOption {
                value: s.as_str(),
                selected: Some(*s) == status,
            })
            .collect(),
        pager: Pager::new("/orders", &[("status", selected)], page, has_next),
        orders: orders.into_iter().map(OrderRow::from).collect(),
    };
    Ok(render(&template))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(status: &str) -> OrderParams {
        OrderParams {
            status: Some(status.to_string()),
            page: None,
        }
    }

    #[test]
    fn test_status_filter() {
        assert!(matches!(params("").status(), Ok(None)));
        assert!(matches!(
            params("ACCEPTED").status(),
            Ok(Some(OrderStatus::Accepted))
        ));
        assert!(matches!(
            params("SHIPPED").status(),
            Err(AppError::BadRequest(_))
        ));
    }
}
