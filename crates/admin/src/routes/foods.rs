//! Dish moderation.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use foodloc_api::db::{FoodFilter, FoodOrdering, FoodRepository};
use foodloc_api::models::food::FoodWithMenu;
use foodloc_core::FoodId;
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, ListParams, Pager, page_window, render, split_look_ahead};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireStaff, set_flash, take_flash};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct FoodRow {
    pub id: String,
    pub name: String,
    pub menu_item: String,
    pub price: String,
    pub created: String,
    pub active: bool,
    pub menu_active: bool,
}

impl From<FoodWithMenu> for FoodRow {
    fn from(row: FoodWithMenu) -> Self {
        Self {
            id: row.food.id.to_string(),
            price: row.food.price.to_string(),
            created: row.food.created_date.format("%Y-%m-%d %H:%M").to_string(),
            active: row.food.active,
            name: row.food.name,
            menu_item: row.menu_name,
            menu_active: row.menu_active,
        }
    }
}

#[derive(Template)]
#[template(path = "foods.html")]
pub struct FoodsTemplate {
    pub layout: Layout,
    pub q: String,
    pub foods: Vec<FoodRow>,
    pub pager: Pager,
}

/// `GET /foods?q=&page=`. Includes disabled dishes and menus.
#[instrument(skip_all, fields(staff_id = %staff.id))]
pub async fn index(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ListParams>,
) -> Result<Html<String>> {
    let q = params.search().unwrap_or_default().to_string();
    let page = params.page();
    let (limit, offset) = page_window(page);

    let filter = FoodFilter {
        q: params.search().map(str::to_string),
        include_inactive: true,
        ..FoodFilter::default()
    };
    let mut foods = FoodRepository::new(state.pool())
        .list(&filter, FoodOrdering::Newest, limit, offset)
        .await?;
    let has_next = split_look_ahead(&mut foods);

    let template = FoodsTemplate {
        layout: Layout::new(&staff, "/foods", take_flash(&session).await),
        pager: Pager::new("/foods", &[("q", &q)], page, has_next),
        q,
        foods: foods.into_iter().map(FoodRow::from).collect(),
    };
    Ok(render(&template))
}

/// `POST /foods/{id}/active`
#[instrument(skip_all, fields(staff_id = %staff.id, food_id = %id))]
pub async fn toggle_active(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<FoodId>,
) -> Result<Redirect> {
    let foods = FoodRepository::new(state.pool());
    let food = foods
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("food {id}")))?
        .food;

    let active = !food.active;
    foods.set_active(id, active).await?;

    tracing::info!(active, "Dish active flag changed");
    let verb = if active { "enabled" } else { "disabled" };
    set_flash(&session, format!("{} {verb}.", food.name)).await;
    Ok(Redirect::to("/foods"))
}
