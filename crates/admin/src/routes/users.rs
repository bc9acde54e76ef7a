//! Account management.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use foodloc_api::db::UserRepository;
use foodloc_api::models::user::User;
use foodloc_core::UserId;
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, ListParams, Pager, page_window, render, split_look_ahead};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireStaff, set_flash, take_flash};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub avatar: Option<String>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: &'static str,
    pub is_active: bool,
    /// `Some` for stores only.
    pub is_verified: Option<bool>,
}

impl UserRow {
    fn new(user: User, state: &AppState) -> Self {
        Self {
            id: user.id.to_string(),
            avatar: state.media_url(user.avatar.as_deref()),
            role: user.user_role.as_str(),
            is_verified: user.is_store().then_some(user.is_verify),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email.unwrap_or_default(),
            is_active: user.is_active,
        }
    }
}

#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub layout: Layout,
    pub q: String,
    pub users: Vec<UserRow>,
    pub pager: Pager,
}

/// `GET /users?q=&page=`
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

    let mut users = UserRepository::new(state.pool())
        .search(params.search(), limit, offset)
        .await?;
    let has_next = split_look_ahead(&mut users);

    let template = UsersTemplate {
        layout: Layout::new(&staff, "/users", take_flash(&session).await),
        pager: Pager::new("/users", &[("q", &q)], page, has_next),
        q,
        users: users.into_iter().map(|u| UserRow::new(u, &state)).collect(),
    };
    Ok(render(&template))
}

/// `POST /users/{id}/active`
#[instrument(skip_all, fields(staff_id = %staff.id, user_id = %id))]
pub async fn toggle_active(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
) -> Result<Redirect> {
    if id == staff.id {
        set_flash(&session, "You cannot deactivate your own account.").await;
        return Ok(Redirect::to("/users"));
    }

    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    let user = users.set_active(id, !user.is_active).await?;

    tracing::info!(active = user.is_active, "Account active flag changed");
    let verb = if user.is_active { "activated" } else { "deactivated" };
    set_flash(&session, format!("{} {verb}.", user.username)).await;
    Ok(Redirect::to("/users"))
}

/// `POST /users/{id}/verify`. 404 unless the account is a store.
#[instrument(skip_all, fields(staff_id = %staff.id, user_id = %id))]
pub async fn verify(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
) -> Result<Redirect> {
    let store = UserRepository::new(state.pool())
        .set_verified(id, true)
        .await?;

    tracing::info!("Store verified");
    set_flash(&session, format!("{} is now verified.", store.display_name())).await;
    Ok(Redirect::to("/users"))
}
