//! Tags and payment methods.
//!
//! The API caches both lists for a few minutes, so changes made here show up
//! there once its cache entry expires.

use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, Redirect},
};
use foodloc_api::db::{PaymentMethodRepository, RepositoryError, TagRepository};
use foodloc_api::models::catalog::{PaymentMethod, Tag};
use foodloc_api::validation::{self, MAX_NAME_LENGTH, MAX_TAG_LENGTH};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, render};
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireStaff, set_flash, take_flash};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "tags.html")]
pub struct TagsTemplate {
    pub layout: Layout,
    pub tags: Vec<Tag>,
}

#[derive(Template)]
#[template(path = "payment_methods.html")]
pub struct PaymentMethodsTemplate {
    pub layout: Layout,
    pub methods: Vec<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
pub struct TagForm {
    pub name: String,
}

/// HTML checkboxes are only sent when ticked.
#[derive(Debug, Deserialize)]
pub struct PaymentMethodForm {
    pub name: String,
    pub active: Option<String>,
}

/// `GET /tags`
#[instrument(skip_all, fields(staff_id = %staff.id))]
pub async fn tags(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>> {
    let tags = TagRepository::new(state.pool()).list().await?;
    Ok(render(&TagsTemplate {
        layout: Layout::new(&staff, "/tags", take_flash(&session).await),
        tags,
    }))
}

/// `POST /tags`
#[instrument(skip_all, fields(staff_id = %staff.id))]
pub async fn create_tag(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<TagForm>,
) -> Result<Redirect> {
    let name = match validation::required_text("name", &form.name, MAX_TAG_LENGTH) {
        Ok(name) => name,
        Err(msg) => {
            set_flash(&session, msg).await;
            return Ok(Redirect::to("/tags"));
        }
    };

    match TagRepository::new(state.pool()).create(&name).await {
        Ok(tag) => {
            tracing::info!(tag_id = %tag.id, "Tag created");
            set_flash(&session, format!("Tag '{}' created.", tag.name)).await;
        }
        Err(RepositoryError::Conflict(msg)) => set_flash(&session, msg).await,
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/tags"))
}

/// `GET /payment-methods`. Includes disabled methods.
#[instrument(skip_all, fields(staff_id = %staff.id))]
pub async fn payment_methods(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>> {
    let methods = PaymentMethodRepository::new(state.pool()).list(true).await?;
    Ok(render(&PaymentMethodsTemplate {
        layout: Layout::new(&staff, "/payment-methods", take_flash(&session).await),
        methods,
    }))
}

/// `POST /payment-methods`. Creates the method or updates the one with the
/// same name.
#[instrument(skip_all, fields(staff_id = %staff.id))]
pub async fn save_payment_method(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PaymentMethodForm>,
) -> Result<Redirect> {
    let name = match validation::required_text("name", &form.name, MAX_NAME_LENGTH) {
        Ok(name) => name,
        Err(msg) => {
            set_flash(&session, msg).await;
            return Ok(Redirect::to("/payment-methods"));
        }
    };

    let method = PaymentMethodRepository::new(state.pool())
        .upsert(&name, form.active.is_some())
        .await?;
    tracing::info!(payment_method_id = %method.id, active = method.active, "Payment method saved");
    set_flash(&session, format!("Payment method '{}' saved.", method.name)).await;
    Ok(Redirect::to("/payment-methods"))
}
