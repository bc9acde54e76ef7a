//! Dish catalog: listing, detail, owner CRUD and customer interactions.

use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use foodloc_core::{FoodId, MenuItemId, Money, Rate, TagId, UserId};

use crate::db::{
    FoodFilter, FoodOrdering, FoodRecord, FoodRepository, InteractionRepository,
    MenuItemRepository, RepositoryError, TagRepository, UserRepository,
};
use crate::cache::CacheKey;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::food::{FoodUpdate, FoodWithMenu, NewFood};
use crate::models::user::User;
use crate::pagination::{self, PageParams, Paginated};
use crate::permissions;
use crate::serializers::{CommentResponse, FoodDetailResponse, FoodResponse, by_id};
use crate::state::AppState;
use crate::validation::{self, MAX_NAME_LENGTH, MAX_TAG_LENGTH};

/// Longest accepted comment.
const MAX_COMMENT_LENGTH: usize = 2000;

/// Filters accepted by `GET /api/foods`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodQuery {
    pub q: Option<String>,
    pub tag: Option<TagId>,
    pub store: Option<UserId>,
    pub menu_item: Option<MenuItemId>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    #[serde(default)]
    pub available_now: bool,
    pub ordering: Option<String>,
}

impl FoodQuery {
    /// Repository filter for the public catalog.
    pub(crate) fn to_filter(&self, state: &AppState) -> Result<(FoodFilter, FoodOrdering)> {
        let ordering = match self.ordering.as_deref().filter(|o| !o.is_empty()) {
            Some(value) => FoodOrdering::parse(value)
                .ok_or_else(|| AppError::BadRequest(format!("unknown ordering `{value}`")))?,
            None => FoodOrdering::default(),
        };
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(AppError::BadRequest(
                "min_price must not exceed max_price".to_string(),
            ));
        }

        let filter = FoodFilter {
            q: self.q.clone(),
            tag: self.tag,
            store: self.store,
            menu_item: self.menu_item,
            min_price: self.min_price,
            max_price: self.max_price,
            available_at: self.available_now.then(|| state.local_time()),
            include_inactive: false,
        };
        Ok((filter, ordering))
    }
}

/// Attach stores and tags to a page of dishes.
pub(crate) async fn expand_foods(
    state: &AppState,
    rows: &[FoodWithMenu],
) -> Result<Vec<FoodResponse>> {
    let mut store_ids: Vec<UserId> = rows.iter().map(|r| r.store_id).collect();
    store_ids.sort_unstable();
    store_ids.dedup();
    let food_ids: Vec<FoodId> = rows.iter().map(|r| r.food.id).collect();

    let stores = by_id(UserRepository::new(state.pool()).get_many(&store_ids).await?);
    let mut tags = TagRepository::new(state.pool()).for_foods(&food_ids).await?;

    Ok(rows
        .iter()
        .map(|row| {
            let food_tags = tags.remove(&row.food.id).unwrap_or_default();
            FoodResponse::new(row, &stores, food_tags, state.media())
        })
        .collect())
}

/// One page of the public catalog for `filter`.
pub(crate) async fn food_page(
    state: &AppState,
    uri: &axum::http::Uri,
    page: PageParams,
    filter: &FoodFilter,
    ordering: FoodOrdering,
) -> Result<Paginated<FoodResponse>> {
    let request = pagination::FOODS.resolve(page)?;
    let foods = FoodRepository::new(state.pool());

    let count = foods.count(filter).await?;
    let rows = foods
        .list(filter, ordering, request.limit(), request.offset())
        .await?;
    let results = expand_foods(state, &rows).await?;

    request.respond(&state.config().base_url, uri, count, results)
}

/// Load a dish and check the caller may see it.
///
/// Disabled dishes, dishes on disabled menus and dishes of inactive or
/// unverified stores are only visible to the owning store.
async fn visible_food(state: &AppState, id: FoodId, viewer: Option<&User>) -> Result<FoodWithMenu> {
    let row = FoodRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found.".to_string()))?;

    let is_owner = viewer.is_some_and(|u| u.id == row.store_id);
    if is_owner || row.is_public() {
        Ok(row)
    } else {
        Err(AppError::NotFound("Not found.".to_string()))
    }
}

/// Load a dish the caller owns.
async fn owned_food(state: &AppState, id: FoodId, user: &User) -> Result<FoodWithMenu> {
    let row = FoodRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found.".to_string()))?;
    permissions::require_owner(user, row.store_id)?;
    Ok(row)
}

/// Check the caller owns `menu_item`.
async fn require_menu_owner(state: &AppState, user: &User, menu_item: MenuItemId) -> Result<()> {
    let menu = MenuItemRepository::new(state.pool())
        .get(menu_item)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("menu item {menu_item} does not exist")))?;
    permissions::require_owner(user, menu.menu.store_id)?;
    Ok(())
}

/// Apply a partial update. Explicit nulls clear the optional columns.
fn merge_update(mut record: FoodRecord, update: FoodUpdate) -> FoodRecord {
    record.name = update.name.unwrap_or(record.name);
    record.price = update.price.unwrap_or(record.price);
    record.active = update.active.unwrap_or(record.active);
    record.start_time = update.start_time.unwrap_or(record.start_time);
    record.end_time = update.end_time.unwrap_or(record.end_time);
    record.description = update.description.unwrap_or(record.description);
    record.content = update.content.unwrap_or(record.content);
    record.image_food = update.image_food.unwrap_or(record.image_food);
    record.menu_item_id = update.menu_item_id.unwrap_or(record.menu_item_id);
    record
}

fn validated_record(mut record: FoodRecord) -> Result<FoodRecord> {
    record.name =
        validation::required_text("name", &record.name, MAX_NAME_LENGTH).map_err(AppError::BadRequest)?;
    record.description =
        validation::optional_text("description", record.description.as_deref(), MAX_NAME_LENGTH)
            .map_err(AppError::BadRequest)?;
    record.image_food =
        validation::optional_text("image_food", record.image_food.as_deref(), MAX_NAME_LENGTH)
            .map_err(AppError::BadRequest)?;
    Ok(record)
}

async fn food_response(state: &AppState, row: &FoodWithMenu) -> Result<FoodResponse> {
    expand_foods(state, std::slice::from_ref(row))
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("expanded dish missing".to_string()))
}

/// `GET /api/foods`
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(page): Query<PageParams>,
    Query(query): Query<FoodQuery>,
) -> Result<Json<Paginated<FoodResponse>>> {
    let (filter, ordering) = query.to_filter(&state)?;
    Ok(Json(food_page(&state, &uri, page, &filter, ordering).await?))
}

/// `POST /api/foods`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(new_food): Json<NewFood>,
) -> Result<(StatusCode, Json<FoodResponse>)> {
    require_menu_owner(&state, &user, new_food.menu_item_id).await?;

    let record = validated_record(FoodRecord {
        name: new_food.name,
        price: new_food.price,
        active: new_food.active,
        start_time: new_food.start_time,
        end_time: new_food.end_time,
        description: new_food.description,
        content: new_food.content,
        image_food: new_food.image_food,
        menu_item_id: new_food.menu_item_id,
    })?;

    // Dish and tags land together or not at all
    let mut tx = state.pool().begin().await.map_err(RepositoryError::from)?;
    let food = FoodRepository::insert(&mut *tx, &record).await?;
    TagRepository::attach(&mut *tx, food.id, &new_food.tags).await?;
    tx.commit().await.map_err(RepositoryError::from)?;
    tracing::info!(food_id = %food.id, "Dish created");

    let row = FoodRepository::new(state.pool())
        .get(food.id)
        .await?
        .ok_or_else(|| AppError::Internal("created dish missing".to_string()))?;
    Ok((StatusCode::CREATED, Json(food_response(&state, &row).await?)))
}

/// `GET /api/foods/{id}`
#[instrument(skip_all, fields(food_id = %id))]
pub async fn show(
    OptionalAuth(viewer): OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<FoodId>,
) -> Result<Json<FoodDetailResponse>> {
    let row = visible_food(&state, id, viewer.as_ref()).await?;
    let interactions = InteractionRepository::new(state.pool());

    let (like_count, rating_avg, rating_count) = interactions.food_stats(id).await?;
    let (liked, rate) = match &viewer {
        Some(user) => {
            let (liked, rate) = interactions.viewer_state(user.id, id).await?;
            (Some(liked), Some(rate))
        }
        None => (None, None),
    };

    Ok(Json(FoodDetailResponse {
        content: row.food.content.clone(),
        food: food_response(&state, &row).await?,
        like_count,
        rating_avg,
        rating_count,
        liked,
        rate,
    }))
}

/// `PATCH /api/foods/{id}`
#[instrument(skip_all, fields(food_id = %id, user_id = %user.id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<FoodId>,
    Json(update): Json<FoodUpdate>,
) -> Result<Json<FoodResponse>> {
    let row = owned_food(&state, id, &user).await?;
    if let Some(menu_item) = update.menu_item_id
        && menu_item != row.food.menu_item_id
    {
        require_menu_owner(&state, &user, menu_item).await?;
    }

    let record = merge_update(FoodRecord::from(&row.food), update);

    let foods = FoodRepository::new(state.pool());
    foods.update(id, &validated_record(record)?).await?;

    let row = foods
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found.".to_string()))?;
    Ok(Json(food_response(&state, &row).await?))
}

/// `DELETE /api/foods/{id}`. 409 once the dish has been ordered.
#[instrument(skip_all, fields(food_id = %id, user_id = %user.id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<FoodId>,
) -> Result<StatusCode> {
    owned_food(&state, id, &user).await?;
    FoodRepository::new(state.pool()).delete(id).await?;
    tracing::info!("Dish deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/foods/{id}/comments`
#[instrument(skip_all, fields(food_id = %id))]
pub async fn comments(
    OptionalAuth(viewer): OptionalAuth,
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<FoodId>,
    Query(page): Query<PageParams>,
) -> Result<Json<Paginated<CommentResponse>>> {
    visible_food(&state, id, viewer.as_ref()).await?;
    let request = pagination::DEFAULT.resolve(page)?;
    let interactions = InteractionRepository::new(state.pool());

    let count = interactions.count_comments(id).await?;
    let rows = interactions
        .list_comments(id, request.limit(), request.offset())
        .await?;

    let mut author_ids: Vec<UserId> = rows.iter().map(|c| c.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let authors = by_id(UserRepository::new(state.pool()).get_many(&author_ids).await?);

    let results = rows
        .iter()
        .map(|c| CommentResponse::new(c, authors.get(&c.user_id), state.media()))
        .collect();
    Ok(Json(request.respond(
        &state.config().base_url,
        &uri,
        count,
        results,
    )?))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// Validate comment text.
pub(crate) fn comment_content(request: &CommentRequest) -> Result<String> {
    validation::required_text("content", &request.content, MAX_COMMENT_LENGTH)
        .map_err(AppError::BadRequest)
}

/// `POST /api/foods/{id}/comments`
#[instrument(skip_all, fields(food_id = %id, user_id = %user.id))]
pub async fn add_comment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<FoodId>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    visible_food(&state, id, Some(&user)).await?;
    let content = comment_content(&request)?;

    let comment = InteractionRepository::new(state.pool())
        .create_comment(user.id, id, &content)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse::new(&comment, Some(&user), state.media())),
    ))
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
}

/// `POST /api/foods/{id}/like`. Toggles.
#[instrument(skip_all, fields(food_id = %id, user_id = %user.id))]
pub async fn like(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<FoodId>,
) -> Result<Json<LikeResponse>> {
    visible_food(&state, id, Some(&user)).await?;
    let liked = InteractionRepository::new(state.pool())
        .toggle_like(user.id, id)
        .await?;
    Ok(Json(LikeResponse { liked }))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RatingRequest {
    pub rate: Rate,
}

/// `POST /api/foods/{id}/rating`. Replaces any earlier rating.
#[instrument(skip_all, fields(food_id = %id, user_id = %user.id))]
pub async fn rate(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<FoodId>,
    Json(request): Json<RatingRequest>,
) -> Result<Json<RatingRequest>> {
    visible_food(&state, id, Some(&user)).await?;
    InteractionRepository::new(state.pool())
        .rate(user.id, id, request.rate)
        .await?;
    Ok(Json(request))
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagNames {
    pub tags: Vec<String>,
}

/// Trim, validate and dedupe tag names.
fn tag_names(request: &TagNames) -> Result<Vec<String>> {
    let mut names = request
        .tags
        .iter()
        .map(|name| validation::required_text("tags", name, MAX_TAG_LENGTH))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(AppError::BadRequest)?;
    names.sort();
    names.dedup();
    Ok(names)
}

/// `POST /api/foods/{id}/tags`. Creates unknown tags, then attaches all.
#[instrument(skip_all, fields(food_id = %id, user_id = %user.id))]
pub async fn add_tags(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<FoodId>,
    Json(request): Json<TagNames>,
) -> Result<Json<FoodResponse>> {
    let row = owned_food(&state, id, &user).await?;
    let names = tag_names(&request)?;

    let created = TagRepository::new(state.pool()).get_or_create(&names).await?;
    let ids: Vec<TagId> = created.iter().map(|t| t.id).collect();
    {
        let mut conn = state.pool().acquire().await.map_err(RepositoryError::from)?;
        TagRepository::attach(&mut *conn, id, &ids).await?;
    }
    state.cache().invalidate(CacheKey::Tags).await;

    Ok(Json(food_response(&state, &row).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names_are_trimmed_and_deduped() {
        let names = tag_names(&TagNames {
            tags: vec![" spicy ".into(), "vegan".into(), "spicy".into()],
        })
        .unwrap();
        assert_eq!(names, vec!["spicy".to_string(), "vegan".to_string()]);
    }

    #[test]
    fn test_blank_tag_is_rejected() {
        assert!(tag_names(&TagNames {
            tags: vec!["  ".into()]
        })
        .is_err());
    }

    #[test]
    fn test_update_null_clears_and_missing_keeps() {
        let mut dish = crate::models::food::fixtures::food(1, 45_000);
        dish.start_time = chrono::NaiveTime::from_hms_opt(6, 0, 0);
        dish.end_time = chrono::NaiveTime::from_hms_opt(10, 0, 0);
        dish.description = Some("Rare beef".to_string());
        dish.image_food = Some("foods/pho.jpg".to_string());

        let update: FoodUpdate = serde_json::from_str(
            r#"{"start_time":null,"end_time":null,"description":null,"name":"Phở tái"}"#,
        )
        .unwrap();
        let merged = merge_update(FoodRecord::from(&dish), update);
        assert_eq!(merged.name, "Phở tái");
        assert_eq!(merged.start_time, None);
        assert_eq!(merged.end_time, None);
        assert_eq!(merged.description, None);
        assert_eq!(merged.image_food.as_deref(), Some("foods/pho.jpg"));
        assert_eq!(merged.price, dish.price);
    }

    #[test]
    fn test_blank_comment_is_rejected() {
        assert!(comment_content(&CommentRequest {
            content: "   ".into()
        })
        .is_err());
        assert_eq!(
            comment_content(&CommentRequest {
                content: " Ngon ".into()
            })
            .unwrap(),
            "Ngon"
        );
    }
}
