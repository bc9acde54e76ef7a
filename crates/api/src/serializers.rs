//! JSON response shapes.
//!
//! Media columns hold storage keys; responses expose them as absolute URLs
//! under the configured media base URL.

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;

use foodloc_core::{
    CommentId, FoodId, MenuItemId, Money, OrderDetailId, OrderId, OrderStatus, PaymentMethodId,
    SubscriptionId, UserId, UserRole,
};

use crate::models::{
    Comment, FoodWithMenu, MenuItem, MenuItemWithCount, Order, OrderDetailWithFood,
    StoreWithCount, Subscription, Tag, User,
};

/// Join a media key with the media base URL.
#[must_use]
pub fn media_url(base: &str, key: Option<&str>) -> Option<String> {
    let key = key.map(str::trim).filter(|k| !k.is_empty())?;
    if key.starts_with("http://") || key.starts_with("https://") {
        return Some(key.to_string());
    }
    if base.is_empty() {
        return Some(key.to_string());
    }
    Some(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        key.trim_start_matches('/')
    ))
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub name_store: Option<String>,
    pub address: Option<String>,
    pub user_role: UserRole,
    pub is_verify: bool,
    pub date_joined: DateTime<Utc>,
}

impl UserResponse {
    #[must_use]
    pub fn new(user: &User, media: &str) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            avatar: media_url(media, user.avatar.as_deref()),
            name_store: user.name_store.clone(),
            address: user.address.clone(),
            user_role: user.user_role,
            is_verify: user.is_verify,
            date_joined: user.date_joined,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreResponse {
    #[serde(flatten)]
    pub store: UserResponse,
    pub menu_count: i64,
}

impl StoreResponse {
    #[must_use]
    pub fn new(row: &StoreWithCount, media: &str) -> Self {
        Self {
            store: UserResponse::new(&row.store, media),
            menu_count: row.menu_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuItemResponse {
    pub id: MenuItemId,
    pub name: String,
    pub active: bool,
    pub store: UserId,
    pub food_count: i64,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl MenuItemResponse {
    #[must_use]
    pub fn new(menu: &MenuItem, food_count: i64) -> Self {
        Self {
            id: menu.id,
            name: menu.name.clone(),
            active: menu.active,
            store: menu.store_id,
            food_count,
            created_date: menu.created_date,
            updated_date: menu.updated_date,
        }
    }
}

impl From<&MenuItemWithCount> for MenuItemResponse {
    fn from(row: &MenuItemWithCount) -> Self {
        Self::new(&row.menu, row.food_count)
    }
}

/// The menu a dish belongs to, with its store.
#[derive(Debug, Clone, Serialize)]
pub struct MenuSummary {
    pub id: MenuItemId,
    pub name: String,
    pub active: bool,
    pub store: Option<UserResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoodResponse {
    pub id: FoodId,
    pub name: String,
    pub price: Money,
    pub active: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub menu_item: MenuSummary,
    pub tags: Vec<Tag>,
    pub created_date: DateTime<Utc>,
}

impl FoodResponse {
    /// `stores` maps store ids to accounts; a missing entry serializes as
    /// `null`.
    #[must_use]
    pub fn new(
        row: &FoodWithMenu,
        stores: &HashMap<UserId, User>,
        tags: Vec<Tag>,
        media: &str,
    ) -> Self {
        let food = &row.food;
        Self {
            id: food.id,
            name: food.name.clone(),
            price: food.price,
            active: food.active,
            start_time: food.start_time,
            end_time: food.end_time,
            description: food.description.clone(),
            image: media_url(media, food.image_food.as_deref()),
            menu_item: MenuSummary {
                id: food.menu_item_id,
                name: row.menu_name.clone(),
                active: row.menu_active,
                store: stores.get(&row.store_id).map(|s| UserResponse::new(s, media)),
            },
            tags,
            created_date: food.created_date,
        }
    }
}

/// Dish detail with the long description and the caller's own interactions.
#[derive(Debug, Clone, Serialize)]
pub struct FoodDetailResponse {
    #[serde(flatten)]
    pub food: FoodResponse,
    pub content: Option<String>,
    pub like_count: i64,
    pub rating_avg: Option<f64>,
    pub rating_count: i64,
    /// Present only for authenticated callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    /// Present only for authenticated callers; 0 when not rated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<i16>,
}

/// A dish as shown inside an order line.
#[derive(Debug, Clone, Serialize)]
pub struct FoodSummary {
    pub id: FoodId,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetailResponse {
    pub id: OrderDetailId,
    pub unit_price: Money,
    pub quantity: i32,
    pub food: FoodSummary,
}

impl OrderDetailResponse {
    #[must_use]
    pub fn new(row: &OrderDetailWithFood, media: &str) -> Self {
        Self {
            id: row.detail.id,
            unit_price: row.detail.unit_price,
            quantity: row.detail.quantity,
            food: FoodSummary {
                id: row.detail.food_id,
                name: row.food_name.clone(),
                image: media_url(media, row.food_image.as_deref()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub amount: Money,
    pub delivery_fee: Money,
    pub order_status: OrderStatus,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_status: bool,
    pub paymentmethod: PaymentMethodId,
    pub user: UserId,
    pub store: UserId,
    pub order_details: Vec<OrderDetailResponse>,
}

impl OrderResponse {
    #[must_use]
    pub fn new(order: &Order, order_details: Vec<OrderDetailResponse>) -> Self {
        Self {
            id: order.id,
            created_date: order.created_date,
            updated_date: order.updated_date,
            amount: order.amount,
            delivery_fee: order.delivery_fee,
            order_status: order.order_status,
            receiver_name: order.receiver_name.clone(),
            receiver_phone: order.receiver_phone.clone(),
            receiver_address: order.receiver_address.clone(),
            payment_date: order.payment_date,
            payment_status: order.payment_status,
            paymentmethod: order.paymentmethod_id,
            user: order.user_id,
            store: order.store_id,
            order_details,
        }
    }

    /// Attach line items to each order, keeping the order of `orders`.
    #[must_use]
    pub fn many(orders: &[Order], details: &[OrderDetailWithFood], media: &str) -> Vec<Self> {
        let mut by_order: HashMap<OrderId, Vec<OrderDetailResponse>> = HashMap::new();
        for row in details {
            by_order
                .entry(row.detail.order_id)
                .or_default()
                .push(OrderDetailResponse::new(row, media));
        }
        orders
            .iter()
            .map(|o| Self::new(o, by_order.remove(&o.id).unwrap_or_default()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: CommentId,
    pub content: String,
    pub food: FoodId,
    pub user: Option<UserResponse>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl CommentResponse {
    #[must_use]
    pub fn new(comment: &Comment, author: Option<&User>, media: &str) -> Self {
        Self {
            id: comment.id,
            content: comment.content.clone(),
            food: comment.food_id,
            user: author.map(|u| UserResponse::new(u, media)),
            created_date: comment.created_date,
            updated_date: comment.updated_date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub id: SubscriptionId,
    pub follower: Option<UserResponse>,
    pub store: Option<UserResponse>,
    pub created_date: DateTime<Utc>,
}

impl SubscriptionResponse {
    #[must_use]
    pub fn new(sub: &Subscription, users: &HashMap<UserId, User>, media: &str) -> Self {
        Self {
            id: sub.id,
            follower: users
                .get(&sub.follower_id)
                .map(|u| UserResponse::new(u, media)),
            store: users.get(&sub.store_id).map(|u| UserResponse::new(u, media)),
            created_date: sub.created_date,
        }
    }
}

/// Index accounts by id.
#[must_use]
pub fn by_id(users: Vec<User>) -> HashMap<UserId, User> {
    users.into_iter().map(|u| (u.id, u)).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::food::fixtures::food;
    use crate::models::order::OrderDetail;
    use crate::models::user::fixtures::{store, user};

    #[test]
    fn test_media_url() {
        assert_eq!(media_url("https://cdn.x/media/", Some("foods/pho.jpg")).as_deref(),
            Some("https://cdn.x/media/foods/pho.jpg"));
        assert_eq!(media_url("https://cdn.x/media", Some("/a.png")).as_deref(),
            Some("https://cdn.x/media/a.png"));
        assert_eq!(media_url("", Some("a.png")).as_deref(), Some("a.png"));
        assert_eq!(media_url("https://cdn.x", Some("https://other/a.png")).as_deref(),
            Some("https://other/a.png"));
        assert_eq!(media_url("https://cdn.x", Some("  ")), None);
        assert_eq!(media_url("https://cdn.x", None), None);
    }

    #[test]
    fn test_user_response_hides_credentials_and_flags() {
        let mut u = user(1, UserRole::User);
        u.is_staff = true;
        let json = serde_json::to_value(UserResponse::new(&u, "")).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("is_staff").is_none());
        assert_eq!(json["user_role"], "USER");
    }

    #[test]
    fn test_food_response_nests_menu_and_store() {
        let shop = store(7);
        let row = FoodWithMenu {
            food: food(3, 45_000),
            menu_name: "Breakfast".to_string(),
            menu_active: true,
            store_id: shop.id,
            store_listed: true,
        };
        let stores = by_id(vec![shop]);
        let json = serde_json::to_value(FoodResponse::new(&row, &stores, vec![], "")).unwrap();
        assert_eq!(json["price"], "45000");
        assert_eq!(json["menu_item"]["name"], "Breakfast");
        assert_eq!(json["menu_item"]["store"]["name_store"], "Store 7");
    }

    #[test]
    fn test_detail_omits_viewer_fields_for_anonymous() {
        let row = FoodWithMenu {
            food: food(3, 45_000),
            menu_name: "Lunch".to_string(),
            menu_active: true,
            store_id: UserId::new(7),
            store_listed: true,
        };
        let detail = FoodDetailResponse {
            food: FoodResponse::new(&row, &HashMap::new(), vec![], ""),
            content: None,
            like_count: 0,
            rating_avg: None,
            rating_count: 0,
            liked: None,
            rate: None,
        };
        let json = serde_json::to_value(detail).unwrap();
        assert!(json.get("liked").is_none());
        assert!(json.get("rate").is_none());
        assert!(json["menu_item"]["store"].is_null());
    }

    #[test]
    fn test_orders_get_their_own_details() {
        let order = |id: i32| Order {
            id: OrderId::new(id),
            created_date: Utc::now(),
            updated_date: Utc::now(),
            amount: Money::ZERO,
            delivery_fee: Money::ZERO,
            order_status: OrderStatus::Pending,
            receiver_name: "Lan".to_string(),
            receiver_phone: "0901234567".to_string(),
            receiver_address: "1 Le Loi".to_string(),
            payment_date: None,
            payment_status: false,
            paymentmethod_id: PaymentMethodId::new(1),
            user_id: UserId::new(1),
            store_id: UserId::new(2),
        };
        let detail = |id: i32, order_id: i32| OrderDetailWithFood {
            detail: OrderDetail {
                id: OrderDetailId::new(id),
                order_id: OrderId::new(order_id),
                food_id: FoodId::new(1),
                unit_price: Money::ZERO,
                quantity: 1,
            },
            food_name: "Pho".to_string(),
            food_image: None,
        };

        let responses = OrderResponse::many(
            &[order(2), order(1)],
            &[detail(1, 1), detail(2, 2), detail(3, 2)],
            "",
        );
        assert_eq!(responses[0].id, OrderId::new(2));
        assert_eq!(responses[0].order_details.len(), 2);
        assert_eq!(responses[1].order_details.len(), 1);
    }
}
