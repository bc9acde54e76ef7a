//! Comments and store subscriptions.

use chrono::{DateTime, Utc};

use foodloc_core::{CommentId, FoodId, SubscriptionId, UserId};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub user_id: UserId,
    pub food_id: FoodId,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// A user following a store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub follower_id: UserId,
    pub store_id: UserId,
    pub created_date: DateTime<Utc>,
}
