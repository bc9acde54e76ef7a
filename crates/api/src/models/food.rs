//! Dishes.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};

use foodloc_core::{FoodId, MenuItemId, Money, ServiceWindow, TagId, UserId};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Food {
    pub id: FoodId,
    pub name: String,
    pub price: Money,
    pub active: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub description: Option<String>,
    pub content: Option<String>,
    /// Media key of the dish image.
    pub image_food: Option<String>,
    pub menu_item_id: MenuItemId,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl Food {
    #[must_use]
    pub const fn window(&self) -> ServiceWindow {
        ServiceWindow::new(self.start_time, self.end_time)
    }

    /// Whether the dish can be ordered at local time `at`.
    #[must_use]
    pub fn is_orderable_at(&self, at: NaiveTime) -> bool {
        self.active && self.window().contains(at)
    }
}

/// A dish joined with its menu and owning store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FoodWithMenu {
    #[sqlx(flatten)]
    pub food: Food,
    pub menu_name: String,
    pub menu_active: bool,
    pub store_id: UserId,
    /// Owning store is active and verified.
    pub store_listed: bool,
}

impl FoodWithMenu {
    /// Visible to anyone: the dish, its menu and its store are all live.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        self.food.active && self.menu_active && self.store_listed
    }
}

/// Fields accepted when creating a dish.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFood {
    pub name: String,
    pub price: Money,
    #[serde(default = "default_active")]
    pub active: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_food: Option<String>,
    pub menu_item_id: MenuItemId,
    /// Existing tag ids to attach.
    #[serde(default)]
    pub tags: Vec<TagId>,
}

/// Partial dish update. An absent field is left unchanged; an explicit
/// `null` clears one of the optional columns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodUpdate {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub start_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "present")]
    pub end_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub content: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image_food: Option<Option<String>>,
    pub menu_item_id: Option<MenuItemId>,
}

const fn default_active() -> bool {
    true
}

/// Keeps `null` apart from a missing key: a present field always becomes
/// `Some`, and `#[serde(default)]` covers the missing one.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rust_decimal::Decimal;

    use super::*;

    /// An always-available active dish on menu 1.
    #[allow(clippy::unwrap_used)]
    pub fn food(id: i32, price: i64) -> Food {
        Food {
            id: FoodId::new(id),
            name: format!("Dish {id}"),
            price: Money::new(Decimal::from(price)).unwrap(),
            active: true,
            start_time: None,
            end_time: None,
            description: None,
            content: None,
            image_food: None,
            menu_item_id: MenuItemId::new(1),
            created_date: Utc::now(),
            updated_date: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::fixtures::food;
    use super::*;

    #[test]
    fn test_inactive_dish_is_never_orderable() {
        let mut f = food(1, 30_000);
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert!(f.is_orderable_at(noon));
        f.active = false;
        assert!(!f.is_orderable_at(noon));
    }

    #[test]
    fn test_window_is_respected() {
        let mut f = food(1, 30_000);
        f.start_time = NaiveTime::from_hms_opt(6, 0, 0);
        f.end_time = NaiveTime::from_hms_opt(10, 0, 0);
        assert!(f.is_orderable_at(NaiveTime::from_hms_opt(8, 0, 0).unwrap()));
        assert!(!f.is_orderable_at(NaiveTime::from_hms_opt(18, 0, 0).unwrap()));
    }

    #[test]
    fn test_new_food_defaults_to_active() {
        let parsed: NewFood =
            serde_json::from_str(r#"{"name":"Pho bo","price":"45000","menu_item_id":2}"#).unwrap();
        assert!(parsed.active);
        assert!(parsed.tags.is_empty());
        assert_eq!(parsed.menu_item_id, MenuItemId::new(2));
    }

    #[test]
    fn test_update_null_differs_from_missing() {
        let parsed: FoodUpdate =
            serde_json::from_str(r#"{"start_time":null,"description":null,"content":"Broth"}"#)
                .unwrap();
        assert_eq!(parsed.start_time, Some(None));
        assert_eq!(parsed.description, Some(None));
        assert_eq!(parsed.content, Some(Some("Broth".to_string())));
        assert_eq!(parsed.end_time, None);
        assert_eq!(parsed.image_food, None);

        let parsed: FoodUpdate = serde_json::from_str(r#"{"end_time":"10:30:00"}"#).unwrap();
        assert_eq!(parsed.end_time, Some(NaiveTime::from_hms_opt(10, 30, 0)));
        assert_eq!(parsed.start_time, None);
    }

    #[test]
    fn test_dish_is_public_only_when_store_is_listed() {
        let mut row = FoodWithMenu {
            food: food(1, 30_000),
            menu_name: "Breakfast".to_string(),
            menu_active: true,
            store_id: UserId::new(7),
            store_listed: true,
        };
        assert!(row.is_public());

        row.store_listed = false;
        assert!(!row.is_public());

        row.store_listed = true;
        row.menu_active = false;
        assert!(!row.is_public());

        row.menu_active = true;
        row.food.active = false;
        assert!(!row.is_public());
    }
}
