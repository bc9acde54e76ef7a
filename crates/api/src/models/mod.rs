//! Domain models for the marketplace.
//!
//! Row types decoded straight from `PostgreSQL` with `sqlx::FromRow`. Response
//! shapes live in [`crate::serializers`].

pub mod catalog;
pub mod food;
pub mod interaction;
pub mod menu;
pub mod order;
pub mod session;
pub mod user;

pub use catalog::{PaymentMethod, Tag};
pub use food::{Food, FoodWithMenu};
pub use interaction::{Comment, Subscription};
pub use menu::{MenuItem, MenuItemWithCount};
pub use order::{Order, OrderDetail, OrderDetailWithFood};
pub use session::CurrentUser;
pub use user::{StoreWithCount, User};
