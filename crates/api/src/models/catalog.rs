//! Reference data: tags and payment methods.

use serde::Serialize;

use foodloc_core::{PaymentMethodId, TagId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: String,
    pub active: bool,
}
