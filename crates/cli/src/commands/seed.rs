//! Reference data seeding.
//!
//! Safe to run repeatedly: existing payment methods keep their active flag and
//! existing tags are left alone.

use foodloc_api::db::{PaymentMethodRepository, TagRepository};
use foodloc_api::models::catalog::PaymentMethod;

use super::{CliError, connect};

pub const DEFAULT_PAYMENT_METHODS: &[&str] = &["Cash on delivery", "Bank transfer", "E-wallet"];

pub const DEFAULT_TAGS: &[&str] = &[
    "rice",
    "noodles",
    "banh mi",
    "drinks",
    "dessert",
    "vegetarian",
    "fast food",
];

/// Defaults not present in `existing`, compared case-insensitively.
#[must_use]
pub fn missing_payment_methods<'a>(existing: &[PaymentMethod], defaults: &[&'a str]) -> Vec<&'a str> {
    defaults
        .iter()
        .copied()
        .filter(|name| !existing.iter().any(|m| m.name.eq_ignore_ascii_case(name)))
        .collect()
}

/// Insert default payment methods and tags.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or a write fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    let methods = PaymentMethodRepository::new(&pool);
    let existing = methods.list(true).await?;
    let missing = missing_payment_methods(&existing, DEFAULT_PAYMENT_METHODS);
    for name in &missing {
        let method = methods.upsert(name, true).await?;
        tracing::info!(payment_method_id = %method.id, name = %method.name, "Payment method added");
    }

    let names: Vec<String> = DEFAULT_TAGS.iter().map(|t| (*t).to_string()).collect();
    let tags = TagRepository::new(&pool).get_or_create(&names).await?;

    tracing::info!(
        payment_methods_added = missing.len(),
        tags = tags.len(),
        "Seed complete"
    );
    Ok(())
}
