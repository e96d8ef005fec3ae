//! # Pricing Reads
//!
//! The request-triggered read path: raw catalog data + one rate snapshot
//! → resolved prices, with no hidden coupling to storage hooks. Each
//! request takes a single snapshot from the Rate Store and uses it for
//! every resolution within that request.

use std::collections::{BTreeMap, BTreeSet};

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use bazaar_core::cart::aggregate;
use bazaar_core::money::Money;
use bazaar_core::rates::resolve;

use crate::error::ApiError;
use crate::state::AppState;

/// Resolved prices for one product.
#[derive(Debug, Serialize)]
pub struct ProductPricesDto {
    pub product_id: String,
    /// Selling price per currency code (minor units).
    pub prices: BTreeMap<String, Money>,
    /// Undiscounted price per currency code (minor units).
    pub full_prices: BTreeMap<String, Money>,
    /// Tracked codes with no usable rate yet.
    pub unresolved: BTreeSet<String>,
}

/// `GET /products/{id}/prices`
pub async fn product_prices(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductPricesDto>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {}", id)))?;

    let (codes, snapshot) = state.db.currencies().snapshot().await?;

    let price = resolve(product.price(), &codes, &snapshot);
    let full_price = resolve(product.full_price(), &codes, &snapshot);

    Ok(Json(ProductPricesDto {
        product_id: product.id,
        prices: price.prices,
        full_prices: full_price.prices,
        unresolved: price.unresolved,
    }))
}

/// Aggregated totals for one cart.
#[derive(Debug, Serialize)]
pub struct CartTotalsDto {
    pub user_id: String,
    pub item_count: usize,
    /// Sum per currency, only where every item resolved.
    pub totals: BTreeMap<String, Money>,
    /// Codes excluded from totals because some item lacks them.
    pub incomplete: BTreeSet<String>,
    /// Tracked codes no item could resolve at all.
    pub unresolved: BTreeSet<String>,
}

/// `GET /carts/{user_id}/totals`
///
/// Resolves every line item against the SAME snapshot, then reduces with
/// the exclude-and-flag aggregation.
pub async fn cart_totals(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<CartTotalsDto>, ApiError> {
    let user = state
        .db
        .users()
        .get_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", user_id)))?;

    let items = state.db.users().cart_items(&user.id).await?;
    let (codes, snapshot) = state.db.currencies().snapshot().await?;

    let mut unresolved = BTreeSet::new();
    let mut item_prices = Vec::with_capacity(items.len());

    for item in &items {
        let product = state
            .db
            .products()
            .get_by_id(&item.product_id)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(format!("Product not found: {}", item.product_id))
            })?;

        let resolution = resolve(product.price(), &codes, &snapshot);
        unresolved.extend(resolution.unresolved);
        item_prices.push(resolution.prices);
    }

    let totals = aggregate(&item_prices);

    Ok(Json(CartTotalsDto {
        user_id: user.id,
        item_count: items.len(),
        totals: totals.totals,
        incomplete: totals.incomplete,
        unresolved,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================
