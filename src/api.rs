//! HTTP surface.

use axum::{extract::{Path, Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post}, Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use crate::adapters::{CartStore, EventPublisher, ProductRepository};
use crate::config::Config;
use crate::domain::aggregates::{Cart, CartAction, CartItem, CheckoutDraft, CheckoutError, Product, ProductStatus, VariantCombination};
use crate::domain::services::{stock_report, PriceQuote, StockReport, VariantSelection};
use crate::domain::submission::ProductSubmission;
use crate::domain::value_objects::{Sku, VariantOption};
use crate::{Result, StorefrontError};

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductRepository>,
    pub carts: CartStore,
    pub events: EventPublisher,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }))
        .route("/api/v1/products", get(list_products).post(submit_product))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/products/:id/quote", get(quote_product))
        .route("/api/v1/products/:id/variants/match", post(match_variant))
        .route("/api/v1/products/:id/variants/select", post(select_variant))
        .route("/api/v1/products/:id/options/:axis", get(available_options))
        .route("/api/v1/cart/:session", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/:session/items", post(add_cart_item).patch(update_cart_item).delete(remove_cart_item))
        .route("/api/v1/checkout/:session", post(checkout))
        .route("/api/v1/reports/stock", get(stock))
        .with_state(state)
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ProductNotFound | Self::VariantNotFound | Self::CartItemNotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::Checkout(CheckoutError::EmptyCart | CheckoutError::InvalidAmount) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::VariantUnavailable(_) | Self::Checkout(_) => StatusCode::CONFLICT,
            Self::Config(_) | Self::StorageError(_) => {
                error!(error = %self, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

fn parse_sku(raw: &str) -> Result<Sku> {
    Sku::new(raw).map_err(|e| StorefrontError::Validation(format!("sku: {e}")))
}

async fn load_product(s: &AppState, id: &str) -> Result<Product> {
    s.products.get(id).await?.ok_or(StorefrontError::ProductNotFound)
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Deserialize)] pub struct ListParams { pub status: Option<ProductStatus> }

async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<Vec<Product>>> {
    let mut products = s.products.list().await?;
    if let Some(status) = p.status { products.retain(|prod| prod.status() == status); }
    Ok(Json(products))
}

async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    load_product(&s, &id).await.map(Json)
}

async fn submit_product(State(s): State<AppState>, Json(r): Json<ProductSubmission>) -> Result<(StatusCode, Json<Product>)> {
    let mut product = r.into_product(Utc::now())?;
    let existing = s.products.get(product.id()).await?;
    if let Some(previous) = &existing { product.carry_over(previous); }
    let events = product.take_events();
    s.products.save(product.clone()).await?;
    info!(product_id = product.id(), updated = existing.is_some(), "product saved");
    s.events.publish_all(events).await;
    let status = if existing.is_some() { StatusCode::OK } else { StatusCode::CREATED };
    Ok((status, Json(product)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub product_id: String,
    pub sku: Sku,
    pub available: bool,
    #[serde(flatten)]
    pub quote: PriceQuote,
    pub stock: StockView,
}

/// Product-level inventory shown next to a quote.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockView {
    pub in_stock: bool,
    pub low_stock: bool,
    pub total_stock: u64,
    pub has_variants: bool,
    pub price_from: Decimal,
    pub price_to: Decimal,
}

impl StockView {
    fn new(product: &Product) -> Self {
        let (price_from, price_to) = product.price_range();
        Self {
            in_stock: product.is_in_stock(),
            low_stock: product.is_low_stock(),
            total_stock: product.total_stock(),
            has_variants: product.has_variants(),
            price_from,
            price_to,
        }
    }
}

impl QuoteResponse {
    fn new(s: &AppState, product: &Product, variant: &VariantCombination) -> Self {
        Self {
            product_id: product.id().to_string(),
            sku: variant.sku.clone(),
            available: variant.is_available(),
            quote: s.config.pricing_policy().quote(product, variant, Utc::now()),
            stock: StockView::new(product),
        }
    }
}

#[derive(Debug, Deserialize)] pub struct QuoteParams { pub sku: Option<String> }

async fn quote_product(State(s): State<AppState>, Path(id): Path<String>, Query(p): Query<QuoteParams>) -> Result<Json<QuoteResponse>> {
    let product = load_product(&s, &id).await?;
    let variant = match p.sku.as_deref().filter(|sku| !sku.trim().is_empty()) {
        Some(sku) => product.variant_by_sku(sku),
        None => product.effective_variant(),
    };
    let variant = variant.ok_or(StorefrontError::VariantNotFound)?;
    Ok(Json(QuoteResponse::new(&s, &product, variant)))
}

#[derive(Debug, Deserialize)] pub struct MatchRequest { pub options: Vec<VariantOption> }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub variant: VariantCombination,
    #[serde(flatten)]
    pub quote: QuoteResponse,
}

async fn match_variant(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<MatchRequest>) -> Result<Json<MatchResponse>> {
    let product = load_product(&s, &id).await?;
    let variant = product.find_variant(&r.options).ok_or(StorefrontError::VariantNotFound)?;
    let quote = QuoteResponse::new(&s, &product, variant);
    Ok(Json(MatchResponse { variant: variant.clone(), quote }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest { pub sku: Option<String>, pub axis: String, pub value: String }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectResponse {
    pub selection: VariantSelection,
    /// False when the new combination matched nothing and the prior selection was kept.
    pub changed: bool,
    #[serde(flatten)]
    pub quote: Option<PriceQuote>,
}

/// Changes one option axis on top of the current selection (or the
/// effective variant when none is given).
async fn select_variant(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<SelectRequest>) -> Result<Json<SelectResponse>> {
    let product = load_product(&s, &id).await?;
    let current = match r.sku.as_deref() {
        Some(sku) => product.variant_by_sku(sku).map(VariantSelection::for_variant),
        None => VariantSelection::initial(product.variants()),
    };
    let mut selection = current.ok_or(StorefrontError::VariantNotFound)?;
    let changed = selection.choose(product.variants(), &r.axis, &r.value);
    let quote = s.config.pricing_policy().quote_selected(&product, Some(&selection), Utc::now());
    Ok(Json(SelectResponse { selection, changed, quote }))
}

#[derive(Debug, Serialize)] pub struct OptionsResponse { pub axis: String, pub values: Vec<String> }

async fn available_options(State(s): State<AppState>, Path((id, axis)): Path<(String, String)>) -> Result<Json<OptionsResponse>> {
    let product = load_product(&s, &id).await?;
    let values = product.available_options(&axis);
    Ok(Json(OptionsResponse { axis, values }))
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub line_count: usize,
    pub subtotal: Decimal,
    pub currency: String,
}

impl CartView {
    fn new(cart: Cart, currency: &str) -> Self {
        let subtotal = cart.subtotal(currency);
        Self {
            item_count: cart.item_count(),
            line_count: cart.line_count(),
            subtotal: subtotal.amount(),
            currency: subtotal.currency().to_string(),
            items: cart.items().to_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRequest { pub product_id: String, pub sku: String, pub quantity: Option<u32> }

async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<CartView>> {
    let cart = s.carts.get(&session).await?;
    Ok(Json(CartView::new(cart, &s.config.currency)))
}

async fn add_cart_item(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<CartLineRequest>) -> Result<(StatusCode, Json<CartView>)> {
    let product = load_product(&s, &r.product_id).await?;
    let variant = product.variant_by_sku(&r.sku).ok_or(StorefrontError::VariantNotFound)?;
    if !variant.can_purchase() {
        warn!(product_id = product.id(), sku = %variant.sku, "add to cart refused");
        return Err(StorefrontError::VariantUnavailable(variant.sku.to_string()));
    }
    let item = CartItem::snapshot(&product, variant).with_quantity(r.quantity.unwrap_or(1));
    let (cart, event) = s.carts.dispatch(&session, CartAction::Add(item)).await?;
    s.events.publish_all(vec![event]).await;
    Ok((StatusCode::CREATED, Json(CartView::new(cart, &s.config.currency))))
}

async fn update_cart_item(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<CartLineRequest>) -> Result<Json<CartView>> {
    let quantity = r.quantity.ok_or_else(|| StorefrontError::Validation("quantity is required".into()))?;
    let action = CartAction::SetQuantity { product_id: r.product_id, sku: parse_sku(&r.sku)?, quantity };
    let (cart, event) = s.carts.dispatch(&session, action).await?;
    s.events.publish_all(vec![event]).await;
    Ok(Json(CartView::new(cart, &s.config.currency)))
}

async fn remove_cart_item(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<CartLineRequest>) -> Result<Json<CartView>> {
    let action = CartAction::Remove { product_id: r.product_id, sku: parse_sku(&r.sku)? };
    let (cart, event) = s.carts.dispatch(&session, action).await?;
    s.events.publish_all(vec![event]).await;
    Ok(Json(CartView::new(cart, &s.config.currency)))
}

async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<StatusCode> {
    let (_, event) = s.carts.dispatch(&session, CartAction::Clear).await?;
    s.events.publish_all(vec![event]).await;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Checkout & reports
// =============================================================================

async fn checkout(State(s): State<AppState>, Path(session): Path<String>) -> Result<(StatusCode, Json<CheckoutDraft>)> {
    let cart = s.carts.get(&session).await?;
    let policy = s.config.pricing_policy();
    let now = Utc::now();
    let mut draft = CheckoutDraft::create(session.as_str(), &s.config.currency, &s.config.app_url);
    for line in cart.items() {
        let product = s.products.get(&line.product_id).await?;
        draft.add_line(line, product.as_ref(), &policy, now)?;
    }
    draft.finalize()?;
    info!(checkout_id = draft.id(), %session, subtotal = %draft.subtotal().amount(), "checkout drafted");
    s.events.publish_all(draft.take_events()).await;
    Ok((StatusCode::CREATED, Json(draft)))
}

#[derive(Debug, Deserialize)] pub struct StockParams { pub threshold: Option<u32> }

async fn stock(State(s): State<AppState>, Query(p): Query<StockParams>) -> Result<Json<StockReport>> {
    let products = s.products.list().await?;
    Ok(Json(stock_report(&products, p.threshold)))
}
