//! Session cart persistence.
//!
//! Carts are kept as the serialized JSON array of line snapshots, keyed by
//! session. [`CartStore`] is the only writer: load, reduce, save.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use crate::domain::aggregates::{Cart, CartAction};
use crate::domain::events::{CartEvent, DomainEvent};
use crate::{Result, StorefrontError};

#[async_trait]
pub trait CartStorage: Send + Sync {
    /// A missing session is an empty cart.
    async fn load(&self, session: &str) -> Result<Cart>;
    async fn save(&self, session: &str, cart: &Cart) -> Result<()>;
    async fn remove(&self, session: &str) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryCartStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryCartStorage {
    pub fn new() -> Self { Self::default() }

    /// Stores raw text under `session`, as a browser store would.
    pub async fn put_raw(&self, session: &str, raw: impl Into<String>) {
        self.entries.write().await.insert(session.to_string(), raw.into());
    }
}

#[async_trait]
impl CartStorage for InMemoryCartStorage {
    async fn load(&self, session: &str) -> Result<Cart> {
        let entries = self.entries.read().await;
        let Some(raw) = entries.get(session) else { return Ok(Cart::new()) };
        match serde_json::from_str(raw) {
            Ok(cart) => Ok(cart),
            Err(e) => {
                warn!(session, error = %e, "discarding unreadable cart");
                Ok(Cart::new())
            }
        }
    }

    async fn save(&self, session: &str, cart: &Cart) -> Result<()> {
        let raw = serde_json::to_string(cart)?;
        self.entries.write().await.insert(session.to_string(), raw);
        Ok(())
    }

    async fn remove(&self, session: &str) -> Result<()> {
        self.entries.write().await.remove(session);
        Ok(())
    }
}

#[derive(Clone)]
pub struct CartStore {
    storage: Arc<dyn CartStorage>,
}

impl CartStore {
    pub fn new(storage: Arc<dyn CartStorage>) -> Self { Self { storage } }

    pub async fn get(&self, session: &str) -> Result<Cart> { self.storage.load(session).await }

    /// Applies `action` to the session's cart and persists the result.
    /// Last write wins.
    pub async fn dispatch(&self, session: &str, action: CartAction) -> Result<(Cart, DomainEvent)> {
        let cart = self.storage.load(session).await?;
        if let Some((product_id, sku)) = action.target() {
            if !cart.contains(product_id, sku) { return Err(StorefrontError::CartItemNotFound); }
        }

        let event = cart_event(session, &action);
        let cleared = matches!(action, CartAction::Clear);
        let cart = cart.apply(action);
        if cleared {
            self.storage.remove(session).await?;
        } else {
            self.storage.save(session, &cart).await?;
        }
        debug!(session, lines = cart.line_count(), items = cart.item_count(), "cart updated");
        Ok((cart, DomainEvent::Cart(event)))
    }
}

fn cart_event(session: &str, action: &CartAction) -> CartEvent {
    let session = session.to_string();
    match action {
        CartAction::Add(item) => CartEvent::ItemAdded {
            session, product_id: item.product_id.clone(), sku: item.variant_sku.clone(), quantity: item.quantity,
        },
        CartAction::SetQuantity { product_id, sku, quantity } => CartEvent::QuantityChanged {
            session, product_id: product_id.clone(), sku: sku.clone(), quantity: (*quantity).max(1),
        },
        CartAction::Remove { product_id, sku } => CartEvent::ItemRemoved { session, product_id: product_id.clone(), sku: sku.clone() },
        CartAction::Clear => CartEvent::Cleared { session },
    }
}
