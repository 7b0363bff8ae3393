//! Storefront - catalog pricing, carts and checkout drafts

use anyhow::Result;
use std::sync::Arc;
use storefront::adapters::{CartStore, EventPublisher, InMemoryCartStorage, InMemoryProductRepository, PgProductRepository, ProductRepository};
use storefront::api::{router, AppState};
use storefront::Config;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let products: Arc<dyn ProductRepository> = match &config.database_url {
        Some(url) => Arc::new(PgProductRepository::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, products are kept in memory");
            Arc::new(InMemoryProductRepository::new())
        }
    };
    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => { tracing::warn!(error = %e, "NATS unavailable, events will not be published"); None }
        },
        None => None,
    };

    let addr = config.bind_addr();
    let state = AppState {
        products,
        carts: CartStore::new(Arc::new(InMemoryCartStorage::new())),
        events: EventPublisher::new(nats),
        config: Arc::new(config),
    };
    let app = router(state).layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive());

    tracing::info!("Storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
