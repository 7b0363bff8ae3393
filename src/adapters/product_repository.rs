//! Product persistence. Each product is stored whole, as the same camelCase
//! document the API serves.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use crate::domain::aggregates::Product;
use crate::Result;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Product>>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Product>>;
    async fn save(&self, product: Product) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn get(&self, id: &str) -> Result<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then_with(|| a.id().cmp(b.id())));
        Ok(all)
    }

    async fn save(&self, product: Product) -> Result<()> {
        let mut products = self.products.write().await;
        products.insert(product.id().to_string(), product);
        Ok(())
    }
}

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// Connects and applies pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| crate::StorefrontError::StorageError(e.to_string()))?;
        info!("product store migrated");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn get(&self, id: &str) -> Result<Option<Product>> {
        let doc = sqlx::query_scalar::<_, Json<Product>>("SELECT document FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc.map(|Json(p)| p))
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let docs = sqlx::query_scalar::<_, Json<Product>>("SELECT document FROM products ORDER BY created_at DESC, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(docs.into_iter().map(|Json(p)| p).collect())
    }

    async fn save(&self, product: Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, document, status, created_at, updated_at) VALUES ($1, $2, $3, $4, NOW()) \
             ON CONFLICT (id) DO UPDATE SET document = EXCLUDED.document, status = EXCLUDED.status, updated_at = NOW()",
        )
        .bind(product.id())
        .bind(Json(&product))
        .bind(product.status().as_str())
        .bind(product.created_at())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{ProductDetails, VariantCombination};
    use crate::domain::value_objects::{Sku, VariantOption};
    use rust_decimal::Decimal;

    fn product(id: &str) -> Product {
        let v = VariantCombination::new(Sku::new(format!("{id}-1")).unwrap(), Decimal::TEN, vec![VariantOption::new("Size", "M")]);
        let details = ProductDetails { id: Some(id.into()), name: id.into(), slug: id.into(), description: "desc".into(), ..Default::default() };
        Product::create(details, vec![v], vec![]).unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let repo = InMemoryProductRepository::new();
        repo.save(product("a")).await.unwrap();
        repo.save(product("b")).await.unwrap();
        assert_eq!(repo.get("a").await.unwrap().unwrap().name(), "a");
        assert!(repo.get("zzz").await.unwrap().is_none());
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_replaces_existing() {
        let repo = InMemoryProductRepository::new();
        repo.save(product("a")).await.unwrap();
        let mut next = product("a");
        next.apply_discount(Some(crate::domain::value_objects::Discount::fixed(Decimal::ONE)));
        repo.save(next).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);
        assert!(repo.get("a").await.unwrap().unwrap().discount().is_some());
    }
}
