//! Storage and messaging adapters behind the domain.
pub mod cart_storage;
pub mod events;
pub mod product_repository;

pub use cart_storage::{CartStorage, CartStore, InMemoryCartStorage};
pub use events::EventPublisher;
pub use product_repository::{InMemoryProductRepository, PgProductRepository, ProductRepository};
