//! Aggregates module
pub mod product;
pub mod cart;
pub mod checkout;

pub use product::{DisplayType, Product, ProductDetails, ProductError, ProductImage, ProductStatus, VariantCombination, VariantDefinition};
pub use cart::{reduce, Cart, CartAction, CartItem};
pub use checkout::{CheckoutDraft, CheckoutError, CheckoutLineItem};
