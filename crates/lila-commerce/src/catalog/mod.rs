//! Catalog types: products, variants, categories.

mod category;
mod product;

pub use category::{Category, CategoryPayload};
pub use product::{Product, ProductCategory, ProductPayload, ProductVariant};
