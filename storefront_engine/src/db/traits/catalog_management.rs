use crate::{
    db_types::{NewProduct, Product, Variation},
    traits::StorefrontDbError,
};

/// Product lookups. Browsing and searching the catalogue is handled elsewhere; the cart and checkout flows only need
/// to resolve product ids and their variations.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement: Clone {
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, StorefrontDbError>;

    /// Returns the active variations of `product_id` whose ids are in `ids`. Ids belonging to other products, or that
    /// do not exist, are silently left out.
    async fn fetch_variations(&self, product_id: i64, ids: &[i64]) -> Result<Vec<Variation>, StorefrontDbError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StorefrontDbError>;

    async fn insert_variation(
        &self,
        product_id: i64,
        category: &str,
        value: &str,
    ) -> Result<Variation, StorefrontDbError>;
}
