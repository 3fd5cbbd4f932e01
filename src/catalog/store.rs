use std::sync::Arc;

use crate::models::Product;

/// Holds the full, unfiltered product list for the lifetime of a session.
///
/// The list is fetched once; `generation` identifies the fetch so late
/// completions from an abandoned fetch can be told apart.
#[derive(Debug, Clone)]
pub struct ProductCatalogStore {
    products: Arc<[Product]>,
    generation: u64,
    fetching: bool,
    loaded: bool,
}

impl Default for ProductCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductCatalogStore {
    pub fn new() -> Self {
        Self {
            products: Arc::from(Vec::new()),
            generation: 0,
            fetching: false,
            loaded: false,
        }
    }

    /// Marks a fetch as started. Returns the fetch generation, or `None` when a
    /// fetch already ran or is in flight (exactly one fetch per store).
    pub fn begin_fetch(&mut self) -> Option<u64> {
        if self.fetching || self.loaded {
            return None;
        }
        self.generation += 1;
        self.fetching = true;
        Some(self.generation)
    }

    /// Whether a completion for `generation` should be applied.
    pub fn accepts(&self, generation: u64) -> bool {
        self.fetching && generation == self.generation
    }

    pub fn finish_fetch(&mut self, products: Vec<Product>) {
        self.products = Arc::from(products);
        self.fetching = false;
        self.loaded = true;
    }

    /// Failed fetches leave the catalog empty; there is no retry.
    pub fn fail_fetch(&mut self) {
        self.products = Arc::from(Vec::new());
        self.fetching = false;
        self.loaded = true;
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn find(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.product_id == product_id)
    }
}
