use indexmap::IndexMap;

use crate::models::Product;

/// Category sentinel meaning "no filtering".
pub const ALL_CATEGORIES: &str = "All";

fn is_unfiltered(category: Option<&str>) -> bool {
    matches!(category, None | Some(ALL_CATEGORIES))
}

/// Pure category filter: positions of the products whose `category_name`
/// equals `category`, in original order. `None` and `"All"` select everything.
pub fn filter_indices(products: &[Product], category: Option<&str>) -> Vec<usize> {
    match category {
        Some(c) if !is_unfiltered(category) => products
            .iter()
            .enumerate()
            .filter(|(_, p)| p.category_name == c)
            .map(|(i, _)| i)
            .collect(),
        _ => (0..products.len()).collect(),
    }
}

/// Distinct category names in first-seen order with their item counts.
pub fn category_counts(products: &[Product]) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for p in products {
        *counts.entry(p.category_name.clone()).or_insert(0) += 1;
    }
    counts
}

/// Memoized filter over a catalog.
///
/// Holds indices into the catalog rather than borrowed products so the
/// filtered view can live next to the store. The cached view is recomputed
/// only when the catalog generation or the category changes.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    key: Option<(u64, Option<String>)>,
    indices: Vec<usize>,
    recomputations: u64,
}

impl CategoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the cached view up to date. Returns `true` when the filtered
    /// list's identity changed (i.e. it was recomputed).
    pub fn refresh(&mut self, products: &[Product], generation: u64, category: Option<&str>) -> bool {
        let key = (generation, category.map(str::to_string));
        if self.key.as_ref() == Some(&key) {
            return false;
        }
        self.indices = filter_indices(products, category);
        self.key = Some(key);
        self.recomputations += 1;
        true
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, products: &[Product], product_id: &str) -> bool {
        self.indices
            .iter()
            .any(|&i| products.get(i).is_some_and(|p| p.product_id == product_id))
    }

    /// Resolve a prefix of the view against the catalog it was computed from.
    pub fn resolve<'a>(&self, products: &'a [Product], limit: usize) -> Vec<&'a Product> {
        self.indices
            .iter()
            .take(limit)
            .filter_map(|&i| products.get(i))
            .collect()
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
