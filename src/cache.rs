use indexmap::IndexMap;

use crate::models::RecommendationResult;

pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Last successful recommendation answer per product, used as the fallback
/// when a later call for the same product times out.
///
/// Oldest-inserted entries are evicted first; re-inserting a product moves it
/// to the back.
#[derive(Debug, Clone)]
pub struct ResultCache {
    entries: IndexMap<String, Vec<RecommendationResult>>,
    capacity: usize,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ResultCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&mut self, product_id: &str, results: Vec<RecommendationResult>) {
        self.entries.shift_remove(product_id);
        while self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(product_id.to_string(), results);
    }

    pub fn get(&self, product_id: &str) -> Option<&[RecommendationResult]> {
        self.entries.get(product_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str) -> RecommendationResult {
        RecommendationResult {
            product_id: id.into(),
            title: id.into(),
            price: 1.0,
            image_url: String::new(),
            product_link: String::new(),
            similarity_score: None,
        }
    }

    #[test]
    fn evicts_oldest_insert() {
        let mut cache = ResultCache::with_capacity(2);
        cache.insert("a", vec![result("ra")]);
        cache.insert("b", vec![]);
        cache.insert("a", vec![result("ra2")]);
        cache.insert("c", vec![]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a").unwrap()[0].title, "ra2");
        assert_eq!(cache.get("c"), Some(&[][..]));
    }
}
