//! Client-side catalog pipeline: the fetched product list, category filtering,
//! the infinite-scroll window, single-product selection, and the URL query
//! mapping that persists selection.

pub mod filter;
pub mod query;
pub mod selection;
pub mod store;
pub mod window;

pub use filter::{CategoryFilter, ALL_CATEGORIES};
pub use query::{query_to_state, state_to_query};
pub use selection::{SelectionChange, SelectionState};
pub use store::ProductCatalogStore;
pub use window::{ScrollMetrics, VisibleWindow};
