// Mock recommendation backend
// Serves the catalog and recommendation endpoints from a fixture file so the
// client can be exercised without the real image-analysis service.

pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::MockServer;
