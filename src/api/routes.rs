// Mock backend route table

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .service(
            web::scope("/api")
                .route("/products/list", web::get().to(handlers::list_products))
                .route(
                    "/recommand/demo/{product_id}",
                    web::get().to(handlers::recommend),
                ),
        );
}
