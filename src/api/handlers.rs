// HTTP handlers for the mock backend

use crate::api::models::{ApiResponse, HealthResponse};
use crate::catalog::filter::category_counts;
use crate::fixture::Fixture;
use actix_web::{web, HttpResponse, Result};

pub async fn health_check(fixture: web::Data<Fixture>) -> Result<HttpResponse> {
    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        products: fixture.products.len(),
        categories: category_counts(&fixture.products).len(),
    });
    Ok(HttpResponse::Ok().json(response))
}

/// `GET /api/products/list`: the full catalog, unpaginated.
pub async fn list_products(fixture: web::Data<Fixture>) -> Result<HttpResponse> {
    tracing::debug!(count = fixture.products.len(), "product list requested");
    Ok(HttpResponse::Ok().json(&fixture.products))
}

/// `GET /api/recommand/demo/{product_id}`
pub async fn recommend(
    path: web::Path<String>,
    fixture: web::Data<Fixture>,
) -> Result<HttpResponse> {
    let product_id = path.into_inner();
    match fixture.recommendations_for(&product_id) {
        Some(results) => {
            tracing::info!(product_id = %product_id, count = results.len(), "recommendations served");
            Ok(HttpResponse::Ok().json(results))
        }
        None => {
            tracing::warn!(product_id = %product_id, "recommendation requested for unknown product");
            Ok(HttpResponse::NotFound()
                .json(ApiResponse::<()>::error(format!("unknown product {product_id}"))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::configure_routes;
    use crate::fixture::tests::sample;
    use crate::models::{Product, RecommendationResult};
    use actix_web::{test, App};

    #[actix_web::test]
    async fn serves_catalog_as_bare_array() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(sample()))
                .configure(configure_routes),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/products/list").to_request();
        let products: Vec<Product> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(products.len(), 3);
    }

    #[actix_web::test]
    async fn known_and_unknown_products() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(sample()))
                .configure(configure_routes),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/recommand/demo/AKA3CA001")
            .to_request();
        let results: Vec<RecommendationResult> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(results[0].product_id, "SIM-1");

        let req = test::TestRequest::get()
            .uri("/api/recommand/demo/no%20such")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }
}
