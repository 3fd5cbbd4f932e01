use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpResponse, HttpServer};
use lookfinder::api::MockServer;
use lookfinder::cli::apply_preferences;
use lookfinder::driver::MemoryNavigator;
use lookfinder::fixture::Fixture;
use lookfinder::models::NoticeKind;
use lookfinder::prefs::{MemoryPreferenceStore, PreferenceStore};
use lookfinder::{
    CatalogApi, ClientConfig, ClientError, HttpCatalogClient, Phase, Product,
    RecommendationResult, SessionDriver,
};

fn product(id: &str, name: &str, category: &str) -> Product {
    Product {
        product_id: id.into(),
        product_name: name.into(),
        price: 59000.0,
        image_url: format!("https://img.example.com/{id}.jpg"),
        category_name: category.into(),
    }
}

fn fixture() -> Fixture {
    let mut recommendations = HashMap::new();
    recommendations.insert(
        "CT001".to_string(),
        vec![RecommendationResult {
            product_id: "SIM-CT".into(),
            title: "울 블렌드 코트".into(),
            price: 129000.0,
            image_url: "https://img.example.com/sim-ct.jpg".into(),
            product_link: "https://shop.example.com/p/SIM-CT".into(),
            similarity_score: Some(0.87),
        }],
    );
    Fixture {
        products: vec![
            product("AKA3CA001", "린넨 블라우스", "블라우스"),
            product("CT001", "핸드메이드 코트", "코트"),
            product("CT002", "트렌치 코트", "코트"),
        ],
        recommendations,
    }
}

fn start(token: Option<&str>) -> (ServerHandle, String) {
    let server = MockServer {
        host: "127.0.0.1".into(),
        port: 0,
        api_token: token.map(str::to_string),
        ..MockServer::default()
    };
    let (server, addr) = server.bind(fixture()).expect("bind mock server");
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (handle, format!("http://{addr}"))
}

/// Backend whose recommendation endpoint answers 200 with an HTML error page.
fn start_garbled() -> (ServerHandle, String) {
    let server = HttpServer::new(|| {
        App::new()
            .route(
                "/api/products/list",
                web::get().to(|| async { HttpResponse::Ok().json(fixture().products) }),
            )
            .route(
                "/api/recommand/demo/{product_id}",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("application/json")
                        .body("<html>gateway hiccup</html>")
                }),
            )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind garbled server");
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (handle, format!("http://{addr}"))
}

fn client(base_url: &str, token: Option<&str>) -> HttpCatalogClient {
    let mut cfg = ClientConfig::default().with_base_url(base_url);
    cfg.api_token = token.map(str::to_string);
    HttpCatalogClient::new(&cfg).expect("client")
}

#[actix_web::test]
async fn http_client_reads_catalog_and_recommendations() {
    let (server, base_url) = start(None);
    let api = client(&base_url, None);

    let products = api.fetch_products().await.unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products[0].category_name, "블라우스");

    let similar = api.fetch_recommendations("CT001").await.unwrap();
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].similarity_score, Some(0.87));

    // Known product without canned answer
    assert!(api.fetch_recommendations("CT002").await.unwrap().is_empty());

    match api.fetch_recommendations("NOPE").await {
        Err(ClientError::Http { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected 404, got {other:?}"),
    }

    server.stop(true).await;
}

#[actix_web::test]
async fn bearer_token_is_enforced() {
    let (server, base_url) = start(Some("s3cret"));

    match client(&base_url, None).fetch_products().await {
        Err(ClientError::Http { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected 401, got {other:?}"),
    }
    let products = client(&base_url, Some("s3cret"))
        .fetch_products()
        .await
        .unwrap();
    assert_eq!(products.len(), 3);

    server.stop(true).await;
}

#[actix_web::test]
async fn session_runs_end_to_end_against_mock_backend() {
    let (server, base_url) = start(None);
    let api: Arc<dyn CatalogApi> = Arc::new(client(&base_url, None));
    let navigator = MemoryNavigator::default();
    let (handle, join) = SessionDriver::spawn(
        lookfinder::CatalogSession::from_query("cat=%EC%BD%94%ED%8A%B8"),
        api,
        Duration::from_secs(5),
        (),
        navigator.clone(),
    );

    let ready = handle.settle().await.unwrap();
    assert_eq!(ready.phase, Phase::Ready);
    assert_eq!(ready.category.as_deref(), Some("코트"));
    assert_eq!(ready.filtered_len, 2);

    handle.toggle_product("CT001").unwrap();
    handle.scan().unwrap();
    let done = handle.settle().await.unwrap();
    assert_eq!(done.phase, Phase::Results);
    let outcome = done.results.expect("results");
    assert_eq!(outcome.category, "코트");
    assert!(!outcome.from_cache);
    assert_eq!(outcome.results[0].product_id, "SIM-CT");
    assert_eq!(navigator.current().as_deref(), Some("cat=%EC%BD%94%ED%8A%B8&pid=CT001"));

    handle.shutdown().unwrap();
    join.await.unwrap();
    server.stop(true).await;
}

#[actix_web::test]
async fn saved_token_authorizes_requests() {
    let (server, base_url) = start(Some("s3cret"));
    let store = MemoryPreferenceStore::default();
    store
        .update(&mut |p| p.auth_token = Some("s3cret".into()))
        .unwrap();

    let cfg = apply_preferences(ClientConfig::default().with_base_url(&base_url), &store);
    let api = HttpCatalogClient::new(&cfg).unwrap();
    assert_eq!(api.fetch_products().await.unwrap().len(), 3);

    server.stop(true).await;
}

#[actix_web::test]
async fn malformed_recommendation_body_is_a_json_error() {
    let (server, base_url) = start_garbled();
    let api = client(&base_url, None);

    match api.fetch_recommendations("CT001").await {
        Err(ClientError::Json(_)) => {}
        other => panic!("expected json error, got {other:?}"),
    }

    let (handle, join) = SessionDriver::spawn(
        lookfinder::CatalogSession::new(),
        Arc::new(api),
        Duration::from_secs(5),
        (),
        MemoryNavigator::default(),
    );
    handle.settle().await.unwrap();
    handle.select_category("코트").unwrap();
    handle.toggle_product("CT001").unwrap();
    handle.scan().unwrap();

    let state = handle.settle().await.unwrap();
    assert_eq!(state.phase, Phase::Ready);
    assert!(state.results.is_none());
    assert_eq!(state.notice.map(|n| n.kind), Some(NoticeKind::ScanFailed));
    assert_eq!(state.selected_product_id.as_deref(), Some("CT001"));

    handle.shutdown().unwrap();
    join.await.unwrap();
    server.stop(true).await;
}
