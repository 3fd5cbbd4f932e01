// Mock backend server built on actix-web

use crate::api::{auth, middleware, routes};
use crate::fixture::Fixture;
use crate::util::env as env_util;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct MockServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    pub api_token: Option<String>,
}

impl Default for MockServer {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            allowed_origins: "http://localhost:3000".to_string(),
            api_token: None,
        }
    }
}

impl MockServer {
    /// Create server from `MOCK_*` environment variables
    pub fn from_env() -> Result<Self> {
        env_util::init_env();
        let defaults = Self::default();

        let host = env_util::env_opt("MOCK_HOST").unwrap_or(defaults.host);
        let port = match env_util::env_opt("MOCK_PORT") {
            Some(raw) => raw.trim().parse().context("Invalid MOCK_PORT")?,
            None => defaults.port,
        };
        let allowed_origins =
            env_util::env_opt("ALLOWED_ORIGINS").unwrap_or(defaults.allowed_origins);

        Ok(Self {
            host,
            port,
            allowed_origins,
            api_token: env_util::env_opt("MOCK_API_TOKEN"),
        })
    }

    /// Bind the listener without running it. Port 0 picks a free port; the
    /// returned address is the one actually bound.
    pub fn bind(self, fixture: Fixture) -> Result<(Server, SocketAddr)> {
        let bind_addr = format!("{}:{}", self.host, self.port);
        tracing::info!(
            host = %self.host,
            port = %self.port,
            products = fixture.products.len(),
            "Starting mock recommendation backend"
        );

        let fixture = web::Data::new(fixture);
        let allowed_origins = self.allowed_origins.clone();
        let api_token = self.api_token.clone();

        let server = HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(fixture.clone())
                .wrap(auth::Auth::new(api_token.clone()))
                .wrap(cors)
                .wrap(compress)
                .wrap(logger)
                .configure(routes::configure_routes)
        })
        .workers(2)
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

        let addr = server
            .addrs()
            .first()
            .copied()
            .with_context(|| format!("no address bound for {}", bind_addr))?;
        Ok((server.run(), addr))
    }

    /// Bind and serve until the server stops.
    pub async fn run(self, fixture: Fixture) -> Result<()> {
        let (server, addr) = self.bind(fixture)?;
        tracing::info!(%addr, "mock backend listening");
        server.await.context("HTTP server error")?;
        Ok(())
    }
}
