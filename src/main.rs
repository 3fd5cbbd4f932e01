use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lookfinder::api::MockServer;
use lookfinder::catalog::{query_to_state, state_to_query, SelectionState};
use lookfinder::cli::browse::{
    run_browse, run_categories, BrowseCommandConfig, CategoriesCommandConfig,
};
use lookfinder::cli::history::{run_history, HistoryCommandConfig};
use lookfinder::cli::prefs::{
    run_cart, run_prefs, CartAction, CartCommandConfig, PrefsCommandConfig,
};
use lookfinder::cli::scan::{run_scan, ScanCommandConfig};
use lookfinder::cli::SourceConfig;
use lookfinder::config::ClientConfig;
use lookfinder::fixture::Fixture;
use lookfinder::logging;
use lookfinder::prefs::Theme;
use lookfinder::util::env;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "lookfinder",
    version,
    about = "Browse the product catalog and find similar looks"
)]
struct Cli {
    /// Override LOOKFINDER_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Serve catalog and recommendations from a local fixture file instead of HTTP
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// List non-empty categories with product counts
    Categories,
    /// Show the visible product window for a category
    Browse {
        #[arg(long)]
        cat: Option<String>,
        /// Restore state from a query string (e.g. "cat=코트&pid=CT001")
        #[arg(long, conflicts_with = "cat")]
        query: Option<String>,
        /// Simulated scroll-to-bottom events
        #[arg(long, default_value_t = 0)]
        scrolls: u32,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Select a product and request similar-item recommendations
    Scan {
        product_id: String,
        #[arg(long)]
        cat: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Do not record this scan in the analysis history
        #[arg(long, default_value_t = false)]
        no_history: bool,
    },
    /// Convert between selection state and its URL query form
    Query {
        #[command(subcommand)]
        action: QueryAction,
    },
    /// Show or clear the recorded analysis history
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = false)]
        clear: bool,
    },
    /// Show or change stored preferences (auth token, theme)
    Prefs {
        /// Bearer token used when LOOKFINDER_API_TOKEN is unset
        #[arg(long, conflicts_with = "clear_token")]
        set_token: Option<String>,
        #[arg(long, default_value_t = false)]
        clear_token: bool,
        #[arg(long)]
        theme: Option<Theme>,
    },
    /// Manage the saved cart
    Cart {
        #[command(subcommand)]
        action: Option<CartCommand>,
    },
    /// Run the mock recommendation backend over the `--fixture` file
    ServeMock {
        /// Override MOCK_HOST
        #[arg(long)]
        host: Option<String>,
        /// Override MOCK_PORT
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum CartCommand {
    List,
    Add { product_id: String },
    Remove { product_id: String },
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum QueryAction {
    Encode {
        #[arg(long)]
        cat: Option<String>,
        #[arg(long)]
        pid: Option<String>,
    },
    Decode { query: String },
}

#[actix_web::main]
async fn main() -> Result<()> {
    env::init_env();
    logging::init_tracing("lookfinder=info,actix_web=info")?;

    let cli = Cli::parse();
    let source = SourceConfig {
        base_url: cli.base_url.clone(),
        fixture: cli.fixture.clone(),
    };

    match cli.command {
        Commands::Categories => run_categories(CategoriesCommandConfig { source }).await?,
        Commands::Browse {
            cat,
            query,
            scrolls,
            json,
        } => {
            run_browse(BrowseCommandConfig {
                source,
                category: cat,
                query,
                scrolls,
                json,
            })
            .await?
        }
        Commands::Scan {
            product_id,
            cat,
            json,
            no_history,
        } => {
            run_scan(ScanCommandConfig {
                source,
                product_id,
                category: cat,
                json,
                no_history,
            })
            .await?
        }
        Commands::Query { action } => match action {
            QueryAction::Encode { cat, pid } => {
                println!("{}", state_to_query(&SelectionState::new(cat, pid)));
            }
            QueryAction::Decode { query } => {
                let state = query_to_state(&query);
                println!("cat={}", state.category().unwrap_or("-"));
                println!("pid={}", state.selected().unwrap_or("-"));
            }
        },
        Commands::History { limit, clear } => {
            let cfg = ClientConfig::from_env()?;
            run_history(HistoryCommandConfig {
                state_file: cfg.state_file,
                limit,
                clear,
            })?
        }
        Commands::Prefs {
            set_token,
            clear_token,
            theme,
        } => {
            let cfg = ClientConfig::from_env()?;
            run_prefs(PrefsCommandConfig {
                state_file: cfg.state_file,
                set_token,
                clear_token,
                theme,
            })?
        }
        Commands::Cart { action } => {
            let cfg = ClientConfig::from_env()?;
            let action = match action {
                None | Some(CartCommand::List) => CartAction::List,
                Some(CartCommand::Add { product_id }) => CartAction::Add(product_id),
                Some(CartCommand::Remove { product_id }) => CartAction::Remove(product_id),
            };
            run_cart(CartCommandConfig {
                state_file: cfg.state_file,
                action,
            })?
        }
        Commands::ServeMock { host, port } => {
            env::preflight_check(
                "serve-mock",
                &[],
                &["MOCK_HOST", "MOCK_PORT", "ALLOWED_ORIGINS", "MOCK_API_TOKEN"],
            )?;
            let path = cli.fixture.context("serve-mock requires --fixture <file>")?;
            let fixture = Fixture::load(&path)
                .with_context(|| format!("failed to load fixture {}", path.display()))?;
            let mut server = MockServer::from_env()?;
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }
            info!(products = fixture.products.len(), "serve-mock: fixture loaded");
            server.run(fixture).await?;
        }
    }
    Ok(())
}
