//! CalorieBeta
//!
//! An MCP server for calorie, macro, and body weight tracking.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use calorie_beta::build_info;
use calorie_beta::catalog::CatalogChain;
use calorie_beta::config::Config;
use calorie_beta::db::migrations::{needs_migration, run_migrations};
use calorie_beta::db::Database;
use calorie_beta::events::EventBus;
use calorie_beta::mcp::CalorieBetaService;
use calorie_beta::tools::days;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("calorie_beta=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env();
    eprintln!("Database path: {}", config.database_path.display());

    // Initialize database
    eprintln!("Initializing database...");
    let database = Database::new(&config.database_path)?;

    // Run migrations
    database.with_conn(|conn| {
        if needs_migration(conn)? {
            eprintln!("Running database migrations...");
            run_migrations(conn)?;
        }
        Ok(())
    })?;
    eprintln!("Database ready.");

    let catalogs = CatalogChain::from_config(&config)?;
    eprintln!("Food catalogs: {}", catalogs.names().join(", "));

    let events = EventBus::new();
    days::spawn_summary_listener(database.clone(), &events);

    let service = CalorieBetaService::new(database, events, catalogs, config.default_user_id.clone());

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
