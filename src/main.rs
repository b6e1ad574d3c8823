use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error};

use gator::{App, Cli, Config, Database};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            std::process::exit(1);
        }
    };

    // Initialize logging
    if let Err(e) = gator::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        gator::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(cli, config).await {
        error!("Command failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> gator::Result<()> {
    debug!("Using database at {}", config.database.path);
    let db = Arc::new(Database::open(&config.database.path).await?);

    let mut app = App::new(config, cli.config, db.clone());
    let mut stdout = std::io::stdout();
    let result = app.execute(cli.command, &mut stdout).await;

    db.close().await;
    result
}
