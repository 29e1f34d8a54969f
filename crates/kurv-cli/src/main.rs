use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod optimize;

#[derive(Debug, Parser)]
#[command(name = "kurv")]
#[command(about = "Grocery shopping-list optimizer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Optimize a shopping list against nearby stores.
    Optimize {
        /// Shopping list YAML file (items, location, radius_km).
        #[arg(long)]
        list: std::path::PathBuf,
        /// Store fixture YAML file; fetched live from the provider when
        /// omitted.
        #[arg(long)]
        stores: Option<std::path::PathBuf>,
        /// Product fixture YAML file; searches run offline against it
        /// instead of the live provider.
        #[arg(long)]
        products: Option<std::path::PathBuf>,
        /// Cap on stores per route.
        #[arg(long)]
        max_stores: Option<usize>,
        /// Drop stores farther than this many meters from the user.
        #[arg(long)]
        max_distance_m: Option<f64>,
        /// Chain to exclude; repeatable.
        #[arg(long = "exclude")]
        excluded_chains: Vec<String>,
    },
    /// List store branches near the location in a shopping list file.
    Stores {
        /// Shopping list YAML file (only location and radius_km are used).
        #[arg(long)]
        list: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = kurv_core::load_app_config_from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Optimize {
            list,
            stores,
            products,
            max_stores,
            max_distance_m,
            excluded_chains,
        } => {
            let options = kurv_engine::OptimizeOptions {
                max_stores,
                max_distance_m,
                excluded_chains,
            };
            optimize::run_optimize(
                &config,
                &list,
                stores.as_deref(),
                products.as_deref(),
                &options,
            )
            .await
        }
        Commands::Stores { list } => optimize::run_stores(&config, &list).await,
    }
}
