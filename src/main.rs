use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bibliorate::{config, db, seed, server, services};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bibliorate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    // --profile <name> overrides PROFILE
    let args: Vec<String> = std::env::args().collect();
    let config = match args.iter().position(|arg| arg == "--profile") {
        Some(pos) => match args.get(pos + 1) {
            Some(profile) => config::Config::with_profile(profile.clone()),
            None => {
                tracing::error!("--profile requires a value");
                std::process::exit(2);
            }
        },
        None => config::Config::from_env(),
    };

    // Initialize database
    let db = match db::init_db(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    if config.seed_demo {
        tracing::info!("Seeding demo data...");
        if let Err(e) = seed::seed_demo_data(&db).await {
            tracing::error!("Failed to seed data: {}", e);
        } else {
            tracing::info!("Demo data seeded successfully.");
        }
    }

    if config.rebuild_ratings {
        match services::rebuild_all_ratings(&db).await {
            Ok(count) => tracing::info!("Rating aggregates rebuilt for {} books", count),
            Err(e) => tracing::error!("Failed to rebuild rating aggregates: {}", e),
        }
    }

    if let Err(e) = server::serve(db, &config).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
