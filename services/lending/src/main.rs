use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod image_probe;
mod jwt;
mod lifecycle;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
mod validation;

use common::{
    database::{self, DatabaseConfig},
    error::DatabaseError,
};
use tokio::net::TcpListener;

use crate::{
    image_probe::ImageProbe,
    jwt::{JwtConfig, JwtService},
    repositories::{BookRepository, UserRepository},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting lending service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Apply schema migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(DatabaseError::Migration)?;
    info!("Database migrations applied");

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config);

    let image_probe = ImageProbe::new()?;
    let user_repository = UserRepository::new(pool.clone());
    let book_repository = BookRepository::new(pool.clone());

    let app_state = AppState {
        db_pool: pool,
        jwt_service,
        user_repository,
        book_repository,
        image_probe,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Lending service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
