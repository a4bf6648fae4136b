use std::sync::Arc;

use anyhow::Result;
use common::{
    database::{DatabaseConfig, health_check, init_pool},
    error::DatabaseError,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use profile::{
    config::ServiceConfig,
    hashing::Argon2Hasher,
    jwt::{Rs256TokenIssuer, TokenIssuer},
    modules::UserModule,
    repositories::PgUserStore,
    routes,
    state::AppState,
    validation::FieldValidator,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("profile=info,tower_http=info")),
        )
        .init();

    info!("Starting profile service");

    let config = ServiceConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(DatabaseError::from)?;
    info!("Database migrations applied");

    let token_issuer: Arc<dyn TokenIssuer> = Arc::new(Rs256TokenIssuer::new(config.jwt.clone()));
    let user_module = UserModule::new(
        Arc::new(FieldValidator),
        Arc::new(Argon2Hasher::new(config.hash)),
        token_issuer.clone(),
        Arc::new(PgUserStore::new(pool)),
    );

    let app = routes::create_router(AppState {
        user_module,
        token_issuer,
    });

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("Profile service listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
