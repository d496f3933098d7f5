use std::net::SocketAddr;

use anyhow::Context;

use crate::database::Database;
use crate::services::user_service::UserService;

/// Bind and run the API server until shutdown.
pub async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = crate::config::config();
    tracing::info!("starting heritage-api in {:?} mode", config.environment);

    if config.database.run_migrations_on_start {
        Database::migrate().await.context("running migrations")?;
    }

    crate::events::install_defaults();

    // Env overrides let tests and deployments pick the port
    let port = port
        .or_else(|| {
            std::env::var("HERITAGE_API_PORT")
                .ok()
                .or_else(|| std::env::var("PORT").ok())
                .and_then(|s| s.parse::<u16>().ok())
        })
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    println!("heritage-api listening on http://{}", bind_addr);

    // connect_info feeds client addresses to the rate limiter
    axum::serve(
        listener,
        crate::routes::app().into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server")?;

    Ok(())
}

pub async fn migrate() -> anyhow::Result<()> {
    Database::migrate().await.context("running migrations")?;
    println!("migrations applied");
    Ok(())
}

pub async fn create_admin(username: &str, email: &str, password: &str) -> anyhow::Result<()> {
    let users = UserService::new().await.context("connecting to database")?;
    let user = users
        .create_admin(username, email, password)
        .await
        .context("creating admin account")?;

    println!("created admin '{}' ({})", user.username, user.id);
    Ok(())
}

pub async fn ping(url: &str) -> anyhow::Result<()> {
    let endpoint = format!("{}/health", url.trim_end_matches('/'));
    let response = reqwest::get(&endpoint)
        .await
        .with_context(|| format!("requesting {}", endpoint))?;

    let status = response.status();
    let body: serde_json::Value = response.json().await.context("parsing health response")?;

    println!("{} -> {}", endpoint, status);
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        anyhow::bail!("server reported unhealthy status {}", status);
    }
    Ok(())
}
