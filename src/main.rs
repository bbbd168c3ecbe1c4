use axum::Router;
use log::info;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use athlete_hub::integration;
use athlete_hub::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = integration::Config::default();

    let app_state = AppState::init(&config).await?;

    let app = Router::new()
        .nest("/api", athlete_hub::api(app_state))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(config.env.allow_origin())
                    .allow_methods(config.env.allow_methods())
                    .allow_headers(config.env.allow_headers()),
            ),
        );

    let addr = config.env.addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
