mod api_doc;
mod auth;
mod error;
mod handlers;
mod response;
mod setup;
mod state;

use vitrine_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    setup::telemetry::init_tracing();

    let config = Config::from_env()?;

    let (_state, router) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router).await?;

    Ok(())
}
