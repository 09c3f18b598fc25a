use tracing_subscriber::EnvFilter;
use xiangqi_referee::config::ServerConfig;
use xiangqi_referee::web::run_server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        move_limit = config.rules.move_limit_plies,
        repetitions = config.rules.repetition_threshold,
        perpetual = ?config.rules.perpetual_check,
        "Xiangqi referee starting"
    );

    run_server(config).await
}
