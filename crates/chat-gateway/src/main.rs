use std::process::ExitCode;

use chat_common::{try_init_tracing_with_config, AppConfig, TracingConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::from(&config.telemetry)) {
        eprintln!("tracing disabled: {e}");
    }

    tracing::info!(env = ?config.app.env, port = config.gateway.port, "Starting Chat gateway");

    match chat_gateway::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Chat gateway stopped");
            ExitCode::FAILURE
        }
    }
}
